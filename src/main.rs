use anyhow::{Context, Result};
use clap::Parser;
use speaklab::backup::{BackupDispatcher, HttpObjectStore, LocalFallbackStore, ObjectStore};
use speaklab::client::{
    AdaptiveClient, HttpLanguageFeedback, HttpSpeechSynthesis, HttpSpeechToText, RetryPolicy,
};
use speaklab::http::{create_router, AppState};
use speaklab::Config;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "speaklab", about = "Two-attempt spoken-language assessment service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/speaklab")]
    config: String,

    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    report_capability(
        "transcription",
        cfg.services.transcription.api_key.is_some(),
    );
    report_capability("feedback", cfg.services.feedback.api_key.is_some());
    report_capability(
        "synthesis",
        cfg.services.synthesis.api_key.is_some() && cfg.services.synthesis.voice_id.is_some(),
    );

    let policy = RetryPolicy::from_limits(&cfg.limits);

    let stt = HttpSpeechToText::new(cfg.services.transcription.api_key.clone())?;
    let feedback = HttpLanguageFeedback::new(cfg.services.feedback.api_key.clone())?;
    let synthesis = HttpSpeechSynthesis::new(cfg.services.synthesis.api_key.clone())?;

    let client = Arc::new(AdaptiveClient::new(
        Arc::new(stt),
        Arc::new(feedback),
        Arc::new(synthesis),
        cfg.services.transcription.clone(),
        cfg.services.feedback.clone(),
        cfg.services.synthesis.clone(),
        policy,
    ));

    let remote: Option<Arc<dyn ObjectStore>> = if cfg.backup.enabled {
        match &cfg.backup.endpoint {
            Some(endpoint) => Some(Arc::new(HttpObjectStore::new(
                endpoint.clone(),
                cfg.backup.destination.clone(),
                cfg.backup.token.clone(),
            ))),
            None => {
                warn!("remote backup enabled but no endpoint configured; bundles stay local");
                None
            }
        }
    } else {
        None
    };

    let dispatcher = Arc::new(BackupDispatcher::new(
        remote,
        LocalFallbackStore::new(cfg.backup.local_dir.clone()),
        policy,
    ));

    let state = AppState::new(
        client,
        dispatcher,
        cfg.assessment.question.clone(),
        cfg.limits.clone(),
    );
    let app = create_router(state);

    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}

fn report_capability(name: &str, configured: bool) {
    if configured {
        info!("{}: ready", name);
    } else {
        warn!("{}: no credentials configured (will fail at first use)", name);
    }
}
