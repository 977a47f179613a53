// Shared stubs and fixtures for integration tests.
//
// The stub SDKs count calls per calling convention so tests can assert
// probe stickiness and retry behavior, and they record call instants so
// backoff growth is observable under paused tokio time.
#![allow(dead_code)]

use serde_json::{json, Value};
use speaklab::backup::{ObjectStore, StoreError};
use speaklab::client::{
    AdaptiveClient, LanguageFeedbackSdk, RetryPolicy, SdkCallError, SpeechSynthesisSdk,
    SpeechToTextSdk, SynthesizeRequest, TranscribeRequest,
};
use speaklab::config::{FeedbackConfig, LimitsConfig, SynthesisConfig, TranscriptionConfig};
use speaklab::session::{
    FeedbackStage, Recording, SessionRunner, SynthesisStage, TranscriptionStage,
};
use speaklab::client::FeedbackRequest;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const QUESTION: &str = "자기소개를 해 보세요.";

/// How a stub SDK responds to calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkBehavior {
    /// Modern entry point works
    Modern,
    /// Modern reports a signature mismatch; legacy works
    LegacyOnly,
    /// Every call is rejected as unauthenticated
    AuthError,
    /// Every call fails transiently
    Unavailable,
    /// Calls succeed but the payload is missing required fields
    Malformed,
}

pub struct StubSpeechToText {
    pub behavior: SdkBehavior,
    texts: Mutex<VecDeque<String>>,
    pub v2_calls: AtomicUsize,
    pub v1_calls: AtomicUsize,
    pub call_instants: Mutex<Vec<tokio::time::Instant>>,
}

impl StubSpeechToText {
    pub fn new(behavior: SdkBehavior, texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            texts: Mutex::new(texts.iter().map(|t| t.to_string()).collect()),
            v2_calls: AtomicUsize::new(0),
            v1_calls: AtomicUsize::new(0),
            call_instants: Mutex::new(Vec::new()),
        })
    }

    fn next_text(&self) -> String {
        let mut texts = self.texts.lock().unwrap();
        if texts.len() > 1 {
            texts.pop_front().unwrap()
        } else {
            texts.front().cloned().unwrap_or_default()
        }
    }

    fn respond(&self, verbose: bool) -> Result<Value, SdkCallError> {
        self.call_instants
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        match self.behavior {
            SdkBehavior::AuthError => Err(SdkCallError::Auth("key rejected".to_string())),
            SdkBehavior::Unavailable => {
                Err(SdkCallError::Unavailable("service overloaded".to_string()))
            }
            SdkBehavior::Malformed => Ok(json!({ "status": "ok" })),
            _ => {
                let text = self.next_text();
                if verbose {
                    Ok(json!({
                        "text": text,
                        "language": "ko",
                        "duration": 62.5,
                        "confidence": 0.94,
                    }))
                } else {
                    Ok(json!({ "text": text }))
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl SpeechToTextSdk for StubSpeechToText {
    async fn transcribe_v2(&self, _request: TranscribeRequest) -> Result<Value, SdkCallError> {
        if self.behavior == SdkBehavior::LegacyOnly {
            return Err(SdkCallError::SignatureMismatch(
                "transcribe_v2 not exported".to_string(),
            ));
        }
        self.v2_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(true)
    }

    async fn transcribe_v1(&self, _audio: &[u8], _language: &str) -> Result<Value, SdkCallError> {
        self.v1_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(false)
    }
}

pub struct StubLanguageFeedback {
    pub behavior: SdkBehavior,
    pub v2_calls: AtomicUsize,
    pub v1_calls: AtomicUsize,
}

impl StubLanguageFeedback {
    pub fn new(behavior: SdkBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            v2_calls: AtomicUsize::new(0),
            v1_calls: AtomicUsize::new(0),
        })
    }

    fn respond(&self) -> Result<Value, SdkCallError> {
        match self.behavior {
            SdkBehavior::AuthError => Err(SdkCallError::Auth("key rejected".to_string())),
            SdkBehavior::Unavailable => {
                Err(SdkCallError::Unavailable("service overloaded".to_string()))
            }
            SdkBehavior::Malformed => Ok(json!({ "unexpected": true })),
            _ => Ok(json!({
                "model_sentence": "안녕하세요. 저는 민수예요. 한국학을 전공해요.",
                "model_sentence_english": "Hello. I'm Minsu. I major in Korean Studies.",
                "grammar_issues": ["Particle: '을' should be '를' after a vowel"],
                "vocabulary_suggestions": ["공부하다 vs 배우다"],
                "content_suggestions": ["Add a sentence about your hobbies"],
                "summary": "Good progress; aim for 60+ seconds.",
                "readiness_score": 7,
            })),
        }
    }
}

#[async_trait::async_trait]
impl LanguageFeedbackSdk for StubLanguageFeedback {
    async fn review_v2(&self, _request: FeedbackRequest) -> Result<Value, SdkCallError> {
        if self.behavior == SdkBehavior::LegacyOnly {
            return Err(SdkCallError::SignatureMismatch(
                "review_v2 not exported".to_string(),
            ));
        }
        self.v2_calls.fetch_add(1, Ordering::SeqCst);
        self.respond()
    }

    async fn review_v1(&self, _prompt: &str) -> Result<Value, SdkCallError> {
        self.v1_calls.fetch_add(1, Ordering::SeqCst);
        self.respond()
    }
}

pub struct StubSpeechSynthesis {
    pub behavior: SdkBehavior,
    pub v2_calls: AtomicUsize,
    pub v1_calls: AtomicUsize,
}

impl StubSpeechSynthesis {
    pub fn new(behavior: SdkBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            v2_calls: AtomicUsize::new(0),
            v1_calls: AtomicUsize::new(0),
        })
    }

    fn respond(&self) -> Result<Vec<u8>, SdkCallError> {
        match self.behavior {
            SdkBehavior::AuthError => Err(SdkCallError::Auth("key rejected".to_string())),
            SdkBehavior::Unavailable => {
                Err(SdkCallError::Unavailable("service overloaded".to_string()))
            }
            SdkBehavior::Malformed => Ok(Vec::new()),
            _ => Ok(vec![0x4d, 0x50, 0x33, 0x00, 0x01, 0x02]),
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesisSdk for StubSpeechSynthesis {
    async fn synthesize_v2(&self, _request: SynthesizeRequest) -> Result<Vec<u8>, SdkCallError> {
        if self.behavior == SdkBehavior::LegacyOnly {
            return Err(SdkCallError::SignatureMismatch(
                "synthesize_v2 not exported".to_string(),
            ));
        }
        self.v2_calls.fetch_add(1, Ordering::SeqCst);
        self.respond()
    }

    async fn synthesize_v1(&self, _text: &str, _voice_id: &str) -> Result<Vec<u8>, SdkCallError> {
        self.v1_calls.fetch_add(1, Ordering::SeqCst);
        self.respond()
    }
}

pub fn transcription_cfg(api_key: Option<&str>) -> TranscriptionConfig {
    TranscriptionConfig {
        api_key: api_key.map(str::to_string),
        language: "ko".to_string(),
        model: "whisper-1".to_string(),
    }
}

pub fn feedback_cfg(api_key: Option<&str>) -> FeedbackConfig {
    FeedbackConfig {
        api_key: api_key.map(str::to_string),
        model: "gpt-4o".to_string(),
    }
}

pub fn synthesis_cfg(api_key: Option<&str>) -> SynthesisConfig {
    SynthesisConfig {
        api_key: api_key.map(str::to_string),
        voice_id: Some("voice-ko-1".to_string()),
        model: "eleven_multilingual_v2".to_string(),
    }
}

/// Fast policy so retry tests do not sleep for real.
pub fn test_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(800),
        call_timeout: Duration::from_secs(5),
    }
}

pub fn test_limits() -> LimitsConfig {
    LimitsConfig::default()
}

pub fn build_client(
    stt: Arc<StubSpeechToText>,
    feedback: Arc<StubLanguageFeedback>,
    synthesis: Arc<StubSpeechSynthesis>,
) -> Arc<AdaptiveClient> {
    Arc::new(AdaptiveClient::new(
        stt,
        feedback,
        synthesis,
        transcription_cfg(Some("test-key")),
        feedback_cfg(Some("test-key")),
        synthesis_cfg(Some("test-key")),
        test_policy(),
    ))
}

pub fn build_runner(client: Arc<AdaptiveClient>) -> SessionRunner {
    SessionRunner::new(
        "Student01".to_string(),
        QUESTION.to_string(),
        TranscriptionStage::new(client.clone(), test_limits()),
        FeedbackStage::new(client.clone()),
        SynthesisStage::new(client),
    )
}

/// A one-minute recording fixture.
pub fn recording() -> Recording {
    Recording {
        bytes: vec![7u8; 32_000],
        format: "wav".to_string(),
        duration: Duration::from_secs(65),
    }
}

/// Remote store that always fails transiently, counting attempts.
pub struct FailingStore {
    pub attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for FailingStore {
    async fn put(&self, _key: &str, _bytes: &[u8]) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("remote unreachable".to_string()))
    }

    fn name(&self) -> &str {
        "failing-remote"
    }
}

/// Remote store that accepts everything, remembering what it stored.
pub struct AcceptingStore {
    pub objects: Mutex<Vec<(String, Vec<u8>)>>,
}

impl AcceptingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            objects: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for AcceptingStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().unwrap();
        if objects.iter().any(|(k, _)| k == key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        objects.push((key.to_string(), bytes.to_vec()));
        Ok(())
    }

    fn name(&self) -> &str {
        "accepting-remote"
    }
}
