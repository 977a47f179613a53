use crate::client::{AdaptiveClient, ServiceError};
use crate::config::LimitsConfig;
use crate::session::types::{Feedback, ModelAudio, Recording, Transcript};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Synthesis input cap enforced by the vendor API.
const MAX_SYNTHESIS_CHARS: usize = 2500;

/// Tagged result of one orchestration stage.
///
/// Stages never panic or propagate errors past this boundary; the state
/// machine inspects the tag and decides between blocking and degraded
/// continuation.
#[derive(Debug, Clone)]
pub enum StageOutcome<T> {
    Ok(T),
    Failed(ServiceError),
}

impl<T> StageOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, StageOutcome::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            StageOutcome::Ok(value) => Some(value),
            StageOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ServiceError> {
        match self {
            StageOutcome::Ok(_) => None,
            StageOutcome::Failed(err) => Some(err),
        }
    }
}

/// Turns a captured recording into a transcript. Input is validated
/// before any network call; retries belong to the client layer.
pub struct TranscriptionStage {
    client: Arc<AdaptiveClient>,
    limits: LimitsConfig,
}

impl TranscriptionStage {
    pub fn new(client: Arc<AdaptiveClient>, limits: LimitsConfig) -> Self {
        Self { client, limits }
    }

    pub async fn run(&self, recording: &Recording) -> StageOutcome<Transcript> {
        if let Err(err) = self.validate(recording) {
            return StageOutcome::Failed(err);
        }

        match self.client.transcribe(recording).await {
            Ok(transcript) if transcript.text.is_empty() => {
                warn!("transcription produced empty text");
                StageOutcome::Failed(ServiceError::UnsupportedResponse {
                    capability: "transcription".to_string(),
                    reason: "empty transcription".to_string(),
                })
            }
            Ok(transcript) => {
                info!(
                    "transcribed {:.1}s of speech ({} chars)",
                    transcript.speech_duration_secs,
                    transcript.text.chars().count()
                );
                StageOutcome::Ok(transcript)
            }
            Err(err) => {
                warn!("transcription failed: {}", err);
                StageOutcome::Failed(err)
            }
        }
    }

    fn validate(&self, recording: &Recording) -> Result<(), ServiceError> {
        if recording.bytes.is_empty() {
            return Err(ServiceError::Validation("empty audio buffer".to_string()));
        }
        if recording.bytes.len() > self.limits.max_recording_bytes {
            return Err(ServiceError::Validation(format!(
                "recording exceeds {} byte upload limit",
                self.limits.max_recording_bytes
            )));
        }
        let max = Duration::from_secs(self.limits.max_recording_secs);
        if recording.duration > max {
            return Err(ServiceError::Validation(format!(
                "recording longer than {}s maximum",
                self.limits.max_recording_secs
            )));
        }
        Ok(())
    }
}

/// Turns (question, transcript) into structured feedback.
pub struct FeedbackStage {
    client: Arc<AdaptiveClient>,
}

impl FeedbackStage {
    pub fn new(client: Arc<AdaptiveClient>) -> Self {
        Self { client }
    }

    pub async fn run(&self, question: &str, transcript: &Transcript) -> StageOutcome<Feedback> {
        if transcript.text.trim().is_empty() {
            return StageOutcome::Failed(ServiceError::Validation(
                "cannot request feedback for an empty transcript".to_string(),
            ));
        }

        match self.client.get_feedback(question, transcript).await {
            Ok(feedback) => {
                info!(
                    "feedback ready ({} suggestions, score {:?})",
                    feedback.suggestions.len(),
                    feedback.readiness_score
                );
                StageOutcome::Ok(feedback)
            }
            Err(err) => {
                warn!("feedback failed: {}", err);
                StageOutcome::Failed(err)
            }
        }
    }
}

/// Turns a model sentence into pronunciation audio.
pub struct SynthesisStage {
    client: Arc<AdaptiveClient>,
}

impl SynthesisStage {
    pub fn new(client: Arc<AdaptiveClient>) -> Self {
        Self { client }
    }

    pub async fn run(&self, model_sentence: &str) -> StageOutcome<ModelAudio> {
        let text = ensure_terminal_punctuation(model_sentence);
        if text.is_empty() {
            return StageOutcome::Failed(ServiceError::Validation(
                "no model sentence to synthesize".to_string(),
            ));
        }
        if text.chars().count() > MAX_SYNTHESIS_CHARS {
            return StageOutcome::Failed(ServiceError::Validation(format!(
                "model sentence exceeds {} character synthesis limit",
                MAX_SYNTHESIS_CHARS
            )));
        }

        match self.client.synthesize(&text).await {
            Ok(audio) => {
                info!("model audio synthesized ({} bytes)", audio.bytes.len());
                StageOutcome::Ok(ModelAudio { text, audio })
            }
            Err(err) => {
                warn!("synthesis failed: {}", err);
                StageOutcome::Failed(err)
            }
        }
    }
}

/// A trailing full stop steers the synthesized voice to a falling,
/// sentence-final intonation. Questions and exclamations keep theirs.
fn ensure_terminal_punctuation(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    if text.ends_with('?') || text.ends_with('!') {
        text.to_string()
    } else if text.ends_with('.') {
        format!("{}.", text.trim_end_matches('.'))
    } else {
        format!("{}.", text)
    }
}
