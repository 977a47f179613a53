use super::error::{SdkCallError, ServiceError};
use super::retry::{with_retry, RetryPolicy};
use super::sdk::{
    FeedbackRequest, LanguageFeedbackSdk, SpeechSynthesisSdk, SpeechToTextSdk, SynthesizeRequest,
    TranscribeRequest,
};
use crate::config::{FeedbackConfig, SynthesisConfig, TranscriptionConfig};
use crate::session::{
    AudioBuffer, Feedback, Recording, Suggestion, SuggestionCategory, Transcript,
};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Calling convention a vendor SDK build supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    /// Structured request objects (current SDK builds)
    Modern,
    /// Flat function arguments (older installed versions)
    Legacy,
}

/// One handle per remote capability: the raw binding, its credentials,
/// and the convention detected on first use.
///
/// The convention cell is the only shared mutable state in the client.
/// It is written at most once, during the first (serialized) probe, and
/// read-only afterwards.
pub struct ServiceClientHandle<S: ?Sized> {
    capability: &'static str,
    sdk: Arc<S>,
    api_key: Option<String>,
    convention: OnceLock<CallingConvention>,
}

impl<S: ?Sized> ServiceClientHandle<S> {
    pub fn new(capability: &'static str, sdk: Arc<S>, api_key: Option<String>) -> Self {
        Self {
            capability,
            sdk,
            api_key,
            convention: OnceLock::new(),
        }
    }

    /// A missing credential surfaces here, at first use, as an
    /// authentication failure. Never checked at startup.
    fn require_credentials(&self) -> Result<(), ServiceError> {
        if self.api_key.is_none() {
            return Err(ServiceError::Authentication {
                capability: self.capability.to_string(),
                reason: "no API key configured".to_string(),
            });
        }
        Ok(())
    }

    fn convention(&self) -> Option<CallingConvention> {
        self.convention.get().copied()
    }

    /// Record the working convention. Sticky: later probes are no-ops.
    fn confirm(&self, convention: CallingConvention) {
        if self.convention.set(convention).is_ok() {
            info!(
                "{} capability resolved to {:?} convention",
                self.capability, convention
            );
        }
    }
}

/// Everything the session needs from the outside world, behind one
/// stable surface: transcribe, get_feedback, synthesize.
///
/// On the first call per capability the client probes the modern
/// convention; a signature mismatch (and nothing else) falls back to
/// legacy. The probe call is the real call, so no remote resource is
/// consumed twice. Network and auth errors are surfaced, never treated
/// as a version signal.
pub struct AdaptiveClient {
    transcription: ServiceClientHandle<dyn SpeechToTextSdk>,
    feedback: ServiceClientHandle<dyn LanguageFeedbackSdk>,
    synthesis: ServiceClientHandle<dyn SpeechSynthesisSdk>,
    transcription_cfg: TranscriptionConfig,
    feedback_cfg: FeedbackConfig,
    synthesis_cfg: SynthesisConfig,
    policy: RetryPolicy,
}

impl AdaptiveClient {
    pub fn new(
        stt: Arc<dyn SpeechToTextSdk>,
        feedback: Arc<dyn LanguageFeedbackSdk>,
        synthesis: Arc<dyn SpeechSynthesisSdk>,
        transcription_cfg: TranscriptionConfig,
        feedback_cfg: FeedbackConfig,
        synthesis_cfg: SynthesisConfig,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transcription: ServiceClientHandle::new(
                "transcription",
                stt,
                transcription_cfg.api_key.clone(),
            ),
            feedback: ServiceClientHandle::new("feedback", feedback, feedback_cfg.api_key.clone()),
            synthesis: ServiceClientHandle::new(
                "synthesis",
                synthesis,
                synthesis_cfg.api_key.clone(),
            ),
            transcription_cfg,
            feedback_cfg,
            synthesis_cfg,
            policy,
        }
    }

    /// Transcribe a captured recording.
    pub async fn transcribe(&self, recording: &Recording) -> Result<Transcript, ServiceError> {
        self.transcription.require_credentials()?;

        let payload = with_retry(&self.policy, "transcription", || {
            self.transcribe_once(recording)
        })
        .await?;

        self.parse_transcript(payload, recording.duration.as_secs_f64())
    }

    async fn transcribe_once(&self, recording: &Recording) -> Result<Value, ServiceError> {
        let handle = &self.transcription;
        let request = TranscribeRequest {
            audio: recording.bytes.clone(),
            format: recording.format.clone(),
            language: self.transcription_cfg.language.clone(),
            model: self.transcription_cfg.model.clone(),
        };

        match handle.convention() {
            Some(CallingConvention::Modern) => handle
                .sdk
                .transcribe_v2(request)
                .await
                .map_err(|e| e.into_service_error(handle.capability)),
            Some(CallingConvention::Legacy) => handle
                .sdk
                .transcribe_v1(&recording.bytes, &self.transcription_cfg.language)
                .await
                .map_err(|e| e.into_service_error(handle.capability)),
            None => match handle.sdk.transcribe_v2(request).await {
                Ok(payload) => {
                    handle.confirm(CallingConvention::Modern);
                    Ok(payload)
                }
                Err(SdkCallError::SignatureMismatch(_)) => {
                    warn!("transcription: modern convention unsupported, probing legacy");
                    match handle
                        .sdk
                        .transcribe_v1(&recording.bytes, &self.transcription_cfg.language)
                        .await
                    {
                        Ok(payload) => {
                            handle.confirm(CallingConvention::Legacy);
                            Ok(payload)
                        }
                        Err(e) => Err(e.into_service_error(handle.capability)),
                    }
                }
                Err(e) => Err(e.into_service_error(handle.capability)),
            },
        }
    }

    fn parse_transcript(
        &self,
        payload: Value,
        capture_duration_secs: f64,
    ) -> Result<Transcript, ServiceError> {
        let text = payload
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::UnsupportedResponse {
                capability: "transcription".to_string(),
                reason: "payload has no text field".to_string(),
            })?
            .trim()
            .to_string();

        let language = payload
            .get("language")
            .and_then(Value::as_str)
            .unwrap_or(&self.transcription_cfg.language)
            .to_string();

        // Legacy payloads omit duration; the capture metadata stands in.
        let speech_duration_secs = payload
            .get("duration")
            .and_then(Value::as_f64)
            .unwrap_or(capture_duration_secs);

        let confidence = payload
            .get("confidence")
            .and_then(Value::as_f64)
            .map(|c| c as f32);

        Ok(Transcript {
            text,
            language,
            confidence,
            speech_duration_secs,
        })
    }

    /// Generate structured feedback for a transcribed answer.
    pub async fn get_feedback(
        &self,
        question: &str,
        transcript: &Transcript,
    ) -> Result<Feedback, ServiceError> {
        self.feedback.require_credentials()?;

        let payload = with_retry(&self.policy, "feedback", || {
            self.feedback_once(question, transcript)
        })
        .await?;

        parse_feedback(payload)
    }

    async fn feedback_once(
        &self,
        question: &str,
        transcript: &Transcript,
    ) -> Result<Value, ServiceError> {
        let handle = &self.feedback;
        let request = FeedbackRequest {
            question: question.to_string(),
            transcript: transcript.text.clone(),
            speech_duration_secs: transcript.speech_duration_secs,
            model: self.feedback_cfg.model.clone(),
        };

        match handle.convention() {
            Some(CallingConvention::Modern) => handle
                .sdk
                .review_v2(request)
                .await
                .map_err(|e| e.into_service_error(handle.capability)),
            Some(CallingConvention::Legacy) => handle
                .sdk
                .review_v1(&legacy_feedback_prompt(question, transcript))
                .await
                .map_err(|e| e.into_service_error(handle.capability)),
            None => match handle.sdk.review_v2(request).await {
                Ok(payload) => {
                    handle.confirm(CallingConvention::Modern);
                    Ok(payload)
                }
                Err(SdkCallError::SignatureMismatch(_)) => {
                    warn!("feedback: modern convention unsupported, probing legacy");
                    match handle
                        .sdk
                        .review_v1(&legacy_feedback_prompt(question, transcript))
                        .await
                    {
                        Ok(payload) => {
                            handle.confirm(CallingConvention::Legacy);
                            Ok(payload)
                        }
                        Err(e) => Err(e.into_service_error(handle.capability)),
                    }
                }
                Err(e) => Err(e.into_service_error(handle.capability)),
            },
        }
    }

    /// Synthesize model-pronunciation audio for a sentence.
    pub async fn synthesize(&self, text: &str) -> Result<AudioBuffer, ServiceError> {
        self.synthesis.require_credentials()?;
        let voice_id = self.synthesis_cfg.voice_id.as_deref().ok_or_else(|| {
            ServiceError::Authentication {
                capability: "synthesis".to_string(),
                reason: "no voice id configured".to_string(),
            }
        })?;

        let bytes = with_retry(&self.policy, "synthesis", || {
            self.synthesize_once(text, voice_id)
        })
        .await?;

        if bytes.is_empty() {
            return Err(ServiceError::UnsupportedResponse {
                capability: "synthesis".to_string(),
                reason: "no audio data received".to_string(),
            });
        }

        Ok(AudioBuffer {
            bytes,
            format: "mp3".to_string(),
        })
    }

    async fn synthesize_once(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ServiceError> {
        let handle = &self.synthesis;
        let request = SynthesizeRequest {
            text: text.to_string(),
            voice_id: voice_id.to_string(),
            model: self.synthesis_cfg.model.clone(),
        };

        match handle.convention() {
            Some(CallingConvention::Modern) => handle
                .sdk
                .synthesize_v2(request)
                .await
                .map_err(|e| e.into_service_error(handle.capability)),
            Some(CallingConvention::Legacy) => handle
                .sdk
                .synthesize_v1(text, voice_id)
                .await
                .map_err(|e| e.into_service_error(handle.capability)),
            None => match handle.sdk.synthesize_v2(request).await {
                Ok(bytes) => {
                    handle.confirm(CallingConvention::Modern);
                    Ok(bytes)
                }
                Err(SdkCallError::SignatureMismatch(_)) => {
                    warn!("synthesis: modern convention unsupported, probing legacy");
                    match handle.sdk.synthesize_v1(text, voice_id).await {
                        Ok(bytes) => {
                            handle.confirm(CallingConvention::Legacy);
                            Ok(bytes)
                        }
                        Err(e) => Err(e.into_service_error(handle.capability)),
                    }
                }
                Err(e) => Err(e.into_service_error(handle.capability)),
            },
        }
    }

}

/// Legacy feedback builds render the question and answer into one flat
/// prompt string instead of a structured request.
fn legacy_feedback_prompt(question: &str, transcript: &Transcript) -> String {
    format!(
        "Question: {}\nStudent answer ({:.1}s): {}",
        question, transcript.speech_duration_secs, transcript.text
    )
}

/// Map a raw feedback payload onto the structured result. The model
/// sentence is mandatory; a payload without one cannot be used, whatever
/// convention produced it.
fn parse_feedback(payload: Value) -> Result<Feedback, ServiceError> {
    let corrected_text = payload
        .get("model_sentence")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::UnsupportedResponse {
            capability: "feedback".to_string(),
            reason: "payload has no model sentence".to_string(),
        })?
        .to_string();

    let corrected_text_english = payload
        .get("model_sentence_english")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut suggestions = Vec::new();
    collect_suggestions(&payload, "grammar_issues", SuggestionCategory::Grammar, &mut suggestions);
    collect_suggestions(
        &payload,
        "vocabulary_suggestions",
        SuggestionCategory::Vocabulary,
        &mut suggestions,
    );
    collect_suggestions(
        &payload,
        "content_suggestions",
        SuggestionCategory::Content,
        &mut suggestions,
    );

    let summary = payload
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or("Keep practicing to speak more naturally!")
        .to_string();

    // Scores outside 1-10 are discarded rather than trusted.
    let readiness_score = payload
        .get("readiness_score")
        .and_then(Value::as_u64)
        .filter(|score| (1..=10).contains(score))
        .map(|score| score as u8);

    Ok(Feedback {
        corrected_text,
        corrected_text_english,
        suggestions,
        summary,
        readiness_score,
    })
}

fn collect_suggestions(
    payload: &Value,
    field: &str,
    category: SuggestionCategory,
    out: &mut Vec<Suggestion>,
) {
    if let Some(items) = payload.get(field).and_then(Value::as_array) {
        for item in items {
            if let Some(text) = item.as_str() {
                if !text.trim().is_empty() {
                    out.push(Suggestion {
                        category,
                        text: text.to_string(),
                    });
                }
            }
        }
    }
}
