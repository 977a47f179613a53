use crate::session::{Attempt, AttemptIndex, Comparison, Feedback, Transcript};
use anyhow::{Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of a completed session, assembled once for
/// persistence. Audio travels base64-encoded inside the single JSON
/// document so the whole bundle is one atomic write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupArtifactBundle {
    pub session_id: String,
    pub participant_id: String,
    pub question: String,
    pub created_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub attempts: Vec<AttemptRecord>,
    pub comparison: Option<Comparison>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub index: AttemptIndex,
    pub recorded_at: DateTime<Utc>,
    pub audio: AudioBlob,
    pub transcript: Option<Transcript>,
    pub feedback: Option<Feedback>,
    pub model_audio: Option<ModelAudioRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioBlob {
    pub format: String,
    /// Capture duration, absent for synthesized audio
    pub duration_secs: Option<f64>,
    /// Base64-encoded audio bytes
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAudioRecord {
    pub text: String,
    pub audio: AudioBlob,
}

impl BackupArtifactBundle {
    pub fn from_session(
        session_id: &str,
        participant_id: &str,
        created_at: DateTime<Utc>,
        question: &str,
        attempts: [Option<&Attempt>; 2],
        comparison: Option<Comparison>,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            participant_id: participant_id.to_string(),
            question: question.to_string(),
            created_at,
            saved_at: Utc::now(),
            attempts: attempts
                .into_iter()
                .flatten()
                .map(AttemptRecord::from_attempt)
                .collect(),
            comparison,
        }
    }

    /// Storage key: participant id plus session timestamp. A new session
    /// always gets a new key, so a prior session can never be
    /// overwritten by accident.
    pub fn key(&self) -> String {
        format!(
            "{}_{}.json",
            self.participant_id,
            self.created_at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Serialize the whole bundle into the single payload that gets
    /// uploaded (or written locally). Called once per dispatch.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("Failed to serialize backup bundle")
    }
}

impl AttemptRecord {
    fn from_attempt(attempt: &Attempt) -> Self {
        let encoder = base64::engine::general_purpose::STANDARD;
        Self {
            index: attempt.index,
            recorded_at: attempt.recorded_at,
            audio: AudioBlob {
                format: attempt.recording.format.clone(),
                duration_secs: Some(attempt.recording.duration.as_secs_f64()),
                data: encoder.encode(&attempt.recording.bytes),
            },
            transcript: attempt.transcript.clone(),
            feedback: attempt.feedback.clone(),
            model_audio: attempt.model_audio.as_ref().map(|model| ModelAudioRecord {
                text: model.text.clone(),
                audio: AudioBlob {
                    format: model.audio.format.clone(),
                    duration_secs: None,
                    data: encoder.encode(&model.audio.bytes),
                },
            }),
        }
    }
}
