use crate::session::compare::Comparison;
use crate::session::machine::SessionState;
use crate::session::types::{
    Attempt, AttemptIndex, Feedback, RecordingQuality, SessionStatus, StageStatus, Transcript,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Renderable snapshot of one session, safe to hand to the UI and the
/// document renderer. Raw audio never leaves the core through this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub participant_id: String,
    pub created_at: DateTime<Utc>,
    pub state: SessionState,
    pub status: SessionStatus,
    pub question: String,
    pub attempts: Vec<AttemptView>,
    pub comparison: Option<Comparison>,
    /// Most recent degraded-stage or blocking failure, for display
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptView {
    pub index: AttemptIndex,
    pub status: StageStatus,
    pub recorded_at: DateTime<Utc>,
    pub transcript: Option<Transcript>,
    pub quality: Option<RecordingQuality>,
    pub feedback: Option<Feedback>,
    pub has_model_audio: bool,
}

impl AttemptView {
    pub fn from_attempt(attempt: &Attempt) -> Self {
        Self {
            index: attempt.index,
            status: attempt.status,
            recorded_at: attempt.recorded_at,
            transcript: attempt.transcript.clone(),
            quality: attempt.transcript.as_ref().map(Transcript::quality),
            feedback: attempt.feedback.clone(),
            has_model_audio: attempt.model_audio.is_some(),
        }
    }
}
