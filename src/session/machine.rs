use crate::backup::{BackupArtifactBundle, BackupDispatcher, BackupOutcome};
use crate::client::ServiceError;
use crate::session::compare::Comparison;
use crate::session::stages::{FeedbackStage, StageOutcome, SynthesisStage, TranscriptionStage};
use crate::session::types::{
    Attempt, AttemptIndex, Recording, SessionStatus, StageStatus,
};
use crate::session::view::{AttemptView, SessionView};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

/// Where the session currently stands. UI events move it forward; the
/// two `InProgress` states cover the stage pipeline of the active
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AwaitingFirstRecording,
    Attempt1InProgress,
    AwaitingSecondRecording,
    Attempt2InProgress,
    Completed,
    Abandoned,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Abandoned)
    }
}

#[derive(Error, Debug)]
pub enum SessionOpError {
    #[error("operation not valid in state {state:?}")]
    InvalidState { state: SessionState },

    /// Recording rejected before any network call
    #[error("recording rejected: {0}")]
    Rejected(String),

    /// Transcription is mandatory; its failure blocks the attempt and
    /// returns the session to the recording boundary
    #[error("transcription failed: {0}")]
    TranscriptionFailed(ServiceError),

    /// Authentication failure is fatal for the whole session
    #[error("session halted: {0}")]
    Halted(ServiceError),

    #[error("backup dispatch failed: {0}")]
    Backup(String),
}

/// One participant run. Holds the two attempt slots and the cached
/// comparison; owned by the state machine for the process lifetime and
/// never shared across processes.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub participant_id: String,
    pub created_at: DateTime<Utc>,
    attempts: [Option<Attempt>; 2],
    status: SessionStatus,
    comparison: Option<Comparison>,
}

impl Session {
    fn new(participant_id: String) -> Self {
        Self {
            id: format!("session-{}", uuid::Uuid::new_v4()),
            participant_id,
            created_at: Utc::now(),
            attempts: [None, None],
            status: SessionStatus::InProgress,
            comparison: None,
        }
    }

    pub fn attempt(&self, index: AttemptIndex) -> Option<&Attempt> {
        match index {
            AttemptIndex::First => self.attempts[0].as_ref(),
            AttemptIndex::Second => self.attempts[1].as_ref(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }
}

/// The session state machine: sequences the two attempts and their
/// stages, decides blocking vs degraded continuation, and hands the
/// finished session to the backup dispatcher exactly once.
pub struct SessionRunner {
    session: Session,
    state: SessionState,
    question: String,
    transcription: TranscriptionStage,
    feedback: FeedbackStage,
    synthesis: SynthesisStage,
    backup_outcome: Option<BackupOutcome>,
    last_error: Option<String>,
}

impl SessionRunner {
    pub fn new(
        participant_id: String,
        question: String,
        transcription: TranscriptionStage,
        feedback: FeedbackStage,
        synthesis: SynthesisStage,
    ) -> Self {
        let session = Session::new(participant_id);
        info!(
            "session {} created for participant {}",
            session.id, session.participant_id
        );
        Self {
            session,
            state: SessionState::AwaitingFirstRecording,
            question,
            transcription,
            feedback,
            synthesis,
            backup_outcome: None,
            last_error: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Accept a recording for the attempt slot the current state points
    /// at, then drive its stages in order. Transcription must succeed;
    /// feedback and synthesis may degrade. Returns which slot was run.
    pub async fn submit_recording(
        &mut self,
        recording: Recording,
    ) -> Result<AttemptIndex, SessionOpError> {
        let index = match self.state {
            SessionState::AwaitingFirstRecording => AttemptIndex::First,
            SessionState::AwaitingSecondRecording => AttemptIndex::Second,
            state => return Err(SessionOpError::InvalidState { state }),
        };

        // A fresh attempt always replaces whatever a previous blocked
        // attempt left in the slot; recordings themselves are immutable.
        let slot = (index.number() - 1) as usize;
        self.session.attempts[slot] = Some(Attempt::new(index, recording.clone()));
        self.state = match index {
            AttemptIndex::First => SessionState::Attempt1InProgress,
            AttemptIndex::Second => SessionState::Attempt2InProgress,
        };
        self.last_error = None;

        info!("attempt {} recorded, starting stages", index.number());
        self.run_stages(index, recording).await?;
        Ok(index)
    }

    async fn run_stages(
        &mut self,
        index: AttemptIndex,
        recording: Recording,
    ) -> Result<(), SessionOpError> {
        let slot = (index.number() - 1) as usize;

        // Stage 1: transcription (mandatory)
        let transcript = match self.transcription.run(&recording).await {
            StageOutcome::Ok(transcript) => {
                if let Some(attempt) = self.session.attempts[slot].as_mut() {
                    attempt.transcript = Some(transcript.clone());
                    attempt.status = StageStatus::Transcribed;
                }
                transcript
            }
            StageOutcome::Failed(err) => return self.block_on_transcription(slot, index, err),
        };

        // Stage 2: feedback (degradable)
        let feedback = match self.feedback.run(&self.question, &transcript).await {
            StageOutcome::Ok(feedback) => {
                if let Some(attempt) = self.session.attempts[slot].as_mut() {
                    attempt.feedback = Some(feedback.clone());
                    attempt.status = StageStatus::FedBack;
                }
                Some(feedback)
            }
            StageOutcome::Failed(err @ ServiceError::Authentication { .. }) => {
                return self.halt(err);
            }
            StageOutcome::Failed(err) => {
                warn!(
                    "attempt {} continues without feedback: {}",
                    index.number(),
                    err
                );
                self.last_error = Some(err.to_string());
                None
            }
        };

        // Stage 3: synthesis (attempt 1 only, needs a model sentence)
        if index == AttemptIndex::First {
            if let Some(sentence) = feedback.map(|f| f.corrected_text) {
                match self.synthesis.run(&sentence).await {
                    StageOutcome::Ok(model_audio) => {
                        if let Some(attempt) = self.session.attempts[slot].as_mut() {
                            attempt.model_audio = Some(model_audio);
                            attempt.status = StageStatus::Synthesized;
                        }
                    }
                    StageOutcome::Failed(err @ ServiceError::Authentication { .. }) => {
                        return self.halt(err);
                    }
                    StageOutcome::Failed(err) => {
                        warn!("attempt 1 continues without model audio: {}", err);
                        self.last_error = Some(err.to_string());
                    }
                }
            }
        }

        Ok(())
    }

    fn block_on_transcription(
        &mut self,
        slot: usize,
        index: AttemptIndex,
        err: ServiceError,
    ) -> Result<(), SessionOpError> {
        if let ServiceError::Authentication { .. } = err {
            return self.halt(err);
        }

        if let Some(attempt) = self.session.attempts[slot].as_mut() {
            attempt.status = StageStatus::Failed;
        }
        self.last_error = Some(err.to_string());

        // Back to the recording boundary so the participant can rerecord.
        self.state = match index {
            AttemptIndex::First => SessionState::AwaitingFirstRecording,
            AttemptIndex::Second => SessionState::AwaitingSecondRecording,
        };

        match err {
            ServiceError::Validation(reason) => Err(SessionOpError::Rejected(reason)),
            err => Err(SessionOpError::TranscriptionFailed(err)),
        }
    }

    fn halt(&mut self, err: ServiceError) -> Result<(), SessionOpError> {
        error!("authentication failure, halting session: {}", err);
        self.session.status = SessionStatus::Abandoned;
        self.state = SessionState::Abandoned;
        self.last_error = Some(err.to_string());
        Err(SessionOpError::Halted(err))
    }

    /// Move past a finished attempt. Attempt 2 never starts before
    /// attempt 1 has a transcript; that invariant is enforced here, not
    /// trusted from callers.
    pub fn advance(&mut self) -> SessionStatus {
        match self.state {
            SessionState::Attempt1InProgress => {
                let transcribed = self
                    .session
                    .attempt(AttemptIndex::First)
                    .map(Attempt::is_transcribed)
                    .unwrap_or(false);
                if transcribed {
                    self.state = SessionState::AwaitingSecondRecording;
                    info!("session {} awaiting second recording", self.session.id);
                } else {
                    warn!("cannot advance: attempt 1 has no transcript");
                }
            }
            SessionState::Attempt2InProgress => {
                let transcribed = self
                    .session
                    .attempt(AttemptIndex::Second)
                    .map(Attempt::is_transcribed)
                    .unwrap_or(false);
                if transcribed {
                    self.state = SessionState::Completed;
                    self.session.status = SessionStatus::Completed;
                    // Both transcripts exist now; warm the cache.
                    self.comparison();
                    info!("session {} completed", self.session.id);
                } else {
                    warn!("cannot advance: attempt 2 has no transcript");
                }
            }
            // Awaiting states advance only through submit_recording;
            // terminal states stay put.
            _ => {}
        }
        self.session.status
    }

    /// Abandon at a state boundary. Completed attempt data is retained
    /// in-process; there is no cross-process resume.
    pub fn abandon(&mut self) -> SessionStatus {
        if !self.state.is_terminal() {
            info!("session {} abandoned in {:?}", self.session.id, self.state);
            self.state = SessionState::Abandoned;
            self.session.status = SessionStatus::Abandoned;
        }
        self.session.status
    }

    /// The attempt-1 vs attempt-2 comparison, computed lazily once both
    /// attempts are at least transcribed and cached for the session.
    pub fn comparison(&mut self) -> Option<&Comparison> {
        if self.session.comparison.is_none() {
            if let (Some(first), Some(second)) = (
                self.session.attempt(AttemptIndex::First),
                self.session.attempt(AttemptIndex::Second),
            ) {
                if first.is_transcribed() && second.is_transcribed() {
                    self.session.comparison = Comparison::between(first, second);
                }
            }
        }
        self.session.comparison.as_ref()
    }

    /// Build the immutable artifact bundle and hand it to the dispatcher.
    /// Idempotent: a session is persisted once; repeat calls return the
    /// recorded outcome.
    pub async fn finalize(
        &mut self,
        dispatcher: &BackupDispatcher,
    ) -> Result<BackupOutcome, SessionOpError> {
        if self.state != SessionState::Completed {
            return Err(SessionOpError::InvalidState { state: self.state });
        }
        if let Some(outcome) = &self.backup_outcome {
            return Ok(outcome.clone());
        }

        self.comparison();
        let bundle = BackupArtifactBundle::from_session(
            &self.session.id,
            &self.session.participant_id,
            self.session.created_at,
            &self.question,
            [
                self.session.attempt(AttemptIndex::First),
                self.session.attempt(AttemptIndex::Second),
            ],
            self.session.comparison.clone(),
        );

        let outcome = dispatcher
            .dispatch(&bundle)
            .await
            .map_err(|e| SessionOpError::Backup(e.to_string()))?;

        if let BackupOutcome::LocalOnly { .. } = outcome {
            self.session.status = SessionStatus::CompletedLocalOnly;
        }
        self.backup_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Renderable snapshot of the whole run.
    pub fn current_view(&mut self) -> SessionView {
        self.comparison();
        SessionView {
            session_id: self.session.id.clone(),
            participant_id: self.session.participant_id.clone(),
            created_at: self.session.created_at,
            state: self.state,
            status: self.session.status,
            question: self.question.clone(),
            attempts: self
                .session
                .attempts
                .iter()
                .flatten()
                .map(AttemptView::from_attempt)
                .collect(),
            comparison: self.session.comparison.clone(),
            last_error: self.last_error.clone(),
        }
    }
}
