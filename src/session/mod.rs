//! Two-attempt assessment session
//!
//! This module owns everything about one participant run:
//! - The data model (attempts, transcripts, feedback, model audio)
//! - The stage wrappers around the adaptive client
//! - The state machine sequencing recording → transcription → feedback
//!   → comparison across exactly two attempts
//! - The cached attempt-1 vs attempt-2 comparison

mod compare;
mod machine;
mod stages;
mod types;
mod view;

pub use compare::{word_diff, Comparison, DiffSegment};
pub use machine::{Session, SessionOpError, SessionRunner, SessionState};
pub use stages::{FeedbackStage, StageOutcome, SynthesisStage, TranscriptionStage};
pub use types::{
    Attempt, AttemptIndex, AudioBuffer, Feedback, ModelAudio, Recording, RecordingQuality,
    SessionStatus, StageStatus, Suggestion, SuggestionCategory, Transcript,
};
pub use view::{AttemptView, SessionView};
