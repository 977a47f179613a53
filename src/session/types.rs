use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One captured answer, as handed over by the recording widget.
///
/// The core never decodes audio; bytes plus capture metadata are all it
/// needs. Once attached to an attempt the recording is immutable.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Raw encoded audio, opaque to the core
    pub bytes: Vec<u8>,
    /// Container/codec tag as reported by the capture layer ("wav", "webm")
    pub format: String,
    /// Capture duration as measured by the recorder
    pub duration: Duration,
}

/// Quality tier for a spoken answer, judged on measured speech length.
/// The interview target is one minute of speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingQuality {
    /// 60s or more: meets the one-minute goal
    Excellent,
    /// 45-60s
    Good,
    /// 30-45s
    Fair,
    /// Under 30s
    TooShort,
}

impl RecordingQuality {
    pub fn from_duration_secs(secs: f64) -> Self {
        if secs >= 60.0 {
            RecordingQuality::Excellent
        } else if secs >= 45.0 {
            RecordingQuality::Good
        } else if secs >= 30.0 {
            RecordingQuality::Fair
        } else {
            RecordingQuality::TooShort
        }
    }
}

/// Transcription result for one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Transcribed text
    pub text: String,
    /// Source language tag (e.g. "ko")
    pub language: String,
    /// Confidence score (0.0 to 1.0), if the service reports one
    pub confidence: Option<f32>,
    /// Measured speech duration in seconds, as reported by the service
    /// (falls back to the capture duration when absent)
    pub speech_duration_secs: f64,
}

impl Transcript {
    pub fn quality(&self) -> RecordingQuality {
        RecordingQuality::from_duration_secs(self.speech_duration_secs)
    }
}

/// Category of a feedback suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Grammar,
    Vocabulary,
    Content,
}

/// One tagged suggestion inside a feedback result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub category: SuggestionCategory,
    pub text: String,
}

/// Structured feedback for one attempt. The state machine only cares
/// whether this is present; rendering is the UI's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    /// Suggested model answer in the target language
    pub corrected_text: String,
    /// English gloss of the model answer, if provided
    pub corrected_text_english: Option<String>,
    /// Category-tagged improvement suggestions
    pub suggestions: Vec<Suggestion>,
    /// Short natural-language summary of the attempt
    pub summary: String,
    /// Interview-readiness score, 1-10
    pub readiness_score: Option<u8>,
}

/// Synthesized audio returned by the speech-synthesis capability.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub bytes: Vec<u8>,
    /// Encoding tag of the synthesized audio ("mp3")
    pub format: String,
}

/// Model-pronunciation audio attached to attempt 1.
#[derive(Debug, Clone)]
pub struct ModelAudio {
    /// The sentence that was synthesized
    pub text: String,
    pub audio: AudioBuffer,
}

/// How far an attempt's stage pipeline has progressed.
///
/// Stages run strictly in order: recorded, transcribed, fed back, and
/// (attempt 1 only) synthesized. `Failed` marks a blocking transcription
/// failure; degraded later stages keep the last successful status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Recorded,
    Transcribed,
    FedBack,
    Synthesized,
    Failed,
}

/// Which of the two slots an attempt occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptIndex {
    First,
    Second,
}

impl AttemptIndex {
    pub fn number(&self) -> u8 {
        match self {
            AttemptIndex::First => 1,
            AttemptIndex::Second => 2,
        }
    }
}

/// One recording cycle. Created whole on submit; the recording is never
/// replaced, only later-stage fields are filled in as stages succeed.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub index: AttemptIndex,
    pub recording: Recording,
    pub transcript: Option<Transcript>,
    pub feedback: Option<Feedback>,
    /// Only ever populated on attempt 1
    pub model_audio: Option<ModelAudio>,
    pub status: StageStatus,
    pub recorded_at: DateTime<Utc>,
}

impl Attempt {
    pub fn new(index: AttemptIndex, recording: Recording) -> Self {
        Self {
            index,
            recording,
            transcript: None,
            feedback: None,
            model_audio: None,
            status: StageStatus::Recorded,
            recorded_at: Utc::now(),
        }
    }

    /// An attempt counts as usable for comparison once transcribed,
    /// whatever happened to its later stages.
    pub fn is_transcribed(&self) -> bool {
        self.transcript.is_some()
    }
}

/// Overall status of a participant run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    /// Completed, but the bundle only reached local fallback storage
    CompletedLocalOnly,
    Abandoned,
}
