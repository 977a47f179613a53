//! Adaptive service client
//!
//! One stable call surface over three vendor capabilities whose installed
//! SDK versions drift between a modern and a legacy calling convention:
//! - Capability probe on first use, sticky for the process lifetime
//! - Single retry/timeout layer for transient failures
//! - Typed error taxonomy the session layer can triage

mod adaptive;
mod error;
mod retry;
mod sdk;
mod vendor;

pub use adaptive::{AdaptiveClient, CallingConvention, ServiceClientHandle};
pub use error::{SdkCallError, ServiceError};
pub use retry::{with_retry, RetryPolicy};
pub use sdk::{
    FeedbackRequest, LanguageFeedbackSdk, SpeechSynthesisSdk, SpeechToTextSdk, SynthesizeRequest,
    TranscribeRequest,
};
pub use vendor::{HttpLanguageFeedback, HttpSpeechSynthesis, HttpSpeechToText};
