pub mod backup;
pub mod client;
pub mod config;
pub mod http;
pub mod session;

pub use backup::{
    BackupArtifactBundle, BackupDispatcher, BackupOutcome, LocalFallbackStore, ObjectStore,
};
pub use client::{
    AdaptiveClient, CallingConvention, LanguageFeedbackSdk, RetryPolicy, SdkCallError,
    ServiceError, SpeechSynthesisSdk, SpeechToTextSdk,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use session::{
    Attempt, AttemptIndex, Comparison, Feedback, Recording, SessionRunner, SessionState,
    SessionStatus, SessionView, StageStatus, Transcript,
};
