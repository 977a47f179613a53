use super::error::SdkCallError;
use serde_json::Value;

/// Request for the modern (v2) transcription convention: a structured
/// request object, the way current SDK builds expose it.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub audio: Vec<u8>,
    /// Container/codec tag of the upload ("wav", "webm")
    pub format: String,
    pub language: String,
    pub model: String,
}

/// Request for the modern (v2) feedback convention.
#[derive(Debug, Clone)]
pub struct FeedbackRequest {
    pub question: String,
    pub transcript: String,
    pub speech_duration_secs: f64,
    pub model: String,
}

/// Request for the modern (v2) synthesis convention.
#[derive(Debug, Clone)]
pub struct SynthesizeRequest {
    pub text: String,
    pub voice_id: String,
    pub model: String,
}

/// Speech-to-text vendor binding.
///
/// Deployed environments carry drifting SDK versions: newer builds expose
/// the structured v2 entry point, older builds only the flat v1 call. A
/// binding returns `SdkCallError::SignatureMismatch` from the entry point
/// its installed version does not export; the adaptive client resolves
/// which one to use and never calls the other again.
#[async_trait::async_trait]
pub trait SpeechToTextSdk: Send + Sync {
    /// Modern convention: structured request, verbose JSON payload back.
    async fn transcribe_v2(&self, request: TranscribeRequest) -> Result<Value, SdkCallError>;

    /// Legacy convention: flat arguments, minimal JSON payload back.
    async fn transcribe_v1(&self, audio: &[u8], language: &str) -> Result<Value, SdkCallError>;
}

/// Language-feedback vendor binding (same version-drift contract).
#[async_trait::async_trait]
pub trait LanguageFeedbackSdk: Send + Sync {
    async fn review_v2(&self, request: FeedbackRequest) -> Result<Value, SdkCallError>;

    async fn review_v1(&self, prompt: &str) -> Result<Value, SdkCallError>;
}

/// Speech-synthesis vendor binding (same version-drift contract).
/// Audio comes back as raw encoded bytes rather than JSON.
#[async_trait::async_trait]
pub trait SpeechSynthesisSdk: Send + Sync {
    async fn synthesize_v2(&self, request: SynthesizeRequest) -> Result<Vec<u8>, SdkCallError>;

    async fn synthesize_v1(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SdkCallError>;
}
