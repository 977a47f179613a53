//! HTTP bindings for the vendor capabilities
//!
//! Default implementations of the SDK seams, talking to the speech and
//! language services over their public HTTP APIs. Deployments with an
//! in-house SDK wrapper swap these out at construction; nothing else in
//! the crate knows the difference.

use super::error::SdkCallError;
use super::sdk::{
    FeedbackRequest, LanguageFeedbackSdk, SpeechSynthesisSdk, SpeechToTextSdk, SynthesizeRequest,
    TranscribeRequest,
};
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_SPEECH_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SYNTHESIS_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Model used when the legacy flat call carries no model parameter.
const DEFAULT_FEEDBACK_MODEL: &str = "gpt-4o";

/// Instruction sent with feedback requests. The assessment-facing prompt
/// wording lives with the deployment; this is the structural contract.
const FEEDBACK_FORMAT_INSTRUCTION: &str = "You are a language tutor. Reply with a single JSON \
object with fields: model_sentence, model_sentence_english, grammar_issues (array of strings), \
vocabulary_suggestions (array of strings), content_suggestions (array of strings), summary, \
readiness_score (integer 1-10).";

fn http_client() -> Result<reqwest::Client, SdkCallError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| SdkCallError::Unavailable(format!("failed to build HTTP client: {}", e)))
}

/// Classify a transport-level failure. Connectivity and timeouts are
/// transient; everything else about the request itself is malformed use.
fn transport_error(err: reqwest::Error) -> SdkCallError {
    if err.is_timeout() || err.is_connect() {
        SdkCallError::Unavailable(err.to_string())
    } else {
        SdkCallError::MalformedPayload(err.to_string())
    }
}

/// Classify an HTTP status. 401/403 are credential rejections; 408/429
/// and the 5xx family are transient.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SdkCallError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => Err(SdkCallError::Auth(format!("{}: {}", status, body))),
        408 | 429 => Err(SdkCallError::Unavailable(format!("{}: {}", status, body))),
        code if code >= 500 => Err(SdkCallError::Unavailable(format!("{}: {}", status, body))),
        _ => Err(SdkCallError::MalformedPayload(format!("{}: {}", status, body))),
    }
}

/// Speech-to-text over the transcription HTTP API.
pub struct HttpSpeechToText {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSpeechToText {
    pub fn new(api_key: Option<String>) -> Result<Self, SdkCallError> {
        Ok(Self {
            client: http_client()?,
            base_url: DEFAULT_SPEECH_BASE_URL.to_string(),
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn key(&self) -> Result<&str, SdkCallError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SdkCallError::Auth("no API key configured".to_string()))
    }

    async fn upload(
        &self,
        audio: Vec<u8>,
        file_name: String,
        language: &str,
        model: &str,
        response_format: &str,
    ) -> Result<Value, SdkCallError> {
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio).file_name(file_name),
            )
            .text("model", model.to_string())
            .text("language", language.to_string())
            .text("response_format", response_format.to_string());

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(self.key()?)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| SdkCallError::MalformedPayload(e.to_string()))
    }
}

#[async_trait::async_trait]
impl SpeechToTextSdk for HttpSpeechToText {
    async fn transcribe_v2(&self, request: TranscribeRequest) -> Result<Value, SdkCallError> {
        self.upload(
            request.audio,
            format!("recording.{}", request.format),
            &request.language,
            &request.model,
            "verbose_json",
        )
        .await
    }

    async fn transcribe_v1(&self, audio: &[u8], language: &str) -> Result<Value, SdkCallError> {
        self.upload(
            audio.to_vec(),
            "recording.wav".to_string(),
            language,
            "whisper-1",
            "json",
        )
        .await
    }
}

/// Language feedback over the chat-completions HTTP API.
pub struct HttpLanguageFeedback {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpLanguageFeedback {
    pub fn new(api_key: Option<String>) -> Result<Self, SdkCallError> {
        Ok(Self {
            client: http_client()?,
            base_url: DEFAULT_SPEECH_BASE_URL.to_string(),
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn key(&self) -> Result<&str, SdkCallError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SdkCallError::Auth("no API key configured".to_string()))
    }

    async fn complete(&self, body: Value) -> Result<Value, SdkCallError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.key()?)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let payload: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SdkCallError::MalformedPayload(e.to_string()))?;

        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SdkCallError::MalformedPayload("completion has no message content".to_string())
            })?;

        serde_json::from_str(strip_code_fences(content))
            .map_err(|e| SdkCallError::MalformedPayload(format!("content is not JSON: {}", e)))
    }
}

#[async_trait::async_trait]
impl LanguageFeedbackSdk for HttpLanguageFeedback {
    async fn review_v2(&self, request: FeedbackRequest) -> Result<Value, SdkCallError> {
        self.complete(json!({
            "model": request.model,
            "temperature": 0.1,
            "messages": [
                {"role": "system", "content": FEEDBACK_FORMAT_INSTRUCTION},
                {"role": "user", "content": format!(
                    "Question: {}\nStudent answer ({:.1}s): {}",
                    request.question, request.speech_duration_secs, request.transcript
                )},
            ],
        }))
        .await
    }

    async fn review_v1(&self, prompt: &str) -> Result<Value, SdkCallError> {
        self.complete(json!({
            "model": DEFAULT_FEEDBACK_MODEL,
            "temperature": 0.1,
            "messages": [
                {"role": "system", "content": FEEDBACK_FORMAT_INSTRUCTION},
                {"role": "user", "content": prompt},
            ],
        }))
        .await
    }
}

/// Speech synthesis over the text-to-speech HTTP API.
pub struct HttpSpeechSynthesis {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSpeechSynthesis {
    pub fn new(api_key: Option<String>) -> Result<Self, SdkCallError> {
        Ok(Self {
            client: http_client()?,
            base_url: DEFAULT_SYNTHESIS_BASE_URL.to_string(),
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn key(&self) -> Result<&str, SdkCallError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SdkCallError::Auth("no API key configured".to_string()))
    }

    async fn generate(&self, voice_id: &str, body: Value) -> Result<Vec<u8>, SdkCallError> {
        let response = self
            .client
            .post(format!("{}/text-to-speech/{}", self.base_url, voice_id))
            .header("xi-api-key", self.key()?)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(|e| SdkCallError::MalformedPayload(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl SpeechSynthesisSdk for HttpSpeechSynthesis {
    async fn synthesize_v2(&self, request: SynthesizeRequest) -> Result<Vec<u8>, SdkCallError> {
        self.generate(
            &request.voice_id,
            json!({
                "text": request.text,
                "model_id": request.model,
                "voice_settings": {
                    "stability": 0.75,
                    "style": 0.45,
                    "speed": 1.0,
                },
            }),
        )
        .await
    }

    async fn synthesize_v1(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SdkCallError> {
        self.generate(voice_id, json!({ "text": text })).await
    }
}

/// Models frequently wrap their JSON in markdown fences.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
