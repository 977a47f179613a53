use thiserror::Error;

/// Error surfaced by the adaptive client to the stages.
///
/// The session layer decides per variant whether a failure blocks the
/// session or degrades it; only `Unavailable` is ever retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Authentication failed for {capability}: {reason}")]
    Authentication { capability: String, reason: String },

    #[error("{capability} service unavailable: {reason}")]
    Unavailable { capability: String, reason: String },

    #[error("{capability} returned a response no supported convention can parse: {reason}")]
    UnsupportedResponse { capability: String, reason: String },

    #[error("Invalid input rejected before any network call: {0}")]
    Validation(String),
}

impl ServiceError {
    /// Only transient unavailability is eligible for retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Unavailable { .. })
    }
}

/// Error reported by a raw vendor SDK binding, before the adaptive
/// client has classified it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkCallError {
    /// The installed SDK build does not export this calling convention.
    /// This is the only error that triggers convention fallback.
    #[error("Calling convention not supported by installed SDK: {0}")]
    SignatureMismatch(String),

    #[error("Rejected credentials: {0}")]
    Auth(String),

    #[error("Transient failure: {0}")]
    Unavailable(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl SdkCallError {
    /// Classify a raw SDK failure against the client taxonomy. A
    /// `SignatureMismatch` that survives to this point means neither
    /// convention worked, which is an unsupported-response condition,
    /// not an auth or availability problem.
    pub fn into_service_error(self, capability: &str) -> ServiceError {
        match self {
            SdkCallError::SignatureMismatch(reason) => ServiceError::UnsupportedResponse {
                capability: capability.to_string(),
                reason,
            },
            SdkCallError::Auth(reason) => ServiceError::Authentication {
                capability: capability.to_string(),
                reason,
            },
            SdkCallError::Unavailable(reason) => ServiceError::Unavailable {
                capability: capability.to_string(),
                reason,
            },
            SdkCallError::MalformedPayload(reason) => ServiceError::UnsupportedResponse {
                capability: capability.to_string(),
                reason,
            },
        }
    }
}
