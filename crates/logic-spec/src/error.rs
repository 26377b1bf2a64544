use thiserror::Error;

/// Failures while loading or encoding questionnaire documents.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("invalid questionnaire document: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("invalid responses document: {0}")]
    Responses(#[source] serde_json::Error),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error("cbor encode error: {0}")]
    CborEncode(#[source] serde_cbor::Error),
}
