use thiserror::Error;

use crate::engine::EngineError;

/// Crate-wide result alias; startup and IO plumbing carry `anyhow` context.
pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// Failures produced while handling a translation request.
///
/// The `Display` strings are part of the HTTP contract: the boundary returns
/// them verbatim inside `{"error": ...}` bodies, so they must not change
/// without updating clients.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The request body carried no `text` field.
    #[error("No text provided")]
    MissingText,

    /// `text` was empty or whitespace-only after trimming.
    #[error("Empty text")]
    EmptyText,

    /// An explicit model identifier matched no loaded registry entry.
    #[error("Invalid model")]
    UnknownModel,

    /// A (source, target) pair resolved to no loaded registry entry.
    ///
    /// The source-language field is named `source_lang` because `thiserror`
    /// reserves the name `source` for the error cause.
    #[error("Unsupported language pair: {source_lang}-{target}")]
    UnsupportedPair { source_lang: String, target: String },

    /// The external inference call failed after validation passed.
    #[error("{0}")]
    Inference(#[from] EngineError),
}

impl TranslateError {
    /// Whether the failure was caused by the request rather than the
    /// upstream engine. Inference failures are still reported to clients
    /// with the same 400 status; this split exists for logging only.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, TranslateError::Inference(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_wire_contract() {
        assert_eq!(TranslateError::MissingText.to_string(), "No text provided");
        assert_eq!(TranslateError::EmptyText.to_string(), "Empty text");
        assert_eq!(TranslateError::UnknownModel.to_string(), "Invalid model");
        assert_eq!(
            TranslateError::UnsupportedPair {
                source_lang: "xx".to_owned(),
                target: "yy".to_owned(),
            }
            .to_string(),
            "Unsupported language pair: xx-yy"
        );
    }

    #[test]
    fn inference_failures_are_not_client_errors() {
        assert!(TranslateError::EmptyText.is_client_error());
        assert!(!TranslateError::Inference(EngineError::EmptyResponse).is_client_error());
    }
}
