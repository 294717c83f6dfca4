//! Unified error types for the QR service.

use serde::Serialize;
use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Unified error type for the service process.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration validation error.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// QR generation error.
    #[error("qr error: {0}")]
    Qr(#[from] QrError),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning a request into an image.
///
/// Display strings are what clients see in the `error` field, so they stay
/// short and never include internal detail.
#[derive(Error, Debug)]
pub enum QrError {
    /// `data` was absent or empty.
    #[error("Missing required parameter: data")]
    MissingData,

    /// `size` was not an integer or not positive.
    #[error("invalid size: {0}")]
    InvalidSize(String),

    /// `fg` or `bg` could not be parsed as a color.
    #[error("unknown color specifier: '{0}'")]
    InvalidColor(String),

    /// The encoder rejected the payload.
    #[error("{0}")]
    Encode(#[from] qrcode::types::QrError),

    /// Rasterizing or PNG encoding failed.
    #[error("{0}")]
    Image(#[from] image::ImageError),

    /// The blocking generation task did not complete.
    #[error("generation task failed: {0}")]
    Worker(String),
}

/// Coarse error category exposed to metrics and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A required request parameter was missing.
    MissingParameter,
    /// Anything that went wrong during encode/render/resize.
    EncodingFailure,
}

impl QrError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QrError::MissingData => ErrorKind::MissingParameter,
            _ => ErrorKind::EncodingFailure,
        }
    }

    /// Whether the client could fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QrError::MissingData | QrError::InvalidSize(_) | QrError::InvalidColor(_)
        )
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_data_is_a_missing_parameter() {
        assert_eq!(QrError::MissingData.kind(), ErrorKind::MissingParameter);
        assert_eq!(
            QrError::InvalidColor("nope".into()).kind(),
            ErrorKind::EncodingFailure
        );
        assert_eq!(
            QrError::Encode(qrcode::types::QrError::DataTooLong).kind(),
            ErrorKind::EncodingFailure
        );
    }

    #[test]
    fn messages_are_client_facing() {
        assert_eq!(
            QrError::MissingData.to_string(),
            "Missing required parameter: data"
        );
        assert_eq!(
            QrError::InvalidColor("blurple".into()).to_string(),
            "unknown color specifier: 'blurple'"
        );
        assert_eq!(ErrorKind::EncodingFailure.to_string(), "encoding_failure");
    }

    #[test]
    fn encoder_failures_are_server_side() {
        assert!(QrError::InvalidSize("abc".into()).is_client_error());
        assert!(!QrError::Encode(qrcode::types::QrError::DataTooLong).is_client_error());
    }
}
