//! Error taxonomy for the acquisition pipeline
//!
//! Every stage fails fast with one of five kinds. The caller only ever needs
//! the kind and the message, so each variant carries a plain string.

use std::fmt;
use thiserror::Error;

/// Result alias used by every pipeline stage
pub type Result<T> = std::result::Result<T, FetchError>;

/// Failure raised by a pipeline stage
#[derive(Debug, Error)]
pub enum FetchError {
    /// The release listing was empty or absent
    #[error("{0}")]
    NotFound(String),

    /// Upstream or local data had an unexpected shape
    #[error("{0}")]
    MalformedData(String),

    /// Local file read/write failure
    #[error("{0}")]
    Io(String),

    /// A required input was missing or empty
    #[error("{0}")]
    Input(String),

    /// Transport failure or non-success HTTP status
    #[error("{0}")]
    Network(String),
}

/// Kind of a [`FetchError`], without its message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    MalformedData,
    Io,
    Input,
    Network,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFoundError",
            Self::MalformedData => "MalformedDataError",
            Self::Io => "IOError",
            Self::Input => "InputError",
            Self::Network => "NetworkError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::MalformedData(_) => ErrorKind::MalformedData,
            Self::Io(_) => ErrorKind::Io,
            Self::Input(_) => ErrorKind::Input,
            Self::Network(_) => ErrorKind::Network,
        }
    }

    /// Message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m)
            | Self::MalformedData(m)
            | Self::Io(m)
            | Self::Input(m)
            | Self::Network(m) => m,
        }
    }

    /// Wrap an I/O error with the action that failed
    pub(crate) fn io(action: impl fmt::Display, err: std::io::Error) -> Self {
        Self::Io(format!("{}: {}", action, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::NotFound.to_string(), "NotFoundError");
        assert_eq!(ErrorKind::MalformedData.to_string(), "MalformedDataError");
        assert_eq!(ErrorKind::Io.to_string(), "IOError");
        assert_eq!(ErrorKind::Input.to_string(), "InputError");
        assert_eq!(ErrorKind::Network.to_string(), "NetworkError");
    }

    #[test]
    fn test_display_is_message_only() {
        let err = FetchError::Network("HTTP 500 from https://x".into());
        assert_eq!(err.to_string(), "HTTP 500 from https://x");
        assert_eq!(err.message(), "HTTP 500 from https://x");
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_io_helper_includes_action() {
        let err = FetchError::io(
            "cannot read package.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.message().starts_with("cannot read package.json"));
        assert!(err.message().contains("missing"));
    }
}
