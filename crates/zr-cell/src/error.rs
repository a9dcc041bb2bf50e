//! The one error enum shared across the core. Callers branch on *kind*, so
//! this is a plain `thiserror` enum rather than an opaque `anyhow::Error` —
//! the one deliberate departure from the ambient `anyhow`-everywhere style.

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ZrError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("limit exceeded: {0}")]
    Limit(String),
    #[error("format error: {0}")]
    Format(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("platform error: {0}")]
    Platform(String),
}

impl ZrError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ZrError::InvalidArgument(msg.into())
    }
    pub fn limit(msg: impl Into<String>) -> Self {
        ZrError::Limit(msg.into())
    }
    pub fn format(msg: impl Into<String>) -> Self {
        ZrError::Format(msg.into())
    }
    pub fn unsupported(msg: impl Into<String>) -> Self {
        ZrError::Unsupported(msg.into())
    }
    pub fn platform(msg: impl Into<String>) -> Self {
        ZrError::Platform(msg.into())
    }
}

pub type ZrResult<T> = Result<T, ZrError>;
