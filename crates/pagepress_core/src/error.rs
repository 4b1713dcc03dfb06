use thiserror::Error;

/// Rejected page-configuration mutations. These are local validation
/// failures; callers recover by re-validating input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("document must have at least one page and a non-zero size")]
    InvalidDocument,
    #[error("page index {index} out of range (document has {page_count} pages)")]
    IndexOutOfRange { index: usize, page_count: usize },
    #[error("invalid compression profile: {0}")]
    InvalidProfile(String),
    #[error("page configuration is not initialized")]
    NotInitialized,
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
}

/// Reasons a session reset is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResetError {
    #[error("a job is in progress: {warning}")]
    ConfirmationRequired { warning: String },
    #[error("the result download is still being triggered")]
    DownloadPending,
}
