use std::fmt;
use std::path::PathBuf;

use pagepress_core::{FailureReason, JobId, ProgressUpdate, UploadId};
use thiserror::Error;

/// Returned by the processing service when it accepts a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: JobId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    UploadProgress {
        upload_id: UploadId,
        sent: u64,
        total: u64,
    },
    Submitted {
        upload_id: UploadId,
        result: Result<JobHandle, SubmissionError>,
    },
    ChannelOpened {
        job_id: JobId,
    },
    Progress {
        job_id: JobId,
        update: ProgressUpdate,
    },
    ChannelFailed {
        job_id: JobId,
        error: ChannelError,
    },
    Downloaded {
        job_id: JobId,
        result: Result<PathBuf, DownloadError>,
    },
    SignatureChecked {
        detected: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidResponse,
    /// The channel ended before a terminal status.
    Closed,
    Stalled,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Closed => write!(f, "channel closed"),
            FailureKind::Stalled => write!(f, "channel stalled"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

/// Job creation failed. `reason` is the server's `error` text when it sent
/// one, otherwise a transport description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct SubmissionError {
    pub kind: FailureKind,
    pub reason: String,
}

impl SubmissionError {
    pub(crate) fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ChannelError {
    pub kind: FailureKind,
    pub message: String,
}

impl ChannelError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn into_failure_reason(self) -> FailureReason {
        match self.kind {
            FailureKind::Stalled => FailureReason::Stalled,
            _ => FailureReason::ChannelError(self.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct DownloadError {
    pub kind: FailureKind,
    pub message: String,
}

impl DownloadError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub(crate) fn classify_reqwest_error(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_builder() {
        FailureKind::InvalidUrl
    } else {
        FailureKind::Network
    }
}
