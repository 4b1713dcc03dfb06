use std::path::PathBuf;
use std::time::Instant;

use crate::{FailureReason, JobId, ProgressUpdate, UploadId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// A new file was selected and parsed.
    DocumentLoaded {
        name: String,
        size_bytes: u64,
        page_count: usize,
    },
    /// The selected file could not be parsed.
    DocumentRejected { reason: String },
    /// User picked a profile code for one page.
    ProfileSelected { index: usize, code: u8 },
    /// User bulk-applied a profile code to every page.
    AllProfilesSelected { code: u8 },
    /// User asked to submit the document for processing.
    SubmitClicked,
    /// Upload transfer progress.
    UploadProgress {
        upload_id: UploadId,
        sent: u64,
        total: u64,
    },
    /// The service acknowledged the upload with a job id.
    SubmitSucceeded { upload_id: UploadId, job_id: JobId },
    /// Submission failed in transport or was refused by the service.
    SubmitFailed { upload_id: UploadId, reason: String },
    /// The progress channel for a job is open.
    ChannelOpened { job_id: JobId },
    /// A normalized update arrived on the progress channel.
    ProgressReceived {
        job_id: JobId,
        update: ProgressUpdate,
        at: Instant,
    },
    /// The progress channel failed before a terminal status.
    ChannelFailed { job_id: JobId, reason: FailureReason },
    /// The result was saved locally.
    DownloadFinished { job_id: JobId, path: PathBuf },
    /// The result could not be fetched.
    DownloadFailed { job_id: JobId, reason: String },
    /// Result of the signature pre-check. Failures never reach the core.
    SignatureChecked { detected: bool },
    /// User cancelled the upload or the running job.
    AbortClicked,
    /// User asked to clear the form.
    ClearClicked { at: Instant },
    /// User confirmed clearing despite a running job.
    ClearConfirmed { at: Instant },
    /// The host is about to close the session.
    ExitRequested,
    /// Periodic clock tick.
    Tick { now: Instant },
    /// Fallback for placeholder wiring.
    NoOp,
}
