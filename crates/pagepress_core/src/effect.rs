use crate::{ConfigSnapshot, JobId, UploadId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run the best-effort signature pre-check on the loaded document.
    CheckSignature,
    /// Upload the loaded document with this page map. Replies carry
    /// `upload_id` back.
    SubmitJob {
        upload_id: UploadId,
        snapshot: ConfigSnapshot,
    },
    /// Drop the in-flight upload.
    CancelUpload,
    OpenChannel { job_id: JobId },
    CloseChannel { job_id: JobId },
    /// Fetch the processed file.
    Download {
        job_id: JobId,
        file_name: Option<String>,
    },
    /// Ask the user before abandoning the running job.
    ConfirmClear { warning: String },
    /// Ask the user before leaving while a job runs.
    ConfirmExit { warning: String },
    Exit,
}
