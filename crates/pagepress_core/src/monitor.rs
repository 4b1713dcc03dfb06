use std::fmt;

use press_logging::{press_debug, press_info, press_warn};

use crate::{PolicyConfig, ProgressUpdate, UpdateStatus};

/// Opaque job token issued by the processing service.
pub type JobId = String;

/// Client-side sequence number of one submission.
pub type UploadId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The service reported the failure marker.
    Server(String),
    /// The progress channel broke before a terminal status arrived.
    ChannelError(String),
    /// Nothing arrived on the channel within the staleness window.
    Stalled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Server(reason) => write!(f, "processing failed: {reason}"),
            FailureReason::ChannelError(reason) => write!(f, "progress channel error: {reason}"),
            FailureReason::Stalled => write!(f, "no progress received from the server"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    Connecting,
    Streaming,
    Completed,
    Failed(FailureReason),
    Aborted,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobPhase::Completed | JobPhase::Failed(_) | JobPhase::Aborted
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobPhase::Connecting => "Connecting",
            JobPhase::Streaming => "Processing",
            JobPhase::Completed => "Completed",
            JobPhase::Failed(_) => "Failed",
            JobPhase::Aborted => "Aborted",
        }
    }
}

/// Outcome of feeding one update into a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Progressed,
    Completed,
    Failed,
    /// The job was already terminal; nothing changed.
    Discarded,
}

/// One server-side processing run, tracked from channel open to a terminal
/// phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub phase: JobPhase,
    pub upload_percent: f64,
    pub server_percent: f64,
    pub status_text: String,
    pub log_lines: Vec<String>,
    pub final_file_name: Option<String>,
    pub signature_detected: bool,
}

impl Job {
    /// A job exists only once the upload finished and the service issued an id.
    pub fn new(id: impl Into<JobId>) -> Self {
        Self {
            id: id.into(),
            phase: JobPhase::Connecting,
            upload_percent: 100.0,
            server_percent: 0.0,
            status_text: String::new(),
            log_lines: Vec::new(),
            final_file_name: None,
            signature_detected: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn channel_opened(&mut self) -> bool {
        if self.phase == JobPhase::Connecting {
            press_debug!("Job {}: progress channel open", self.id);
            self.phase = JobPhase::Streaming;
            true
        } else {
            false
        }
    }

    pub fn apply(&mut self, update: ProgressUpdate) -> Applied {
        if self.is_terminal() {
            press_debug!(
                "Job {}: discarding update after {}",
                self.id,
                self.phase.label()
            );
            return Applied::Discarded;
        }
        // An update proves the channel is up even if the open notice was lost.
        self.phase = JobPhase::Streaming;

        self.server_percent = update.server_percent;
        self.log_lines.extend(update.log_delta);
        if update.signature_detected == Some(true) {
            self.signature_detected = true;
        }

        match update.status {
            UpdateStatus::InProgress(text) => {
                if !text.is_empty() {
                    self.status_text = text;
                }
                Applied::Progressed
            }
            UpdateStatus::Done => {
                self.final_file_name = update.final_file;
                self.phase = JobPhase::Completed;
                press_info!("Job {}: completed", self.id);
                Applied::Completed
            }
            UpdateStatus::Failed(reason) => {
                let reason = reason.unwrap_or_else(|| "the server reported a failure".into());
                press_warn!("Job {}: failed: {}", self.id, reason);
                self.phase = JobPhase::Failed(FailureReason::Server(reason));
                Applied::Failed
            }
        }
    }

    /// Transport failure. Ignored once the job is terminal.
    pub fn channel_failed(&mut self, reason: FailureReason) -> bool {
        if self.is_terminal() {
            return false;
        }
        press_warn!("Job {}: {}", self.id, reason);
        self.phase = JobPhase::Failed(reason);
        true
    }

    pub fn abort(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        press_info!("Job {}: aborted by user", self.id);
        self.phase = JobPhase::Aborted;
        true
    }

    pub fn unified_percent(&self, policy: &PolicyConfig) -> f64 {
        match self.phase {
            JobPhase::Completed => 100.0,
            _ => policy.unified_from_server(self.server_percent),
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.phase {
            JobPhase::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
