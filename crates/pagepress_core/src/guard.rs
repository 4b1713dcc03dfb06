use std::time::{Duration, Instant};

use crate::ResetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Activity {
    #[default]
    Idle,
    Uploading,
    Processing,
    /// The result download is being triggered; exit is allowed but a reset
    /// would pull the session out from under it.
    DownloadGrace { until: Instant },
}

/// Tracks whether leaving or clearing the session would abandon work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGuard {
    activity: Activity,
    grace: Duration,
    warning: String,
}

impl Default for SessionGuard {
    fn default() -> Self {
        let policy = crate::PolicyConfig::default();
        Self::new(policy.download_grace(), policy.exit_warning)
    }
}

impl SessionGuard {
    pub fn new(grace: Duration, warning: impl Into<String>) -> Self {
        Self {
            activity: Activity::Idle,
            grace,
            warning: warning.into(),
        }
    }

    pub fn upload_started(&mut self) {
        self.activity = Activity::Uploading;
    }

    pub fn job_started(&mut self) {
        self.activity = Activity::Processing;
    }

    /// The job completed and its download is being triggered.
    pub fn job_completed(&mut self, now: Instant) {
        self.activity = Activity::DownloadGrace {
            until: now + self.grace,
        };
    }

    /// Failure, abort or cancelled upload.
    pub fn job_ended(&mut self) {
        self.activity = Activity::Idle;
    }

    /// The download finished (or failed) before the grace window ran out.
    pub fn download_settled(&mut self) {
        if matches!(self.activity, Activity::DownloadGrace { .. }) {
            self.activity = Activity::Idle;
        }
    }

    /// Expires the grace window. Returns true when the state changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.activity {
            Activity::DownloadGrace { until } if now >= until => {
                self.activity = Activity::Idle;
                true
            }
            _ => false,
        }
    }

    /// True from submission until a terminal or aborted phase. The download
    /// grace window does not count.
    pub fn is_job_active(&self) -> bool {
        matches!(self.activity, Activity::Uploading | Activity::Processing)
    }

    pub fn is_uploading(&self) -> bool {
        self.activity == Activity::Uploading
    }

    pub fn in_download_grace(&self, now: Instant) -> bool {
        matches!(self.activity, Activity::DownloadGrace { until } if now < until)
    }

    /// Warning for the host's exit confirmation, or `None` when leaving is safe.
    pub fn guard_exit(&self) -> Option<&str> {
        self.is_job_active().then_some(self.warning.as_str())
    }

    /// Checks whether the session may be cleared. An active job needs an
    /// explicit confirmation from the user.
    pub fn check_reset(&self, now: Instant, confirmed: bool) -> Result<(), ResetError> {
        if self.in_download_grace(now) {
            return Err(ResetError::DownloadPending);
        }
        if self.is_job_active() && !confirmed {
            return Err(ResetError::ConfirmationRequired {
                warning: self.warning.clone(),
            });
        }
        Ok(())
    }
}
