use serde::Deserialize;

use crate::policy::clamp_percent;
use crate::StatusMarkers;

/// `logs` arrives either as one string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LogField {
    One(String),
    Many(Vec<String>),
}

impl LogField {
    fn into_lines(self) -> Vec<String> {
        let lines = match self {
            LogField::One(line) => vec![line],
            LogField::Many(lines) => lines,
        };
        lines
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect()
    }
}

/// Raw progress message as sent by the processing service, on either
/// transport. Older status endpoints report `current`/`total` instead of
/// `percent`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMessage {
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub current: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub logs: Option<LogField>,
    #[serde(default)]
    pub signature: Option<bool>,
    #[serde(default, alias = "final_file")]
    pub final_file: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressMessage {
    pub fn normalize(self, markers: &StatusMarkers) -> ProgressUpdate {
        let server_percent = match (self.percent, self.current, self.total) {
            (Some(percent), _, _) => clamp_percent(percent),
            (None, Some(current), Some(total)) if total > 0 => {
                clamp_percent(current as f64 / total as f64 * 100.0)
            }
            _ => 0.0,
        };

        let status = if self.status == markers.done {
            UpdateStatus::Done
        } else if self.status == markers.failed {
            UpdateStatus::Failed(self.error)
        } else {
            UpdateStatus::InProgress(self.status)
        };

        ProgressUpdate {
            server_percent,
            status,
            log_delta: self.logs.map(LogField::into_lines).unwrap_or_default(),
            signature_detected: self.signature,
            final_file: self.final_file.filter(|name| !name.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Carries the server's status line, which may be empty.
    InProgress(String),
    Done,
    Failed(Option<String>),
}

/// Transport-independent progress update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub server_percent: f64,
    pub status: UpdateStatus,
    pub log_delta: Vec<String>,
    pub signature_detected: Option<bool>,
    pub final_file: Option<String>,
}

impl ProgressUpdate {
    pub fn in_progress(server_percent: f64) -> Self {
        Self {
            server_percent,
            status: UpdateStatus::InProgress(String::new()),
            log_delta: Vec::new(),
            signature_detected: None,
            final_file: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, UpdateStatus::Done | UpdateStatus::Failed(_))
    }
}
