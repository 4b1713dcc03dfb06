use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

const JOB_PLACEHOLDER: &str = "{job}";
const FILE_PLACEHOLDER: &str = "{file}";

/// How progress reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Fixed-interval requests against the status endpoint.
    #[default]
    Poll,
    /// One long-lived response streaming a message per line.
    Push,
}

/// Where the processing service lives and how to talk to it. Paths may
/// contain `{job}` and `{file}` placeholders, each filling one path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub submit_path: String,
    pub status_path: String,
    pub stream_path: String,
    pub download_path: String,
    pub transport: TransportKind,
    pub connect_timeout_ms: u64,
    /// Applies to single request/response exchanges; the push stream only
    /// uses the connect timeout and the policy's staleness window.
    pub request_timeout_ms: u64,
    pub upload_chunk_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            submit_path: "/processar".to_string(),
            status_path: "/status/{job}".to_string(),
            stream_path: "/progress/{job}".to_string(),
            download_path: "/download/{job}/{file}".to_string(),
            transport: TransportKind::Poll,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 300_000,
            upload_chunk_bytes: 64 * 1024,
        }
    }
}

impl ServiceConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn submit_url(&self) -> Result<Url, String> {
        self.endpoint(&self.submit_path, "", "")
    }

    pub fn status_url(&self, job_id: &str) -> Result<Url, String> {
        self.endpoint(&self.status_path, job_id, "")
    }

    pub fn stream_url(&self, job_id: &str) -> Result<Url, String> {
        self.endpoint(&self.stream_path, job_id, "")
    }

    pub fn download_url(&self, job_id: &str, file_name: &str) -> Result<Url, String> {
        self.endpoint(&self.download_path, job_id, file_name)
    }

    fn endpoint(&self, template: &str, job_id: &str, file_name: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url).map_err(|err| err.to_string())?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| format!("{} cannot be a base url", self.base_url))?;
            segments.pop_if_empty();
            for raw in template.split('/').filter(|segment| !segment.is_empty()) {
                let segment = match raw {
                    JOB_PLACEHOLDER => job_id,
                    FILE_PLACEHOLDER => file_name,
                    literal => literal,
                };
                if !segment.is_empty() {
                    segments.push(segment);
                }
            }
        }
        Ok(url)
    }
}
