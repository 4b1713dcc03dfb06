use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use pagepress_core::{ConfigSnapshot, UploadId};
use press_logging::{press_info, press_warn};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::types::classify_reqwest_error;
use crate::{EngineEvent, FailureKind, JobHandle, ProgressSink, ServiceConfig, SubmissionError};

const FILE_FIELD: &str = "pdf";
const CONFIG_FIELD: &str = "config_map";
const JOB_ID_KEYS: [&str; 3] = ["job_id", "jobId", "task_id"];

/// Everything sent to create one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub upload_id: UploadId,
    pub file_name: String,
    pub bytes: Bytes,
    pub snapshot: ConfigSnapshot,
}

#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    /// Uploads the document and page map. Emits `UploadProgress` events
    /// while the body is transferred. Never retries.
    async fn submit(
        &self,
        request: SubmitRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<JobHandle, SubmissionError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestSubmitter {
    config: ServiceConfig,
}

impl ReqwestSubmitter {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    fn build_client(&self) -> Result<reqwest::Client, SubmissionError> {
        reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout())
            .timeout(self.config.request_timeout())
            .build()
            .map_err(|err| SubmissionError::new(FailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Submitter for ReqwestSubmitter {
    async fn submit(
        &self,
        request: SubmitRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<JobHandle, SubmissionError> {
        let url = self
            .config
            .submit_url()
            .map_err(|err| SubmissionError::new(FailureKind::InvalidUrl, err))?;
        let client = self.build_client()?;

        let total = request.bytes.len() as u64;
        let upload_id = request.upload_id;
        sink.emit(EngineEvent::UploadProgress {
            upload_id,
            sent: 0,
            total,
        });
        let body = upload_body(upload_id, request.bytes, self.config.upload_chunk_bytes, sink);
        let file_part = Part::stream_with_length(body, total)
            .file_name(request.file_name.clone())
            .mime_str("application/pdf")
            .map_err(|err| SubmissionError::new(FailureKind::InvalidResponse, err.to_string()))?;
        let form = Form::new()
            .text(CONFIG_FIELD, request.snapshot.to_json())
            .part(FILE_FIELD, file_part);

        press_info!(
            "Uploading {} ({} bytes, {} pages) to {}",
            request.file_name,
            total,
            request.snapshot.len(),
            url
        );
        let response = client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| SubmissionError::new(classify_reqwest_error(&err), err.to_string()))?;

        let status = response.status();
        let raw = response
            .bytes()
            .await
            .map_err(|err| SubmissionError::new(classify_reqwest_error(&err), err.to_string()))?;
        let body: Option<Value> = serde_json::from_slice(&raw).ok();

        if !status.is_success() {
            let reason = body
                .as_ref()
                .and_then(server_reason)
                .unwrap_or_else(|| format!("server responded with {status}"));
            press_warn!("Submission refused ({}): {}", status, reason);
            return Err(SubmissionError::new(
                FailureKind::HttpStatus(status.as_u16()),
                reason,
            ));
        }

        let body = body.ok_or_else(|| {
            SubmissionError::new(FailureKind::InvalidResponse, "response is not JSON")
        })?;
        match job_id(&body) {
            Some(id) => {
                press_info!("Job {} created", id);
                Ok(JobHandle { id })
            }
            None => Err(SubmissionError::new(
                FailureKind::InvalidResponse,
                server_reason(&body).unwrap_or_else(|| "response carries no job id".to_string()),
            )),
        }
    }
}

fn upload_body(
    upload_id: UploadId,
    bytes: Bytes,
    chunk_size: usize,
    sink: Arc<dyn ProgressSink>,
) -> reqwest::Body {
    let total = bytes.len() as u64;
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(chunk_size)
        .map(|start| bytes.slice(start..(start + chunk_size).min(bytes.len())))
        .collect();

    let mut sent = 0u64;
    let stream = futures_util::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        sink.emit(EngineEvent::UploadProgress {
            upload_id,
            sent,
            total,
        });
        Ok::<Bytes, std::io::Error>(chunk)
    });
    reqwest::Body::wrap_stream(stream)
}

fn job_id(body: &Value) -> Option<String> {
    JOB_ID_KEYS
        .iter()
        .find_map(|key| match body.get(*key)? {
            Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
}

fn server_reason(body: &Value) -> Option<String> {
    body.get("error")?.as_str().map(ToOwned::to_owned)
}
