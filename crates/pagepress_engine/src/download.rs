use std::path::{Path, PathBuf};

use press_logging::{press_error, press_info};

use crate::filename::result_file_name;
use crate::persist::ResultWriter;
use crate::types::classify_reqwest_error;
use crate::{DownloadError, FailureKind, ServiceConfig};

#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Fetches the processed file and saves it under `output_dir`.
    async fn download(
        &self,
        job_id: &str,
        server_name: Option<&str>,
        original_name: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestDownloader {
    config: ServiceConfig,
}

impl ReqwestDownloader {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl Downloader for ReqwestDownloader {
    async fn download(
        &self,
        job_id: &str,
        server_name: Option<&str>,
        original_name: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        // The service addresses results by the name it was uploaded under
        // unless it announced a different one.
        let remote_name = server_name.unwrap_or(original_name);
        let url = self
            .config
            .download_url(job_id, remote_name)
            .map_err(|err| DownloadError::new(FailureKind::InvalidUrl, err))?;
        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout())
            .timeout(self.config.request_timeout())
            .build()
            .map_err(|err| DownloadError::new(FailureKind::Network, err.to_string()))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|err| DownloadError::new(classify_reqwest_error(&err), err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let content = response
            .bytes()
            .await
            .map_err(|err| DownloadError::new(classify_reqwest_error(&err), err.to_string()))?;

        let file_name = result_file_name(server_name, original_name, job_id);
        match ResultWriter::new(output_dir).save(&file_name, &content) {
            Ok(path) => {
                press_info!("Job {}: saved {} bytes to {:?}", job_id, content.len(), path);
                Ok(path)
            }
            Err(err) => {
                press_error!("Job {}: could not save result: {}", job_id, err);
                Err(DownloadError::new(FailureKind::Io, err.to_string()))
            }
        }
    }
}
