use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use pagepress_core::{JobId, PolicyConfig};
use press_logging::{press_debug, press_info};
use tokio_util::sync::CancellationToken;

use crate::inspect::detect_signature;
use crate::sink::ChannelProgressSink;
use crate::{
    Downloader, EngineEvent, ProgressChannel, ProgressSink, ReqwestDownloader, ReqwestSubmitter,
    ServiceConfig, SubmitRequest, Submitter,
};

/// Everything the engine needs to talk to the processing service.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub service: ServiceConfig,
    pub policy: PolicyConfig,
    pub output_dir: PathBuf,
}

enum EngineCommand {
    Submit(SubmitRequest),
    CancelUpload,
    OpenChannel {
        job_id: JobId,
    },
    CloseChannel {
        job_id: JobId,
    },
    Download {
        job_id: JobId,
        server_name: Option<String>,
        original_name: String,
    },
    CheckSignature {
        bytes: Bytes,
    },
}

/// Runs IO on a background tokio runtime. Commands go in, `EngineEvent`s
/// come out in the order they happen.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let submitter = Arc::new(ReqwestSubmitter::new(config.service.clone()));
        let downloader = Arc::new(ReqwestDownloader::new(config.service.clone()));
        Self::with_parts(config, submitter, downloader)
    }

    pub fn with_parts(
        config: EngineConfig,
        submitter: Arc<dyn Submitter>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn ProgressSink> = Arc::new(ChannelProgressSink::new(event_tx));
        let channel = Arc::new(ProgressChannel::new(
            config.service.clone(),
            config.policy.clone(),
        ));
        let output_dir = Arc::new(config.output_dir);

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let mut upload: Option<CancellationToken> = None;
            let mut channels: HashMap<JobId, CancellationToken> = HashMap::new();

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Submit(request) => {
                        let token = CancellationToken::new();
                        if let Some(previous) = upload.replace(token.clone()) {
                            previous.cancel();
                        }
                        let submitter = submitter.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            tokio::select! {
                                biased;
                                _ = token.cancelled() => {
                                    press_info!("Upload of {} cancelled", request.file_name);
                                }
                                result = submitter.submit(request.clone(), sink.clone()) => {
                                    sink.emit(EngineEvent::Submitted {
                                        upload_id: request.upload_id,
                                        result,
                                    });
                                }
                            }
                        });
                    }
                    EngineCommand::CancelUpload => {
                        if let Some(token) = upload.take() {
                            token.cancel();
                        }
                    }
                    EngineCommand::OpenChannel { job_id } => {
                        upload = None;
                        let token = CancellationToken::new();
                        if let Some(previous) = channels.insert(job_id.clone(), token.clone()) {
                            previous.cancel();
                        }
                        let channel = channel.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            channel.run(job_id, token, sink.as_ref()).await;
                        });
                    }
                    EngineCommand::CloseChannel { job_id } => {
                        if let Some(token) = channels.remove(&job_id) {
                            token.cancel();
                        }
                    }
                    EngineCommand::Download {
                        job_id,
                        server_name,
                        original_name,
                    } => {
                        let downloader = downloader.clone();
                        let sink = sink.clone();
                        let output_dir = output_dir.clone();
                        runtime.spawn(async move {
                            let result = downloader
                                .download(
                                    &job_id,
                                    server_name.as_deref(),
                                    &original_name,
                                    &output_dir,
                                )
                                .await;
                            sink.emit(EngineEvent::Downloaded { job_id, result });
                        });
                    }
                    EngineCommand::CheckSignature { bytes } => {
                        let sink = sink.clone();
                        runtime.spawn_blocking(move || match detect_signature(&bytes) {
                            Ok(detected) => sink.emit(EngineEvent::SignatureChecked { detected }),
                            Err(err) => press_debug!("Signature pre-check skipped: {}", err),
                        });
                    }
                }
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit(&self, request: SubmitRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit(request));
    }

    pub fn cancel_upload(&self) {
        let _ = self.cmd_tx.send(EngineCommand::CancelUpload);
    }

    pub fn open_channel(&self, job_id: impl Into<JobId>) {
        let _ = self.cmd_tx.send(EngineCommand::OpenChannel {
            job_id: job_id.into(),
        });
    }

    pub fn close_channel(&self, job_id: impl Into<JobId>) {
        let _ = self.cmd_tx.send(EngineCommand::CloseChannel {
            job_id: job_id.into(),
        });
    }

    pub fn download(
        &self,
        job_id: impl Into<JobId>,
        server_name: Option<String>,
        original_name: impl Into<String>,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::Download {
            job_id: job_id.into(),
            server_name,
            original_name: original_name.into(),
        });
    }

    pub fn check_signature(&self, bytes: Bytes) {
        let _ = self.cmd_tx.send(EngineCommand::CheckSignature { bytes });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}
