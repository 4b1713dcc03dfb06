use std::time::Instant;

use bytes::Bytes;
use pagepress_core::{Effect, Msg};
use pagepress_engine::{EngineConfig, EngineEvent, EngineHandle, SubmitRequest};
use press_logging::{press_debug, press_info, press_warn};

/// Effects the engine cannot execute; the session loop answers them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    ConfirmClear { warning: String },
    ConfirmExit { warning: String },
    Exit,
}

/// Executes core effects on the engine and turns engine events back into
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
    file_name: String,
    bytes: Bytes,
    downloads_pending: usize,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, file_name: String, bytes: Bytes) -> Self {
        Self {
            engine: EngineHandle::new(config),
            file_name,
            bytes,
            downloads_pending: 0,
        }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) -> Vec<HostRequest> {
        let mut requests = Vec::new();
        for effect in effects {
            match effect {
                Effect::CheckSignature => {
                    self.engine.check_signature(self.bytes.clone());
                }
                Effect::SubmitJob {
                    upload_id,
                    snapshot,
                } => {
                    press_info!(
                        "SubmitJob upload={} file={} bytes={} pages={}",
                        upload_id,
                        self.file_name,
                        self.bytes.len(),
                        snapshot.len()
                    );
                    self.engine.submit(SubmitRequest {
                        upload_id,
                        file_name: self.file_name.clone(),
                        bytes: self.bytes.clone(),
                        snapshot,
                    });
                }
                Effect::CancelUpload => self.engine.cancel_upload(),
                Effect::OpenChannel { job_id } => self.engine.open_channel(job_id),
                Effect::CloseChannel { job_id } => self.engine.close_channel(job_id),
                Effect::Download { job_id, file_name } => {
                    self.downloads_pending += 1;
                    self.engine.download(job_id, file_name, self.file_name.clone());
                }
                Effect::ConfirmClear { warning } => {
                    requests.push(HostRequest::ConfirmClear { warning });
                }
                Effect::ConfirmExit { warning } => {
                    requests.push(HostRequest::ConfirmExit { warning });
                }
                Effect::Exit => requests.push(HostRequest::Exit),
            }
        }
        requests
    }

    /// Drains events reported since the last call.
    pub fn poll(&mut self) -> Vec<Msg> {
        let mut inbox = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            if matches!(event, EngineEvent::Downloaded { .. }) {
                self.downloads_pending = self.downloads_pending.saturating_sub(1);
            }
            inbox.push(map_event(event, Instant::now()));
        }
        inbox
    }

    pub fn download_pending(&self) -> bool {
        self.downloads_pending > 0
    }
}

pub fn map_event(event: EngineEvent, now: Instant) -> Msg {
    match event {
        EngineEvent::UploadProgress {
            upload_id,
            sent,
            total,
        } => Msg::UploadProgress {
            upload_id,
            sent,
            total,
        },
        EngineEvent::Submitted { upload_id, result } => match result {
            Ok(handle) => Msg::SubmitSucceeded {
                upload_id,
                job_id: handle.id,
            },
            Err(err) => {
                press_warn!("Submission failed ({}): {}", err.kind, err);
                Msg::SubmitFailed {
                    upload_id,
                    reason: err.to_string(),
                }
            }
        },
        EngineEvent::ChannelOpened { job_id } => Msg::ChannelOpened { job_id },
        EngineEvent::Progress { job_id, update } => Msg::ProgressReceived {
            job_id,
            update,
            at: now,
        },
        EngineEvent::ChannelFailed { job_id, error } => Msg::ChannelFailed {
            job_id,
            reason: error.into_failure_reason(),
        },
        EngineEvent::Downloaded { job_id, result } => match result {
            Ok(path) => Msg::DownloadFinished { job_id, path },
            Err(err) => Msg::DownloadFailed {
                job_id,
                reason: err.to_string(),
            },
        },
        EngineEvent::SignatureChecked { detected } => {
            press_debug!("Signature pre-check result: {}", detected);
            Msg::SignatureChecked { detected }
        }
    }
}
