use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use pagepress_core::{JobId, PolicyConfig, ProgressMessage, UpdateStatus};
use press_logging::{press_debug, press_info, press_warn};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::types::classify_reqwest_error;
use crate::{ChannelError, EngineEvent, FailureKind, ProgressSink, ServiceConfig, TransportKind};

/// Source of raw progress messages for one job.
#[async_trait::async_trait]
pub trait ProgressTransport: Send {
    /// Waits for the next message. `Ok(None)` means the server ended the
    /// channel.
    async fn next_message(&mut self) -> Result<Option<ProgressMessage>, ChannelError>;
}

/// Fetches the status endpoint on a fixed interval. Repeated identical
/// answers are passed through unchanged.
pub struct PollTransport {
    client: reqwest::Client,
    url: Url,
    ticker: Interval,
}

impl PollTransport {
    /// Must be called from within a tokio runtime.
    pub fn new(client: reqwest::Client, url: Url, interval: Duration) -> Self {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            client,
            url,
            ticker,
        }
    }
}

#[async_trait::async_trait]
impl ProgressTransport for PollTransport {
    async fn next_message(&mut self) -> Result<Option<ProgressMessage>, ChannelError> {
        self.ticker.tick().await;
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| ChannelError::new(classify_reqwest_error(&err), err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let raw = response
            .bytes()
            .await
            .map_err(|err| ChannelError::new(classify_reqwest_error(&err), err.to_string()))?;
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|err| ChannelError::new(FailureKind::InvalidResponse, err.to_string()))
    }
}

/// Reads one long-lived response carrying one JSON message per line.
/// Server-sent-event framing (`data:` lines, `:` comments) is accepted too.
pub struct PushTransport {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: Vec<u8>,
    pending: VecDeque<ProgressMessage>,
    finished: bool,
}

impl PushTransport {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            body: response.bytes_stream().boxed(),
            buffer: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn drain_lines(&mut self) {
        while let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            self.pending.extend(parse_line(&line));
        }
    }
}

#[async_trait::async_trait]
impl ProgressTransport for PushTransport {
    async fn next_message(&mut self) -> Result<Option<ProgressMessage>, ChannelError> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Ok(Some(message));
            }
            if self.finished {
                return Ok(None);
            }
            match self.body.next().await {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    self.drain_lines();
                }
                Some(Err(err)) => {
                    return Err(ChannelError::new(
                        classify_reqwest_error(&err),
                        err.to_string(),
                    ))
                }
                None => {
                    self.finished = true;
                    let rest = std::mem::take(&mut self.buffer);
                    self.pending.extend(parse_line(&rest));
                }
            }
        }
    }
}

/// Parses one framed line. Blank lines, comments and non-data SSE fields
/// yield nothing; malformed payloads are skipped.
pub(crate) fn parse_line(raw: &[u8]) -> Option<ProgressMessage> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text.trim(),
        Err(err) => {
            press_warn!("Skipping non-UTF-8 progress line: {}", err);
            return None;
        }
    };
    if text.is_empty() || text.starts_with(':') {
        return None;
    }
    let payload = match text.strip_prefix("data:") {
        Some(rest) => rest.trim_start(),
        None if text.starts_with('{') => text,
        None => return None,
    };
    match serde_json::from_str(payload) {
        Ok(message) => Some(message),
        Err(err) => {
            press_warn!("Skipping malformed progress line: {}", err);
            None
        }
    }
}

/// Drives one job's progress channel, whichever transport the service uses.
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    config: ServiceConfig,
    policy: PolicyConfig,
}

impl ProgressChannel {
    pub fn new(config: ServiceConfig, policy: PolicyConfig) -> Self {
        Self { config, policy }
    }

    pub async fn open(&self, job_id: &str) -> Result<Box<dyn ProgressTransport>, ChannelError> {
        match self.config.transport {
            TransportKind::Poll => {
                let url = self
                    .config
                    .status_url(job_id)
                    .map_err(|err| ChannelError::new(FailureKind::InvalidUrl, err))?;
                let client = reqwest::Client::builder()
                    .connect_timeout(self.config.connect_timeout())
                    .timeout(self.config.request_timeout())
                    .build()
                    .map_err(|err| ChannelError::new(FailureKind::Network, err.to_string()))?;
                Ok(Box::new(PollTransport::new(
                    client,
                    url,
                    self.policy.poll_interval(),
                )))
            }
            TransportKind::Push => {
                let url = self
                    .config
                    .stream_url(job_id)
                    .map_err(|err| ChannelError::new(FailureKind::InvalidUrl, err))?;
                let client = reqwest::Client::builder()
                    .connect_timeout(self.config.connect_timeout())
                    .build()
                    .map_err(|err| ChannelError::new(FailureKind::Network, err.to_string()))?;
                let response = client.get(url).send().await.map_err(|err| {
                    ChannelError::new(classify_reqwest_error(&err), err.to_string())
                })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ChannelError::new(
                        FailureKind::HttpStatus(status.as_u16()),
                        status.to_string(),
                    ));
                }
                Ok(Box::new(PushTransport::new(response)))
            }
        }
    }

    /// Opens the channel and relays normalized updates until a terminal
    /// status, a channel failure or cancellation. Nothing is emitted after
    /// cancellation.
    pub async fn run(&self, job_id: JobId, cancel: CancellationToken, sink: &dyn ProgressSink) {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            opened = self.open(&job_id) => opened,
        };
        let transport = match opened {
            Ok(transport) => transport,
            Err(error) => {
                press_warn!("Job {}: could not open progress channel: {}", job_id, error);
                sink.emit(EngineEvent::ChannelFailed { job_id, error });
                return;
            }
        };
        press_info!("Job {}: progress channel open", job_id);
        sink.emit(EngineEvent::ChannelOpened {
            job_id: job_id.clone(),
        });
        self.pump(transport, job_id, cancel, sink).await;
    }

    /// Relays messages until a terminal status. The channel counts as
    /// stalled once `stale_after` passes without progress: a changed
    /// percent or status, or new log lines. Identical answers are relayed
    /// but do not reset the clock.
    pub async fn pump(
        &self,
        mut transport: Box<dyn ProgressTransport>,
        job_id: JobId,
        cancel: CancellationToken,
        sink: &dyn ProgressSink,
    ) {
        let stale_after = self.policy.stale_after();
        let mut deadline = Instant::now() + stale_after;
        let mut last: Option<(f64, UpdateStatus)> = None;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    press_debug!("Job {}: progress channel closed", job_id);
                    return;
                }
                next = tokio::time::timeout_at(deadline, transport.next_message()) => next,
            };

            let error = match next {
                Ok(Ok(Some(message))) => {
                    let update = message.normalize(&self.policy.status);
                    let terminal = update.is_terminal();
                    let seen = (update.server_percent, update.status.clone());
                    if !update.log_delta.is_empty() || last.as_ref() != Some(&seen) {
                        deadline = Instant::now() + stale_after;
                        last = Some(seen);
                    }
                    sink.emit(EngineEvent::Progress {
                        job_id: job_id.clone(),
                        update,
                    });
                    if terminal {
                        press_debug!("Job {}: terminal status received", job_id);
                        return;
                    }
                    continue;
                }
                Ok(Ok(None)) => ChannelError::new(
                    FailureKind::Closed,
                    "channel ended before a terminal status",
                ),
                Ok(Err(error)) => error,
                Err(_) => ChannelError::new(
                    FailureKind::Stalled,
                    format!("no progress within {stale_after:?}"),
                ),
            };
            press_warn!("Job {}: {}", job_id, error);
            sink.emit(EngineEvent::ChannelFailed { job_id, error });
            return;
        }
    }
}
