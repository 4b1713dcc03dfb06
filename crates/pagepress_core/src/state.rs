use std::path::PathBuf;

use crate::view_model::{AppViewModel, DocumentView, ProgressView};
use crate::{
    ConfigError, Document, Estimate, EstimationEngine, Job, PageConfigStore, PolicyConfig,
    SessionGuard, UploadId,
};

/// Whole client session: document, page configuration, the active job and
/// the exit guard. Nothing here is shared between sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    policy: PolicyConfig,
    engine: EstimationEngine,
    document: Option<Document>,
    store: PageConfigStore,
    estimate: Option<Estimate>,
    upload_percent: Option<f64>,
    upload_seq: UploadId,
    current_upload: Option<UploadId>,
    job: Option<Job>,
    pub(crate) guard: SessionGuard,
    saved_to: Option<PathBuf>,
    last_error: Option<String>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_policy(PolicyConfig::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: PolicyConfig) -> Self {
        Self {
            engine: EstimationEngine::new(policy.multipliers.clone()),
            store: PageConfigStore::new(policy.ocr_selectable),
            guard: SessionGuard::new(policy.download_grace(), policy.exit_warning.clone()),
            policy,
            document: None,
            estimate: None,
            upload_percent: None,
            upload_seq: 0,
            current_upload: None,
            job: None,
            saved_to: None,
            last_error: None,
            dirty: false,
        }
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn store(&self) -> &PageConfigStore {
        &self.store
    }

    pub fn estimate(&self) -> Option<Estimate> {
        self.estimate
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    pub fn is_job_active(&self) -> bool {
        self.guard.is_job_active()
    }

    pub fn guard_exit(&self) -> Option<&str> {
        self.guard.guard_exit()
    }

    pub fn view(&self) -> AppViewModel {
        let progress = match (&self.job, self.upload_percent) {
            (Some(job), _) => Some(ProgressView {
                phase: job.phase.label(),
                unified_percent: job.unified_percent(&self.policy),
                status_text: job.status_text.clone(),
                log_lines: job.log_lines.clone(),
                failure: job.failure().map(ToString::to_string),
            }),
            (None, Some(upload)) => Some(ProgressView {
                phase: "Uploading",
                unified_percent: self.policy.unified_from_upload(upload),
                status_text: String::new(),
                log_lines: Vec::new(),
                failure: None,
            }),
            (None, None) => None,
        };

        AppViewModel {
            document: self.document.as_ref().map(|document| DocumentView {
                name: document.name.clone(),
                original_size_bytes: document.original_size_bytes,
                page_count: document.page_count,
            }),
            pages: self.store.profiles().to_vec(),
            estimate: self.estimate,
            progress,
            signature_advisory: self
                .document
                .as_ref()
                .is_some_and(|document| document.signature.is_present()),
            job_active: self.guard.is_job_active(),
            saved_to: self.saved_to.clone(),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the view changed since the last call, then resets it.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn load_document(&mut self, document: Document) -> Result<(), ConfigError> {
        let mut store = PageConfigStore::new(self.policy.ocr_selectable);
        store.initialize(document.page_count)?;
        self.store = store;
        self.document = Some(document);
        self.job = None;
        self.upload_percent = None;
        self.current_upload = None;
        self.saved_to = None;
        self.last_error = None;
        self.recompute_estimate();
        self.mark_dirty();
        Ok(())
    }

    /// Applies a store mutation and refreshes the estimate before returning.
    pub(crate) fn mutate_store(
        &mut self,
        mutation: impl FnOnce(&mut PageConfigStore) -> Result<(), ConfigError>,
    ) -> Result<(), ConfigError> {
        mutation(&mut self.store)?;
        self.recompute_estimate();
        self.mark_dirty();
        Ok(())
    }

    fn recompute_estimate(&mut self) {
        self.estimate = match (&self.document, self.store.is_initialized()) {
            (Some(document), true) => Some(
                self.engine
                    .estimate(document.original_size_bytes, self.store.profiles()),
            ),
            _ => None,
        };
    }

    pub(crate) fn observe_signature(&mut self, detected: bool) {
        if let Some(document) = self.document.as_mut() {
            let next = document.signature.observe(detected);
            if next != document.signature {
                document.signature = next;
                self.mark_dirty();
            }
        }
    }

    /// Starts a new submission and returns its id. Ids are never reused
    /// within a session, even across resets.
    pub(crate) fn begin_upload(&mut self) -> UploadId {
        self.upload_seq += 1;
        self.current_upload = Some(self.upload_seq);
        self.upload_percent = Some(0.0);
        self.job = None;
        self.saved_to = None;
        self.last_error = None;
        self.guard.upload_started();
        self.mark_dirty();
        self.upload_seq
    }

    pub(crate) fn set_upload_progress(&mut self, sent: u64, total: u64) {
        let percent = if total == 0 {
            100.0
        } else {
            (sent as f64 / total as f64 * 100.0).min(100.0)
        };
        self.upload_percent = Some(percent);
        self.mark_dirty();
    }

    pub(crate) fn is_uploading(&self) -> bool {
        self.current_upload.is_some()
    }

    /// True only for replies to the submission still in flight.
    pub(crate) fn is_current_upload(&self, upload_id: UploadId) -> bool {
        self.current_upload == Some(upload_id)
    }

    pub(crate) fn start_job(&mut self, job: Job) {
        self.upload_percent = None;
        self.current_upload = None;
        self.job = Some(job);
        self.guard.job_started();
        self.mark_dirty();
    }

    pub(crate) fn end_upload(&mut self) {
        self.upload_percent = None;
        self.current_upload = None;
        self.guard.job_ended();
        self.mark_dirty();
    }

    pub(crate) fn job_mut(&mut self, job_id: &str) -> Option<&mut Job> {
        self.job.as_mut().filter(|job| job.id == job_id)
    }

    pub(crate) fn set_saved_to(&mut self, path: PathBuf) {
        self.saved_to = Some(path);
        self.mark_dirty();
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.mark_dirty();
    }

    /// Clears document, page configuration and job.
    pub(crate) fn reset(&mut self) {
        self.document = None;
        self.store.clear();
        self.estimate = None;
        self.upload_percent = None;
        self.current_upload = None;
        self.job = None;
        self.saved_to = None;
        self.last_error = None;
        self.guard.job_ended();
        self.mark_dirty();
    }
}
