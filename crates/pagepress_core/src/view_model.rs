use std::path::PathBuf;

use crate::{Estimate, Profile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    pub name: String,
    pub original_size_bytes: u64,
    pub page_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub phase: &'static str,
    /// Position on the 0..=100 scale combining upload and server work.
    pub unified_percent: f64,
    pub status_text: String,
    pub log_lines: Vec<String>,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub document: Option<DocumentView>,
    pub pages: Vec<Profile>,
    pub estimate: Option<Estimate>,
    pub progress: Option<ProgressView>,
    pub signature_advisory: bool,
    pub job_active: bool,
    pub saved_to: Option<PathBuf>,
    pub last_error: Option<String>,
    pub dirty: bool,
}
