use pagepress_core::{format_megabytes, AppViewModel, Profile};

const SIGNATURE_ADVISORY: &str =
    "This document appears to be digitally signed. Optimizing it will invalidate the signature.";

/// Turns view models into console lines, printing each log line and each
/// distinct progress line once.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    logs_printed: usize,
    last_progress: Option<String>,
    last_error: Option<String>,
    advisory_shown: bool,
}

impl ConsoleRenderer {
    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut lines = Vec::new();

        if view.signature_advisory && !self.advisory_shown {
            self.advisory_shown = true;
            lines.push(format!("warning: {SIGNATURE_ADVISORY}"));
        }

        if let Some(progress) = &view.progress {
            for line in progress.log_lines.iter().skip(self.logs_printed) {
                lines.push(format!("  | {line}"));
            }
            self.logs_printed = progress.log_lines.len();

            let mut summary = format!("[{}] {:5.1}%", progress.phase, progress.unified_percent);
            if !progress.status_text.is_empty() {
                summary.push_str("  ");
                summary.push_str(&progress.status_text);
            }
            if self.last_progress.as_ref() != Some(&summary) {
                lines.push(summary.clone());
                self.last_progress = Some(summary);
            }
        } else {
            self.logs_printed = 0;
            self.last_progress = None;
        }

        if view.last_error != self.last_error {
            if let Some(error) = &view.last_error {
                lines.push(format!("error: {error}"));
            }
            self.last_error = view.last_error.clone();
        }
        lines
    }
}

/// Document summary, page assignment and projected size.
pub fn summary_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(document) = &view.document else {
        return lines;
    };
    lines.push(format!(
        "{}: {} pages, {} MB",
        document.name,
        document.page_count,
        format_megabytes(document.original_size_bytes)
    ));
    for (first, last, profile) in page_runs(&view.pages) {
        let pages = if first == last {
            format!("page {}", first + 1)
        } else {
            format!("pages {}-{}", first + 1, last + 1)
        };
        lines.push(format!("  {pages}: {}", profile.label()));
    }
    if let Some(estimate) = &view.estimate {
        lines.push(format!(
            "Estimated size: {} MB (reduction {})",
            estimate.projected_megabytes(),
            estimate.reduction
        ));
    }
    lines
}

/// Groups consecutive pages sharing a profile.
fn page_runs(pages: &[Profile]) -> Vec<(usize, usize, Profile)> {
    let mut runs: Vec<(usize, usize, Profile)> = Vec::new();
    for (index, profile) in pages.iter().copied().enumerate() {
        match runs.last_mut() {
            Some((_, last, current)) if *current == profile => *last = index,
            _ => runs.push((index, index, profile)),
        }
    }
    runs
}
