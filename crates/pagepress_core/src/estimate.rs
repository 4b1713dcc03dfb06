use std::fmt;

use crate::{Profile, ProfileMultipliers};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Reduction shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Percent(u8),
    /// At least one page is OCR-bound; a percentage would be misleading.
    OcrSentinel,
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reduction::Percent(value) => write!(f, "{value}%"),
            Reduction::OcrSentinel => f.write_str("OCR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub projected_size_bytes: u64,
    pub reduction: Reduction,
}

impl Estimate {
    pub fn projected_megabytes(&self) -> String {
        format_megabytes(self.projected_size_bytes)
    }
}

/// Projects output size from the per-page profile assignment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EstimationEngine {
    multipliers: ProfileMultipliers,
}

impl EstimationEngine {
    pub fn new(multipliers: ProfileMultipliers) -> Self {
        Self { multipliers }
    }

    /// # Panics
    ///
    /// Panics if `profiles` is empty. Page configuration refuses to
    /// initialize with zero pages, so reaching this is a caller bug.
    pub fn estimate(&self, original_size_bytes: u64, profiles: &[Profile]) -> Estimate {
        assert!(
            !profiles.is_empty(),
            "estimation requires at least one configured page"
        );

        let original = original_size_bytes as f64;
        let per_page_weight = original / profiles.len() as f64;
        let projected: f64 = profiles
            .iter()
            .map(|profile| per_page_weight * self.multipliers.for_profile(*profile))
            .sum();

        let reduction = if profiles.iter().any(|profile| profile.is_ocr()) {
            Reduction::OcrSentinel
        } else if original > 0.0 {
            let percent = ((1.0 - projected / original) * 100.0).max(0.0).round();
            Reduction::Percent(percent.min(100.0) as u8)
        } else {
            Reduction::Percent(0)
        };

        Estimate {
            projected_size_bytes: projected.round() as u64,
            reduction,
        }
    }
}

pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_MEGABYTE)
}
