use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Profile};

/// Fraction of each page's average weight retained, per profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileMultipliers {
    pub standard: f64,
    pub light_hq: f64,
    pub medium: f64,
    pub high: f64,
    pub very_high: f64,
    pub ocr_split: f64,
}

impl Default for ProfileMultipliers {
    fn default() -> Self {
        Self {
            standard: 0.98,
            light_hq: 0.85,
            medium: 0.60,
            high: 0.25,
            very_high: 0.15,
            ocr_split: 0.10,
        }
    }
}

impl ProfileMultipliers {
    pub fn for_profile(&self, profile: Profile) -> f64 {
        match profile {
            Profile::Standard => self.standard,
            Profile::LightHq => self.light_hq,
            Profile::Medium => self.medium,
            Profile::High => self.high,
            Profile::VeryHigh => self.very_high,
            Profile::OcrSplit => self.ocr_split,
        }
    }
}

/// Status strings the processing service uses on the progress channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusMarkers {
    pub in_progress: String,
    pub done: String,
    pub failed: String,
}

impl Default for StatusMarkers {
    fn default() -> Self {
        Self {
            in_progress: "processing".to_string(),
            done: "done".to_string(),
            failed: "processing-failed".to_string(),
        }
    }
}

/// Tunable policy constants shared by estimation, progress fusion and the
/// session guard. Durations are stored in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub multipliers: ProfileMultipliers,
    /// Share of the unified progress scale owned by the upload phase.
    /// The server phase always owns the remainder.
    pub upload_share: f64,
    /// Whether users may pick [`Profile::OcrSplit`].
    pub ocr_selectable: bool,
    pub status: StatusMarkers,
    pub poll_interval_ms: u64,
    pub download_grace_ms: u64,
    /// No progress on the channel for this long fails the job. Repeated
    /// identical answers do not count as progress.
    pub stale_after_ms: u64,
    pub exit_warning: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            multipliers: ProfileMultipliers::default(),
            upload_share: 0.20,
            ocr_selectable: true,
            status: StatusMarkers::default(),
            poll_interval_ms: 800,
            download_grace_ms: 1_000,
            stale_after_ms: 120_000,
            exit_warning: "A document is still being processed. Leaving now abandons the job."
                .to_string(),
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.upload_share) {
            return Err(ConfigError::InvalidPolicy(format!(
                "upload_share must be within [0, 1], got {}",
                self.upload_share
            )));
        }
        for profile in Profile::ALL {
            let value = self.multipliers.for_profile(profile);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidPolicy(format!(
                    "multiplier for {profile} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPolicy(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn server_share(&self) -> f64 {
        1.0 - self.upload_share
    }

    /// Maps upload-transfer progress (0..=100) onto the unified scale.
    pub fn unified_from_upload(&self, upload_percent: f64) -> f64 {
        clamp_percent(upload_percent) * self.upload_share
    }

    /// Maps server-reported progress (0..=100) onto the unified scale,
    /// assuming the upload has finished.
    pub fn unified_from_server(&self, server_percent: f64) -> f64 {
        self.upload_share * 100.0 + clamp_percent(server_percent) * self.server_share()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn download_grace(&self) -> Duration {
        Duration::from_millis(self.download_grace_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}

pub(crate) fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
