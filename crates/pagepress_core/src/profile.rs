use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Compression-intensity tier assigned to one page.
///
/// The wire code (`1..=6`) follows declaration order and is what the
/// processing service receives in the page map.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Profile {
    Standard,
    LightHq,
    #[default]
    Medium,
    High,
    VeryHigh,
    OcrSplit,
}

impl Profile {
    pub const ALL: [Profile; 6] = [
        Profile::Standard,
        Profile::LightHq,
        Profile::Medium,
        Profile::High,
        Profile::VeryHigh,
        Profile::OcrSplit,
    ];

    pub fn code(self) -> u8 {
        match self {
            Profile::Standard => 1,
            Profile::LightHq => 2,
            Profile::Medium => 3,
            Profile::High => 4,
            Profile::VeryHigh => 5,
            Profile::OcrSplit => 6,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, ConfigError> {
        code.checked_sub(1)
            .and_then(|slot| Self::ALL.get(usize::from(slot)).copied())
            .ok_or_else(|| ConfigError::InvalidProfile(format!("code {code}")))
    }

    pub fn label(self) -> &'static str {
        match self {
            Profile::Standard => "Standard",
            Profile::LightHq => "Light (HQ)",
            Profile::Medium => "Medium (150dpi)",
            Profile::High => "High (72dpi)",
            Profile::VeryHigh => "Very high (50dpi)",
            Profile::OcrSplit => "OCR + split",
        }
    }

    /// Output of this profile goes through OCR, so its size cannot be
    /// expressed as a plain reduction.
    pub fn is_ocr(self) -> bool {
        matches!(self, Profile::OcrSplit)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<u8> for Profile {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<Profile> for u8 {
    fn from(profile: Profile) -> Self {
        profile.code()
    }
}

/// Accepts either the numeric code or a short name such as `very-high`.
impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code);
        }
        match trimmed.to_ascii_lowercase().replace('_', "-").as_str() {
            "standard" => Ok(Profile::Standard),
            "light" | "light-hq" => Ok(Profile::LightHq),
            "medium" => Ok(Profile::Medium),
            "high" => Ok(Profile::High),
            "very-high" => Ok(Profile::VeryHigh),
            "ocr" | "ocr-split" => Ok(Profile::OcrSplit),
            _ => Err(ConfigError::InvalidProfile(trimmed.to_string())),
        }
    }
}
