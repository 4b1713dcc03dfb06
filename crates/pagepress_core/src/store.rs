use std::collections::BTreeMap;

use press_logging::{press_info, press_warn};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Profile};

/// Per-page profile assignment for the loaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfigStore {
    pages: Option<Vec<Profile>>,
    ocr_selectable: bool,
}

impl Default for PageConfigStore {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PageConfigStore {
    pub fn new(ocr_selectable: bool) -> Self {
        Self {
            pages: None,
            ocr_selectable,
        }
    }

    /// Rebuilds a store from a snapshot whose keys must be exactly `0..n`.
    pub fn from_snapshot(
        snapshot: &ConfigSnapshot,
        ocr_selectable: bool,
    ) -> Result<Self, ConfigError> {
        let mut store = Self::new(ocr_selectable);
        store.initialize(snapshot.len())?;
        for (index, profile) in snapshot.iter() {
            store.set_profile(index, profile)?;
        }
        Ok(store)
    }

    /// Creates `page_count` entries, each on the default profile.
    pub fn initialize(&mut self, page_count: usize) -> Result<(), ConfigError> {
        if page_count == 0 {
            return Err(ConfigError::InvalidDocument);
        }
        self.pages = Some(vec![Profile::default(); page_count]);
        press_info!("Page configuration initialized for {} pages", page_count);
        Ok(())
    }

    pub fn set_profile(&mut self, index: usize, profile: Profile) -> Result<(), ConfigError> {
        self.check_selectable(profile)?;
        let pages = self.pages.as_mut().ok_or(ConfigError::NotInitialized)?;
        let page_count = pages.len();
        let slot = pages
            .get_mut(index)
            .ok_or(ConfigError::IndexOutOfRange { index, page_count })?;
        *slot = profile;
        Ok(())
    }

    pub fn set_profile_code(&mut self, index: usize, code: u8) -> Result<(), ConfigError> {
        self.set_profile(index, Profile::from_code(code)?)
    }

    /// Overwrites every page. Validation happens before any entry changes.
    pub fn set_all_profiles(&mut self, profile: Profile) -> Result<(), ConfigError> {
        self.check_selectable(profile)?;
        let pages = self.pages.as_mut().ok_or(ConfigError::NotInitialized)?;
        pages.fill(profile);
        press_info!("Applied {} to all {} pages", profile, pages.len());
        Ok(())
    }

    pub fn set_all_profile_codes(&mut self, code: u8) -> Result<(), ConfigError> {
        self.set_all_profiles(Profile::from_code(code)?)
    }

    pub fn snapshot(&self) -> Result<ConfigSnapshot, ConfigError> {
        let pages = self.pages.as_ref().ok_or(ConfigError::NotInitialized)?;
        Ok(ConfigSnapshot(pages.iter().copied().enumerate().collect()))
    }

    pub fn clear(&mut self) {
        self.pages = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.pages.is_some()
    }

    pub fn page_count(&self) -> Option<usize> {
        self.pages.as_ref().map(Vec::len)
    }

    pub fn profile(&self, index: usize) -> Option<Profile> {
        self.pages.as_ref()?.get(index).copied()
    }

    /// Profiles in page order; empty when not initialized.
    pub fn profiles(&self) -> &[Profile] {
        self.pages.as_deref().unwrap_or(&[])
    }

    pub fn uses_ocr(&self) -> bool {
        self.profiles().iter().any(|profile| profile.is_ocr())
    }

    pub fn ocr_selectable(&self) -> bool {
        self.ocr_selectable
    }

    fn check_selectable(&self, profile: Profile) -> Result<(), ConfigError> {
        if profile.is_ocr() && !self.ocr_selectable {
            press_warn!("Rejected {}: OCR profile is not enabled", profile);
            return Err(ConfigError::InvalidProfile(format!(
                "{profile} is not enabled"
            )));
        }
        Ok(())
    }
}

/// Immutable index → profile mapping, serialized as `{"0": 3, "1": 4}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSnapshot(BTreeMap<usize, Profile>);

impl ConfigSnapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Profile> {
        self.0.get(&index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Profile)> + '_ {
        self.0.iter().map(|(index, profile)| (*index, *profile))
    }

    /// The JSON page map sent to the processing service.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
