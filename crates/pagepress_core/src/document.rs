use crate::ConfigError;

/// Tri-state result of digital-signature detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureState {
    #[default]
    Unknown,
    Absent,
    Present,
}

impl SignatureState {
    /// Folds a new observation into the flag. `Present` is sticky.
    pub fn observe(self, detected: bool) -> Self {
        match (self, detected) {
            (SignatureState::Present, _) | (_, true) => SignatureState::Present,
            (_, false) => SignatureState::Absent,
        }
    }

    pub fn is_present(self) -> bool {
        self == SignatureState::Present
    }
}

/// The currently selected input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub original_size_bytes: u64,
    pub page_count: usize,
    pub signature: SignatureState,
}

impl Document {
    pub fn new(
        name: impl Into<String>,
        original_size_bytes: u64,
        page_count: usize,
    ) -> Result<Self, ConfigError> {
        if page_count == 0 || original_size_bytes == 0 {
            return Err(ConfigError::InvalidDocument);
        }
        Ok(Self {
            name: name.into(),
            original_size_bytes,
            page_count,
            signature: SignatureState::Unknown,
        })
    }
}
