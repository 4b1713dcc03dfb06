//! Pagepress core: page configuration, size estimation and the job/session
//! state machine. Pure and synchronous; all IO lives in the engine crate.
mod document;
mod effect;
mod error;
mod estimate;
mod guard;
mod monitor;
mod msg;
mod policy;
mod profile;
mod progress;
mod state;
mod store;
mod update;
mod view_model;

pub use document::{Document, SignatureState};
pub use effect::Effect;
pub use error::{ConfigError, ResetError};
pub use estimate::{format_megabytes, Estimate, EstimationEngine, Reduction};
pub use guard::SessionGuard;
pub use monitor::{Applied, FailureReason, Job, JobId, JobPhase, UploadId};
pub use msg::Msg;
pub use policy::{PolicyConfig, ProfileMultipliers, StatusMarkers};
pub use profile::Profile;
pub use progress::{LogField, ProgressMessage, ProgressUpdate, UpdateStatus};
pub use state::AppState;
pub use store::{ConfigSnapshot, PageConfigStore};
pub use update::update;
pub use view_model::{AppViewModel, DocumentView, ProgressView};
