//! Pagepress engine: talks to the processing service and executes the
//! effects emitted by the core.
mod channel;
mod config;
mod download;
mod engine;
mod filename;
mod inspect;
mod persist;
mod sink;
mod submit;
mod types;

pub use channel::{PollTransport, ProgressChannel, ProgressTransport, PushTransport};
pub use config::{ServiceConfig, TransportKind};
pub use download::{Downloader, ReqwestDownloader};
pub use engine::{EngineConfig, EngineHandle};
pub use filename::result_file_name;
pub use inspect::{detect_signature, inspect_pdf, DocumentInfo, InspectError};
pub use persist::{ensure_output_dir, PersistError, ResultWriter};
pub use sink::{ChannelProgressSink, ProgressSink};
pub use submit::{ReqwestSubmitter, SubmitRequest, Submitter};
pub use types::{
    ChannelError, DownloadError, EngineEvent, FailureKind, JobHandle, SubmissionError,
};
