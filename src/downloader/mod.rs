// Downloader module - request orchestration over a pluggable fetch engine

pub mod backends;
pub mod config;
pub mod errors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod template;
pub mod tools;
pub mod traits;

pub use backends::YtDlpEngine;
pub use config::EngineOptions;
pub use errors::FetchError;
pub use models::{
    Availability, DownloadMode, DownloadRequest, Item, ItemOutcome, MediaInfo, ProgressEvent,
    ProgressStatus, RunResult, SkipBucket, SkipReason,
};
pub use orchestrator::BatchOrchestrator;
pub use progress::ConsoleReporter;
pub use traits::{FetchEngine, ProgressHook, RunReporter};
