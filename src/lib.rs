pub mod cli;
pub mod downloader;

pub use downloader::{BatchOrchestrator, DownloadMode, DownloadRequest, RunResult, YtDlpEngine};
