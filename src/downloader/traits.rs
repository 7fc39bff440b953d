// Fetch engine and progress hook traits

use async_trait::async_trait;
use std::path::PathBuf;

use super::config::EngineOptions;
use super::errors::FetchError;
use super::models::{Item, MediaInfo, ProgressEvent, RunResult};
use super::template::render_output_template;

/// Receives transfer progress from the engine.
///
/// Implementations must not panic: a failing hook would abort the transfer
/// it is reporting on.
pub trait ProgressHook: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Receives everything a run reports: progress, per-item notices and the
/// closing summary
pub trait RunReporter: ProgressHook {
    /// One full line of user-facing output
    fn line(&self, text: &str);

    /// Called exactly once at the end of every run
    fn summary(&self, result: &RunResult);
}

/// Trait for media fetch engine implementations
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Resolve `url` and, when `download` is set, transfer every item it
    /// points at. Per-item failures are left for the caller to discover.
    async fn extract_info(
        &self,
        url: &str,
        options: &EngineOptions,
        download: bool,
    ) -> Result<MediaInfo, FetchError>;

    /// Where `item` ends up on disk under `options`
    fn prepare_filename(&self, item: &Item, options: &EngineOptions) -> Result<PathBuf, FetchError> {
        if let Some(path) = &item.filepath {
            return Ok(path.clone());
        }
        let relative = render_output_template(&options.output_template, item)?;
        Ok(options.output_dir.join(relative))
    }
}
