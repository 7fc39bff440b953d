// Engine configuration derived from a download request

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::format_selector::FormatSelector;
use super::models::{DownloadMode, DownloadRequest};
use super::traits::ProgressHook;

pub const SINGLE_TEMPLATE: &str = "%(title)s.%(ext)s";
pub const COLLECTION_TEMPLATE: &str = "%(playlist_title|)s/%(title)s.%(ext)s";

/// What to do with a file that already exists at the target path.
/// Existing files are always left alone; an existing file counts as fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    #[default]
    SkipExisting,
}

/// How the engine reacts to one item failing: it moves on to the next item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    #[default]
    ContinueOnItemError,
}

/// Configuration handed to a fetch engine
#[derive(Clone)]
pub struct EngineOptions {
    /// yt-dlp format specification
    pub format: String,
    pub output_dir: PathBuf,
    /// Output template relative to `output_dir`
    pub output_template: String,
    pub mode: DownloadMode,
    pub progress_hooks: Vec<Arc<dyn ProgressHook>>,
    pub overwrite: OverwritePolicy,
    pub error_policy: ErrorPolicy,
    pub suppress_warnings: bool,
    pub no_color: bool,
}

impl EngineOptions {
    pub fn for_request(request: &DownloadRequest) -> Self {
        let output_template = match request.mode() {
            DownloadMode::Single => SINGLE_TEMPLATE,
            DownloadMode::Collection => COLLECTION_TEMPLATE,
        };

        Self {
            format: FormatSelector::format_spec(request.max_height()),
            output_dir: request.destination().to_path_buf(),
            output_template: output_template.to_string(),
            mode: request.mode(),
            progress_hooks: Vec::new(),
            overwrite: OverwritePolicy::SkipExisting,
            error_policy: ErrorPolicy::ContinueOnItemError,
            suppress_warnings: true,
            no_color: true,
        }
    }

    pub fn with_progress_hook(mut self, hook: Arc<dyn ProgressHook>) -> Self {
        self.progress_hooks.push(hook);
        self
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("format", &self.format)
            .field("output_dir", &self.output_dir)
            .field("output_template", &self.output_template)
            .field("mode", &self.mode)
            .field("progress_hooks", &self.progress_hooks.len())
            .field("overwrite", &self.overwrite)
            .field("error_policy", &self.error_policy)
            .field("suppress_warnings", &self.suppress_warnings)
            .field("no_color", &self.no_color)
            .finish()
    }
}
