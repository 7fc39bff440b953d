// Common data models for the downloader

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Whether the locator points at one video or a whole playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadMode {
    #[default]
    Single,
    Collection,
}

impl fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "video"),
            Self::Collection => write!(f, "playlist"),
        }
    }
}

/// One download run as requested by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: String,
    destination: PathBuf,
    max_height: Option<u32>,
    mode: DownloadMode,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            max_height: None,
            mode: DownloadMode::Single,
        }
    }

    pub fn with_max_height(mut self, max_height: Option<u32>) -> Self {
        self.max_height = max_height;
        self
    }

    pub fn with_mode(mut self, mode: DownloadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Resolution ceiling in pixels of height
    pub fn max_height(&self) -> Option<u32> {
        self.max_height
    }

    pub fn mode(&self) -> DownloadMode {
        self.mode
    }

    /// `./downloads` under the current working directory
    pub fn default_destination() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("downloads")
    }
}

/// Visibility state reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Public,
    Unlisted,
    Private,
    PremiumOnly,
    SubscriberOnly,
    NeedsAuth,
    Unavailable,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One fetchable video, as resolved by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub id: Option<String>,
    pub title: Option<String>,
    pub ext: Option<String>,
    pub playlist_title: Option<String>,
    pub availability: Availability,
    /// Final path reported by the engine once the file was written
    pub filepath: Option<PathBuf>,
}

impl Item {
    pub fn is_private(&self) -> bool {
        self.availability == Availability::Private
    }
}

/// What a single `extract_info` call resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaInfo {
    Single(Item),
    Collection {
        title: Option<String>,
        /// `None` marks an entry the engine could not resolve at all
        entries: Vec<Option<Item>>,
    },
}

/// The skip buckets an item can land in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipBucket {
    Unavailable,
    Private,
    Error,
}

/// Why something was not downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Playlist entry the engine could not resolve
    Unavailable,
    Private { title: Option<String> },
    /// Resolved and attempted, but the expected file is not on disk
    NotMaterialized { title: Option<String> },
    /// Inspecting the entry itself failed
    ProcessingError { message: String },
    /// The engine call failed before any item was processed
    RunFailure(String),
    /// The destination directory could not be prepared
    Setup(String),
}

impl SkipReason {
    pub const UNAVAILABLE_LABEL: &'static str = "Unavailable Video";
    pub const PRIVATE_PLACEHOLDER: &'static str = "Private Video Title";
    pub const MISSING_PLACEHOLDER: &'static str = "Something off with this Video";
    pub const PROCESSING_LABEL: &'static str = "Error Processing Video";

    /// Label recorded in the run result and printed in the summary
    pub fn label(&self) -> String {
        match self {
            Self::Unavailable => Self::UNAVAILABLE_LABEL.to_string(),
            Self::Private { title } => title
                .clone()
                .unwrap_or_else(|| Self::PRIVATE_PLACEHOLDER.to_string()),
            Self::NotMaterialized { title } => title
                .clone()
                .unwrap_or_else(|| Self::MISSING_PLACEHOLDER.to_string()),
            Self::ProcessingError { .. } => Self::PROCESSING_LABEL.to_string(),
            Self::RunFailure(message) => format!("Unexpected Error: {}", message),
            Self::Setup(message) => message.clone(),
        }
    }

    /// Per-item bucket; `None` for run-level failures
    pub fn bucket(&self) -> Option<SkipBucket> {
        match self {
            Self::Unavailable => Some(SkipBucket::Unavailable),
            Self::Private { .. } => Some(SkipBucket::Private),
            Self::NotMaterialized { .. } | Self::ProcessingError { .. } => Some(SkipBucket::Error),
            Self::RunFailure(_) | Self::Setup(_) => None,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Classification of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Downloaded(PathBuf),
    Skipped(SkipReason),
}

/// Outcome of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub downloaded: Vec<PathBuf>,
    pub skipped: Vec<SkipReason>,
}

impl RunResult {
    pub fn failed(reason: SkipReason) -> Self {
        Self {
            downloaded: Vec::new(),
            skipped: vec![reason],
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Downloaded(path) => self.downloaded.push(path),
            ItemOutcome::Skipped(reason) => self.skipped.push(reason),
        }
    }

    /// Every skip label, duplicates included
    pub fn skipped_labels(&self) -> Vec<String> {
        self.skipped.iter().map(SkipReason::label).collect()
    }

    /// Skip labels with duplicates collapsed, in first-seen order
    pub fn unique_skip_labels(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.skipped_labels()
            .into_iter()
            .filter(|label| seen.insert(label.clone()))
            .collect()
    }

    pub fn count_in(&self, bucket: SkipBucket) -> usize {
        self.skipped
            .iter()
            .filter(|reason| reason.bucket() == Some(bucket))
            .count()
    }

    /// Number of items that reached a classification
    pub fn items_classified(&self) -> usize {
        self.downloaded.len()
            + self
                .skipped
                .iter()
                .filter(|reason| reason.bucket().is_some())
                .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Error,
    Other,
}

impl From<&str> for ProgressStatus {
    fn from(s: &str) -> Self {
        match s {
            "downloading" => Self::Downloading,
            "finished" => Self::Finished,
            "error" => Self::Error,
            _ => Self::Other,
        }
    }
}

/// Transfer progress reported by the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub downloaded_bytes: u64,
    /// Exact or estimated size, when known
    pub total_bytes: Option<u64>,
}

impl ProgressEvent {
    /// Percentage while downloading with a known, positive total
    pub fn percent(&self) -> Option<f64> {
        match (self.status, self.total_bytes) {
            (ProgressStatus::Downloading, Some(total)) if total > 0 => {
                Some(self.downloaded_bytes as f64 * 100.0 / total as f64)
            }
            _ => None,
        }
    }
}
