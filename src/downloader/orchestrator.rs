// Batch orchestrator: one engine call, then classify every item it reports

use std::path::PathBuf;
use std::sync::Arc;

use super::config::EngineOptions;
use super::errors::FetchError;
use super::models::{DownloadMode, DownloadRequest, Item, ItemOutcome, MediaInfo, RunResult, SkipReason};
use super::progress::ConsoleReporter;
use super::traits::{FetchEngine, RunReporter};

pub struct BatchOrchestrator<E: FetchEngine, R: RunReporter = ConsoleReporter> {
    engine: E,
    reporter: Arc<R>,
}

impl<E: FetchEngine, R: RunReporter + 'static> BatchOrchestrator<E, R> {
    pub fn new(engine: E, reporter: Arc<R>) -> Self {
        Self { engine, reporter }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run one request to completion.
    ///
    /// Never fails: every problem ends up as a [`SkipReason`] in the result.
    /// The summary block is printed exactly once per call.
    pub async fn run(&self, request: &DownloadRequest) -> RunResult {
        let result = self.execute(request).await;
        tracing::info!(
            "[Orchestrator] finished: {} downloaded, {} skipped",
            result.downloaded.len(),
            result.skipped.len()
        );
        self.reporter.summary(&result);
        result
    }

    async fn execute(&self, request: &DownloadRequest) -> RunResult {
        if let Err(e) = tokio::fs::create_dir_all(request.destination()).await {
            tracing::error!(
                "[Orchestrator] cannot create {}: {}",
                request.destination().display(),
                e
            );
            self.reporter.line(&format!("Download failed: {}", e));
            return RunResult::failed(SkipReason::Setup(e.to_string()));
        }

        let options = EngineOptions::for_request(request).with_progress_hook(self.reporter.clone());

        tracing::info!(
            "[Orchestrator] {} {} via {} (format {})",
            request.mode(),
            request.url(),
            self.engine.name(),
            options.format
        );

        let info = match self.engine.extract_info(request.url(), &options, true).await {
            Ok(info) => info,
            Err(e) => {
                tracing::error!("[Orchestrator] {} failed: {}", self.engine.name(), e);
                self.reporter.line(&format!("Unexpected error during download: {}", e));
                return RunResult::failed(SkipReason::RunFailure(e.to_string()));
            }
        };

        let mut result = RunResult::default();

        match info {
            MediaInfo::Collection { title, entries } => {
                if request.mode() == DownloadMode::Single {
                    tracing::warn!("[Orchestrator] single video request resolved to a playlist");
                }
                tracing::debug!(
                    "[Orchestrator] playlist {:?} with {} entries",
                    title,
                    entries.len()
                );
                for entry in &entries {
                    let outcome = match entry {
                        Some(item) => self.classify_item(item, &options).await,
                        None => ItemOutcome::Skipped(SkipReason::Unavailable),
                    };
                    self.announce(&outcome);
                    result.record(outcome);
                }
            }
            MediaInfo::Single(item) => {
                if request.mode() == DownloadMode::Collection {
                    tracing::warn!("[Orchestrator] playlist request resolved to a single video");
                }
                let outcome = self.classify_item(&item, &options).await;
                self.announce(&outcome);
                result.record(outcome);
            }
        }

        result
    }

    async fn classify_item(&self, item: &Item, options: &EngineOptions) -> ItemOutcome {
        if item.is_private() {
            return ItemOutcome::Skipped(SkipReason::Private {
                title: item.title.clone(),
            });
        }

        // Existence on disk counts as success, whether fetched now or earlier
        match self.materialized_path(item, options).await {
            Ok(Some(path)) => ItemOutcome::Downloaded(path),
            Ok(None) => ItemOutcome::Skipped(SkipReason::NotMaterialized {
                title: item.title.clone(),
            }),
            Err(e) => ItemOutcome::Skipped(SkipReason::ProcessingError {
                message: e.to_string(),
            }),
        }
    }

    async fn materialized_path(
        &self,
        item: &Item,
        options: &EngineOptions,
    ) -> Result<Option<PathBuf>, FetchError> {
        let path = self.engine.prepare_filename(item, options)?;
        if tokio::fs::try_exists(&path).await? {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    fn announce(&self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Downloaded(path) => {
                tracing::info!("[Orchestrator] downloaded {}", path.display());
            }
            ItemOutcome::Skipped(reason @ SkipReason::Unavailable) => {
                tracing::warn!("[Orchestrator] skipped: {}", reason);
                self.reporter.line("Skipping unavailable video in playlist");
            }
            ItemOutcome::Skipped(reason @ SkipReason::Private { .. }) => {
                tracing::warn!("[Orchestrator] private: {}", reason);
                self.reporter.line(&format!("Skipping private video: {}", reason));
            }
            ItemOutcome::Skipped(reason @ SkipReason::NotMaterialized { .. }) => {
                tracing::warn!("[Orchestrator] missing after download: {}", reason);
                self.reporter.line(&format!("Could not download: {}", reason));
            }
            ItemOutcome::Skipped(SkipReason::ProcessingError { message }) => {
                tracing::error!("[Orchestrator] entry failed: {}", message);
                self.reporter.line(&format!("Error processing playlist entry: {}", message));
            }
            ItemOutcome::Skipped(reason) => {
                tracing::error!("[Orchestrator] {}", reason);
            }
        }
    }
}
