use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use playlist_downloader::cli::{usage, Cli, Invocation, PROGRAM, USAGE_EXIT_CODE};
use playlist_downloader::downloader::{
    BatchOrchestrator, ConsoleReporter, DownloadRequest, RunReporter, YtDlpEngine,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::from_env();
    println!("Starting playlist downloader");

    let request = match cli.into_invocation(DownloadRequest::default_destination()) {
        Invocation::Download(request) => request,
        Invocation::Usage => {
            print!("{}", usage(PROGRAM));
            return ExitCode::from(USAGE_EXIT_CODE);
        }
    };

    let engine = YtDlpEngine::new();
    match engine.tool().version() {
        Some(version) => tracing::info!("[main] yt-dlp {} at {}", version, engine.tool().path.display()),
        None => tracing::warn!("[main] yt-dlp at {} did not report a version", engine.tool().path.display()),
    }

    let reporter = Arc::new(ConsoleReporter::stdout());
    let orchestrator = BatchOrchestrator::new(engine, reporter.clone());
    let result = orchestrator.run(&request).await;

    if !result.downloaded.is_empty() {
        reporter.line("\nSuccessfully Downloaded Files:");
        for file in &result.downloaded {
            reporter.line(&format!("  - {}", file.display()));
        }
    }

    ExitCode::SUCCESS
}
