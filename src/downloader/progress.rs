// Console progress line and end-of-run summary

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::models::{ProgressEvent, RunResult};
use super::traits::{ProgressHook, RunReporter};

/// Writes the user-facing console output of a run.
///
/// Write failures are ignored: losing a progress line must never abort
/// the transfer that produced it.
pub struct ConsoleReporter {
    out: Mutex<Box<dyn Write + Send>>,
    /// A `\r`-rewritten progress line is waiting for its line feed
    progress_open: AtomicBool,
}

impl ConsoleReporter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            progress_open: AtomicBool::new(false),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn write_raw(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }
}

impl RunReporter for ConsoleReporter {
    fn line(&self, text: &str) {
        let feed = if self.progress_open.swap(false, Ordering::Relaxed) { "\n" } else { "" };
        self.write_raw(&format!("{}{}\n", feed, text));
    }

    fn summary(&self, result: &RunResult) {
        // the summary opens with a blank line, which also ends the progress line
        self.progress_open.store(false, Ordering::Relaxed);
        self.write_raw(&render_summary(result));
    }
}

impl ProgressHook for ConsoleReporter {
    fn on_progress(&self, event: &ProgressEvent) {
        if let Some(percent) = event.percent() {
            self.progress_open.store(true, Ordering::Relaxed);
            self.write_raw(&format!("\rDownloading: {:.1}%", percent));
        }
    }
}

/// Summary text: counts plus one line per distinct skip label
pub fn render_summary(result: &RunResult) -> String {
    let mut text = String::from("\nDownload complete.\n");
    text.push_str(&format!("Total downloaded files: {}\n", result.downloaded.len()));

    if !result.skipped.is_empty() {
        text.push_str(&format!(
            "Skipped files (private or error): {}\n",
            result.skipped.len()
        ));
        text.push_str("Skipped file details:\n");
        for label in result.unique_skip_labels() {
            text.push_str(&format!("  - {}\n", label));
        }
    }

    text
}
