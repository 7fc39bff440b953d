// yt-dlp fetch engine
//
// Runs the yt-dlp executable once per request:
// - stdout: one JSON document (`--dump-single-json`) describing the video
//   or playlist, printed after the transfers finish
// - stderr: progress lines from our progress template, plus ERROR: lines

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::downloader::config::{EngineOptions, ErrorPolicy, OverwritePolicy};
use crate::downloader::errors::FetchError;
use crate::downloader::models::{
    Availability, DownloadMode, Item, MediaInfo, ProgressEvent, ProgressStatus,
};
use crate::downloader::tools::YtDlpTool;
use crate::downloader::traits::FetchEngine;

/// Progress line layout requested from yt-dlp; missing fields print as `NA`
pub const PROGRESS_TEMPLATE: &str = "download:[progress] %(progress.status)s \
     %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s";

lazy_static::lazy_static! {
    static ref PROGRESS_RE: Regex = Regex::new(
        r"^\[progress\]\s+(?P<status>\S+)\s+(?P<downloaded>\S+)\s+(?P<total>\S+)\s+(?P<estimate>\S+)\s*$"
    ).unwrap();
}

fn parse_bytes(field: &str) -> Option<u64> {
    let value: f64 = field.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value as u64)
}

/// Parse one line printed through `PROGRESS_TEMPLATE`
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let caps = PROGRESS_RE.captures(line.trim())?;

    Some(ProgressEvent {
        status: ProgressStatus::from(&caps["status"]),
        downloaded_bytes: parse_bytes(&caps["downloaded"]).unwrap_or(0),
        total_bytes: parse_bytes(&caps["total"]).or_else(|| parse_bytes(&caps["estimate"])),
    })
}

#[derive(Debug, Deserialize)]
struct RawDownload {
    filepath: Option<PathBuf>,
}

/// The subset of yt-dlp's info JSON we read
#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(rename = "_type")]
    kind: Option<String>,
    id: Option<String>,
    title: Option<String>,
    ext: Option<String>,
    playlist_title: Option<String>,
    availability: Option<Availability>,
    filename: Option<PathBuf>,
    #[serde(rename = "_filename")]
    internal_filename: Option<PathBuf>,
    requested_downloads: Option<Vec<RawDownload>>,
    entries: Option<Vec<Option<RawInfo>>>,
}

impl RawInfo {
    fn is_collection(&self) -> bool {
        self.kind.as_deref() == Some("playlist") || self.entries.is_some()
    }

    fn into_item(self) -> Item {
        let filepath = self
            .requested_downloads
            .unwrap_or_default()
            .into_iter()
            .find_map(|download| download.filepath)
            .or(self.filename)
            .or(self.internal_filename);

        Item {
            id: self.id,
            title: self.title,
            ext: self.ext,
            playlist_title: self.playlist_title,
            availability: self.availability.unwrap_or_default(),
            filepath,
        }
    }

    fn into_media_info(mut self) -> MediaInfo {
        if !self.is_collection() {
            return MediaInfo::Single(self.into_item());
        }

        let title = self.title.take();
        let entries = self
            .entries
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(|entry| {
                entry.map(|raw| {
                    let mut item = raw.into_item();
                    if item.playlist_title.is_none() {
                        item.playlist_title = title.clone();
                    }
                    item
                })
            })
            .collect();

        MediaInfo::Collection { title, entries }
    }
}

/// Decode yt-dlp stdout; `None` when nothing was resolved
pub fn parse_media_info(stdout: &[u8]) -> Result<Option<MediaInfo>, FetchError> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let raw: Option<RawInfo> = serde_json::from_str(text)
        .map_err(|e| FetchError::ParseError(format!("Invalid JSON from yt-dlp: {}", e)))?;

    Ok(raw.map(RawInfo::into_media_info))
}

pub struct YtDlpEngine {
    tool: YtDlpTool,
}

impl YtDlpEngine {
    pub fn new() -> Self {
        Self::with_tool(YtDlpTool::locate())
    }

    pub fn with_tool(tool: YtDlpTool) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &YtDlpTool {
        &self.tool
    }

    /// Command-line arguments for one run
    pub fn build_args(url: &str, options: &EngineOptions, download: bool) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--progress".to_string(),
            "--newline".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "-f".to_string(),
            options.format.clone(),
            "-P".to_string(),
            options.output_dir.to_string_lossy().to_string(),
            "-o".to_string(),
            options.output_template.clone(),
        ];

        if download {
            args.push("--no-simulate".to_string());
        }

        args.push(
            match options.overwrite {
                OverwritePolicy::SkipExisting => "--no-overwrites",
            }
            .to_string(),
        );

        args.push(
            match options.error_policy {
                ErrorPolicy::ContinueOnItemError => "--ignore-errors",
            }
            .to_string(),
        );

        if options.suppress_warnings {
            args.push("--no-warnings".to_string());
        }
        if options.no_color {
            args.push("--no-colors".to_string());
        }

        args.push(
            match options.mode {
                DownloadMode::Single => "--no-playlist",
                DownloadMode::Collection => "--yes-playlist",
            }
            .to_string(),
        );

        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_info(
        &self,
        url: &str,
        options: &EngineOptions,
        download: bool,
    ) -> Result<MediaInfo, FetchError> {
        let args = Self::build_args(url, options, download);
        tracing::debug!("[yt-dlp] {} {}", self.tool.path.display(), args.join(" "));

        let mut child = Command::new(&self.tool.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                FetchError::ToolNotFound(format!("{}: {}", self.tool.path.display(), e))
            })?;

        let mut stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::ExecutionError("Failed to capture stdout from yt-dlp".to_string()))?;
        let stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| FetchError::ExecutionError("Failed to capture stderr from yt-dlp".to_string()))?;

        // The JSON document only arrives at the end; drain it concurrently
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
        });

        // Titles in WARNING lines need not be UTF-8; decode each line lossily
        let mut errors = Vec::new();
        let mut segments = BufReader::new(stderr_pipe).split(b'\n');
        while let Some(segment) = segments.next_segment().await? {
            let line = String::from_utf8_lossy(&segment).trim_end_matches('\r').to_string();
            if let Some(event) = parse_progress_line(&line) {
                for hook in &options.progress_hooks {
                    hook.on_progress(&event);
                }
                continue;
            }

            if line.starts_with("ERROR:") {
                tracing::warn!("[yt-dlp] {}", line);
                errors.push(line);
            } else if !line.trim().is_empty() {
                tracing::debug!("[yt-dlp] {}", line);
            }
        }

        let status = child.wait().await?;
        let stdout = stdout_task
            .await
            .map_err(|e| FetchError::ExecutionError(format!("stdout task failed: {}", e)))??;

        match parse_media_info(&stdout)? {
            Some(info) => {
                if !status.success() {
                    tracing::info!(
                        "[yt-dlp] exited with {} after reporting; {} item error(s)",
                        status,
                        errors.len()
                    );
                }
                Ok(info)
            }
            None => {
                let message = errors
                    .pop()
                    .unwrap_or_else(|| format!("yt-dlp exited with {} and reported nothing", status));
                Err(FetchError::from(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::DownloadRequest;
    use crate::downloader::traits::ProgressHook;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_progress_line_with_total() {
        let event = parse_progress_line("[progress] downloading 1048576 4194304 NA").unwrap();
        assert_eq!(event.status, ProgressStatus::Downloading);
        assert_eq!(event.downloaded_bytes, 1_048_576);
        assert_eq!(event.total_bytes, Some(4_194_304));
        assert_eq!(event.percent(), Some(25.0));
    }

    #[test]
    fn test_progress_line_falls_back_to_estimate() {
        let event = parse_progress_line("[progress] downloading 500 NA 2000.0").unwrap();
        assert_eq!(event.total_bytes, Some(2000));
    }

    #[test]
    fn test_progress_line_without_any_total() {
        let event = parse_progress_line("[progress] downloading 500 NA NA").unwrap();
        assert_eq!(event.total_bytes, None);
        assert_eq!(event.percent(), None);
    }

    #[test]
    fn test_progress_line_finished() {
        let event = parse_progress_line("[progress] finished 2000 2000 NA").unwrap();
        assert_eq!(event.status, ProgressStatus::Finished);
    }

    #[test]
    fn test_non_progress_lines_are_ignored() {
        assert!(parse_progress_line("ERROR: [youtube] abc: Private video").is_none());
        assert!(parse_progress_line("[download] Destination: a.mp4").is_none());
    }

    #[test]
    fn test_args_carry_resolution_ceiling() {
        let request = DownloadRequest::new("https://youtube.com/watch?v=xyz", "/tmp/out")
            .with_max_height(Some(720));
        let options = EngineOptions::for_request(&request);
        let args = YtDlpEngine::build_args(request.url(), &options, true);

        let format_at = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[format_at + 1], "best[height<=720][ext=mp4]");
        assert!(args.contains(&"--no-overwrites".to_string()));
        assert!(args.contains(&"--ignore-errors".to_string()));
        assert!(args.contains(&"--no-warnings".to_string()));
        assert!(args.contains(&"--no-simulate".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtube.com/watch?v=xyz");
    }

    #[test]
    fn test_args_for_collection() {
        let request = DownloadRequest::new("https://youtube.com/playlist?list=xyz", "/tmp/out")
            .with_mode(DownloadMode::Collection);
        let options = EngineOptions::for_request(&request);
        let args = YtDlpEngine::build_args(request.url(), &options, true);

        assert!(args.contains(&"--yes-playlist".to_string()));
        let template_at = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[template_at + 1], "%(playlist_title|)s/%(title)s.%(ext)s");
    }

    #[test]
    fn test_parse_single_video() {
        let json = br#"{
            "id": "xyz", "title": "Clip", "ext": "mp4", "availability": "public",
            "requested_downloads": [{"filepath": "/tmp/out/Clip.mp4"}],
            "filename": "/tmp/out/Clip.other"
        }"#;
        let info = parse_media_info(json).unwrap().unwrap();

        match info {
            MediaInfo::Single(item) => {
                assert_eq!(item.title.as_deref(), Some("Clip"));
                assert_eq!(item.availability, Availability::Public);
                assert_eq!(item.filepath, Some(PathBuf::from("/tmp/out/Clip.mp4")));
            }
            other => panic!("expected single item, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_playlist_with_null_entries() {
        let json = br#"{
            "_type": "playlist", "title": "Mix",
            "entries": [
                {"id": "a", "title": "A", "ext": "mp4", "playlist_title": "Mix"},
                null,
                {"id": "c", "title": "Secret", "availability": "private"},
                {"id": "d", "availability": null}
            ]
        }"#;
        let info = parse_media_info(json).unwrap().unwrap();

        let MediaInfo::Collection { title, entries } = info else {
            panic!("expected a collection");
        };
        assert_eq!(title.as_deref(), Some("Mix"));
        assert_eq!(entries.len(), 4);
        assert!(entries[1].is_none());
        assert!(entries[2].as_ref().unwrap().is_private());
        let d = entries[3].as_ref().unwrap();
        assert_eq!(d.availability, Availability::Unknown);
        assert_eq!(d.playlist_title.as_deref(), Some("Mix"));
    }

    #[test]
    fn test_parse_empty_and_null_output() {
        assert!(parse_media_info(b"").unwrap().is_none());
        assert!(parse_media_info(b"  \n").unwrap().is_none());
        assert!(parse_media_info(b"null").unwrap().is_none());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(matches!(
            parse_media_info(b"not json"),
            Err(FetchError::ParseError(_))
        ));
    }

    /// Stand-in yt-dlp: a shell script that ignores its arguments
    #[cfg(unix)]
    fn fake_ytdlp(dir: &std::path::Path, body: &str) -> YtDlpTool {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        YtDlpTool::at(path)
    }

    #[derive(Default)]
    struct RecordingHook(Mutex<Vec<ProgressEvent>>);

    impl ProgressHook for RecordingHook {
        fn on_progress(&self, event: &ProgressEvent) {
            self.0.lock().unwrap().push(*event);
        }
    }

    fn options_for(url: &str, dir: &std::path::Path) -> EngineOptions {
        EngineOptions::for_request(&DownloadRequest::new(url, dir))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_stderr_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let engine = YtDlpEngine::with_tool(fake_ytdlp(
            dir.path(),
            r#"printf 'WARNING: caf\351\n' >&2
printf '[progress] downloading 50 100 NA\n' >&2
printf '%s\n' '{"id": "xyz", "title": "Clip", "ext": "mp4"}'"#,
        ));
        let hook = Arc::new(RecordingHook::default());
        let options = options_for("https://youtube.com/watch?v=xyz", dir.path())
            .with_progress_hook(hook.clone());

        let info = engine
            .extract_info("https://youtube.com/watch?v=xyz", &options, true)
            .await
            .unwrap();

        assert!(matches!(info, MediaInfo::Single(ref item) if item.title.as_deref() == Some("Clip")));
        assert_eq!(hook.0.lock().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_report_is_decoded_despite_failing_exit() {
        let dir = tempfile::tempdir().unwrap();
        let engine = YtDlpEngine::with_tool(fake_ytdlp(
            dir.path(),
            r#"echo 'ERROR: [youtube] b: Video unavailable' >&2
printf '%s\n' '{"_type": "playlist", "title": "Mix", "entries": [{"id": "a", "title": "A"}, null]}'
exit 1"#,
        ));
        let options = options_for("https://youtube.com/playlist?list=xyz", dir.path());

        let info = engine
            .extract_info("https://youtube.com/playlist?list=xyz", &options, true)
            .await
            .unwrap();

        let MediaInfo::Collection { title, entries } = info else {
            panic!("expected a collection");
        };
        assert_eq!(title.as_deref(), Some("Mix"));
        assert_eq!(entries.len(), 2);
        assert!(entries[1].is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_report_fails_with_last_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let engine = YtDlpEngine::with_tool(fake_ytdlp(
            dir.path(),
            r#"echo 'ERROR: [youtube] a: first problem' >&2
echo 'ERROR: [youtube] xyz: Video unavailable' >&2
exit 1"#,
        ));
        let options = options_for("https://youtube.com/watch?v=xyz", dir.path());

        let err = engine
            .extract_info("https://youtube.com/watch?v=xyz", &options, true)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "ERROR: [youtube] xyz: Video unavailable");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_null_report_without_errors_names_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let engine = YtDlpEngine::with_tool(fake_ytdlp(dir.path(), "echo null"));
        let options = options_for("https://youtube.com/watch?v=xyz", dir.path());

        let err = engine
            .extract_info("https://youtube.com/watch?v=xyz", &options, true)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("reported nothing"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_progress_lines_reach_every_hook() {
        let dir = tempfile::tempdir().unwrap();
        let engine = YtDlpEngine::with_tool(fake_ytdlp(
            dir.path(),
            r#"echo '[download] Destination: Clip.mp4' >&2
echo '[progress] downloading 25 100 NA' >&2
echo '[progress] downloading 100 NA 100' >&2
echo '[progress] finished 100 100 NA' >&2
printf '%s\n' '{"id": "xyz", "title": "Clip", "ext": "mp4"}'"#,
        ));
        let first = Arc::new(RecordingHook::default());
        let second = Arc::new(RecordingHook::default());
        let options = options_for("https://youtube.com/watch?v=xyz", dir.path())
            .with_progress_hook(first.clone())
            .with_progress_hook(second.clone());

        engine
            .extract_info("https://youtube.com/watch?v=xyz", &options, true)
            .await
            .unwrap();

        let events = first.0.lock().unwrap().clone();
        assert_eq!(
            events.iter().map(|e| e.downloaded_bytes).collect::<Vec<_>>(),
            vec![25, 100, 100]
        );
        assert_eq!(events[1].total_bytes, Some(100));
        assert_eq!(events[2].status, ProgressStatus::Finished);
        assert_eq!(*second.0.lock().unwrap(), events);
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let engine = YtDlpEngine::with_tool(YtDlpTool::at("/definitely/not/here/yt-dlp"));
        let request = DownloadRequest::new("https://youtube.com/watch?v=xyz", "/tmp/out");
        let options = EngineOptions::for_request(&request);

        let err = engine
            .extract_info(request.url(), &options, true)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::ToolNotFound(_)));
    }
}
