// Locating the yt-dlp executable

use std::path::{Path, PathBuf};
use std::process::Command;

pub const YTDLP_BINARY: &str = "yt-dlp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YtDlpTool {
    pub path: PathBuf,
    /// Whether `path` was found on disk rather than assumed to be on PATH
    pub is_located: bool,
}

impl YtDlpTool {
    pub fn locate() -> Self {
        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                tracing::debug!("[tools] found {} at {}", YTDLP_BINARY, candidate.display());
                return Self {
                    path: candidate,
                    is_located: true,
                };
            }
        }

        if let Ok(output) = Command::new("which").arg(YTDLP_BINARY).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    tracing::debug!("[tools] found {} via which: {}", YTDLP_BINARY, path);
                    return Self {
                        path: PathBuf::from(path),
                        is_located: true,
                    };
                }
            }
        }

        tracing::debug!("[tools] {} not located, relying on PATH", YTDLP_BINARY);
        Self {
            path: PathBuf::from(YTDLP_BINARY),
            is_located: false,
        }
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let is_located = path.exists();
        Self { path, is_located }
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("/opt/homebrew/bin/yt-dlp"), // Homebrew on Apple Silicon
            PathBuf::from("/usr/local/bin/yt-dlp"),    // Homebrew on Intel Mac
            PathBuf::from("/usr/bin/yt-dlp"),
        ];
        // pip install --user
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".local/bin").join(YTDLP_BINARY));
        }
        paths
    }

    /// `yt-dlp --version`, when the binary runs
    pub fn version(&self) -> Option<String> {
        match Command::new(&self.path).arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                (!version.is_empty()).then_some(version)
            }
            _ => None,
        }
    }
}
