// Positional command line: <url> [resolution] [playlist]

use clap::Parser;
use std::path::PathBuf;

use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::{DownloadMode, DownloadRequest};

pub const PROGRAM: &str = "playlist-downloader";

/// Exit status when no URL was given
pub const USAGE_EXIT_CODE: u8 = 1;

/// No flags: every token is positional, so `-h` or `--version` after the URL
/// is just another ignored argument
#[derive(Debug, Parser)]
#[command(
    name = PROGRAM,
    about = "Download a video or a whole playlist",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Video or playlist URL
    #[arg(allow_hyphen_values = true)]
    pub url: Option<String>,

    /// `720p`-style resolution ceiling and/or the word `playlist`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
    Usage,
    Download(DownloadRequest),
}

impl Cli {
    /// Parse the process arguments; arguments clap cannot read at all
    /// (not valid Unicode) fall back to the usage path
    pub fn from_env() -> Self {
        Self::try_parse().unwrap_or_else(|e| {
            tracing::warn!("[cli] unreadable arguments: {}", e);
            Self {
                url: None,
                rest: Vec::new(),
            }
        })
    }

    /// Interpret the positional tokens; unknown tokens are ignored
    pub fn into_invocation(self, destination: PathBuf) -> Invocation {
        let Some(url) = self.url else {
            return Invocation::Usage;
        };

        let mut max_height = None;
        let mut mode = DownloadMode::Single;

        for token in &self.rest {
            if token.ends_with('p') {
                match FormatSelector::parse_resolution(token) {
                    Some(height) => max_height = Some(height),
                    None => tracing::warn!("[cli] ignoring unreadable resolution {:?}", token),
                }
            } else if token.eq_ignore_ascii_case("playlist") {
                mode = DownloadMode::Collection;
            } else {
                tracing::debug!("[cli] ignoring argument {:?}", token);
            }
        }

        Invocation::Download(
            DownloadRequest::new(url, destination)
                .with_max_height(max_height)
                .with_mode(mode),
        )
    }
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {p} <URL> [resolution] [playlist]\n\
         Examples:\n  \
         Single video: {p} https://youtube.com/watch?v=xyz\n  \
         Playlist: {p} https://youtube.com/playlist?list=xyz playlist\n  \
         With resolution: {p} https://youtube.com/watch?v=xyz 720p\n  \
         Playlist with resolution: {p} https://youtube.com/playlist?list=xyz 720p playlist\n",
        p = program
    )
}
