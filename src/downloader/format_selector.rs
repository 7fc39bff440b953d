// FormatSelector - yt-dlp format specification for a request
//
// Always prefers a single pre-muxed mp4 stream; a resolution ceiling
// narrows the choice to formats no taller than the requested height.

/// Container the downloader asks for
pub const PREFERRED_CONTAINER: &str = "mp4";

pub struct FormatSelector;

impl FormatSelector {
    /// `best[ext=mp4]`, or `best[height<=N][ext=mp4]` with a ceiling
    pub fn format_spec(max_height: Option<u32>) -> String {
        match max_height {
            Some(height) => format!("best[height<={}][ext={}]", height, PREFERRED_CONTAINER),
            None => format!("best[ext={}]", PREFERRED_CONTAINER),
        }
    }

    /// Parse a resolution token such as `720p` into a height
    pub fn parse_resolution(token: &str) -> Option<u32> {
        token.strip_suffix('p')?.parse().ok()
    }
}
