// Output template rendering (`%(field)s`, `%(field|default)s`)

use regex::{Captures, Regex};
use std::path::PathBuf;

use super::errors::FetchError;
use super::models::Item;

/// Placeholder for a field the item does not carry
pub const NA_PLACEHOLDER: &str = "NA";

lazy_static::lazy_static! {
    static ref FIELD_RE: Regex = Regex::new(
        r"%\((?P<key>[A-Za-z_]+)(?:\|(?P<default>[^)]*))?\)s"
    ).unwrap();
}

fn field_value<'a>(item: &'a Item, key: &str) -> Option<&'a str> {
    match key {
        "title" => item.title.as_deref(),
        "id" => item.id.as_deref(),
        "ext" => item.ext.as_deref(),
        "playlist_title" | "playlist" => item.playlist_title.as_deref(),
        _ => None,
    }
}

/// Make a field value safe to use as a single path segment
pub fn sanitize_segment(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' => '\u{29F8}',
            '\\' => '\u{29F9}',
            '"' | '*' | ':' | '<' | '>' | '?' | '|' => {
                char::from_u32(c as u32 + 0xFEE0).unwrap_or('_')
            }
            '\n' | '\r' => ' ',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Render `template` for `item` into a relative path.
///
/// Empty segments are dropped, so `%(playlist_title|)s/` collapses when
/// the item has no playlist.
pub fn render_output_template(template: &str, item: &Item) -> Result<PathBuf, FetchError> {
    let rendered = FIELD_RE.replace_all(template, |caps: &Captures| {
        match field_value(item, &caps["key"]) {
            Some(value) => sanitize_segment(value),
            None => caps
                .name("default")
                .map(|d| d.as_str().to_string())
                .unwrap_or_else(|| NA_PLACEHOLDER.to_string()),
        }
    });

    if rendered.contains("%(") {
        return Err(FetchError::ParseError(format!(
            "Malformed output template: {}",
            template
        )));
    }

    let path: PathBuf = rendered
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    if path.as_os_str().is_empty() {
        return Err(FetchError::ParseError(format!(
            "Output template rendered to an empty path: {}",
            template
        )));
    }

    Ok(path)
}
