//! URL path segmentation
//!
//! Routing consumes the path one segment at a time. Every shift first cleans the
//! path to an absolute form (redundant slashes, `.` and `..` resolved), then
//! percent-decodes the segment it consumes, so handler lookups compare exact
//! decoded strings. The remainder stays encoded until it is shifted in turn.

use std::borrow::Cow;

/// Clean `path` into a rooted path without empty, `.` or `..` segments.
///
/// `..` at the root stays at the root, and the result never ends in a slash unless
/// it is `/` itself.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Split off the first segment of `path`.
///
/// Returns the percent-decoded segment and the still-encoded remainder, which
/// always starts with `/` and is `/` when nothing is left. Shifting `/` yields an
/// empty segment. An encoded `/` (`%2F`) stays inside its segment.
pub fn shift_path(path: &str) -> (String, String) {
    let cleaned = clean_path(path);
    let rest = &cleaned[1..];
    match rest.find('/') {
        Some(index) => (decode_segment(&rest[..index]), rest[index..].to_string()),
        None => (decode_segment(rest), "/".to_string()),
    }
}

/// Percent-decode one segment; bytes that are not UTF-8 become U+FFFD
fn decode_segment(segment: &str) -> String {
    match urlencoding::decode_binary(segment.as_bytes()) {
        Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Cow::Owned(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// Remove the mount prefix `base` from `path`, or `None` when `path` is outside it
pub fn strip_base_path(base: &str, path: &str) -> Option<String> {
    let base = clean_path(base);
    if base == "/" {
        return Some(path.to_string());
    }

    let path = clean_path(path);
    if path == base {
        return Some("/".to_string());
    }
    path.strip_prefix(&base)
        .filter(|rest| rest.starts_with('/'))
        .map(str::to_string)
}
