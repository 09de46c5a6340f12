//! Video id extraction from the URL shapes YouTube hands out.

use crate::error::{Result, TubechatError};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").expect("Invalid regex"));

/// Whether `candidate` has the shape of a YouTube video id.
pub fn is_video_id(candidate: &str) -> bool {
    VIDEO_ID.is_match(candidate)
}

/// Extract the 11-character video id from a YouTube URL or bare id.
///
/// Accepts `watch?v=`, `youtu.be/`, `embed/`, `v/`, `shorts/` and `live/`
/// forms, with or without a scheme.
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();
    if is_video_id(input) {
        return Ok(input.to_string());
    }

    let absolute = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&absolute).map_err(|_| TubechatError::InvalidUrl(input.to_string()))?;

    let host = url
        .host_str()
        .unwrap_or_default()
        .trim_start_matches("www.")
        .trim_start_matches("m.")
        .trim_start_matches("music.");

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let candidate = match host {
        "youtu.be" => segments.first().map(|s| s.to_string()),
        "youtube.com" | "youtube-nocookie.com" => match segments.as_slice() {
            ["watch", ..] => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            ["embed" | "v" | "shorts" | "live", id, ..] => Some(id.to_string()),
            _ => None,
        },
        _ => None,
    };

    candidate
        .filter(|id| is_video_id(id))
        .ok_or_else(|| TubechatError::InvalidUrl(input.to_string()))
}
