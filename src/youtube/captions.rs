//! Caption track retrieval through YouTube's innertube player API.
//!
//! The watch page yields the innertube API key; the player endpoint lists the
//! caption tracks; the chosen track is downloaded in the `json3` timed-text format.

use super::{Transcript, TranscriptFetcher, TranscriptSegment};
use crate::config::YoutubeSettings;
use crate::error::{Result, TubechatError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

static INNERTUBE_API_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("Invalid regex")
});

static CONSENT_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="v" value="(.*?)""#).expect("Invalid regex"));

/// Fetches transcripts from YouTube over HTTP.
pub struct YoutubeTranscriptFetcher {
    client: reqwest::Client,
    base_url: String,
    languages: Vec<String>,
}

impl YoutubeTranscriptFetcher {
    /// Create a fetcher from settings.
    pub fn new(settings: &YoutubeSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| TubechatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            languages: settings.languages.clone(),
        })
    }

    /// Download the watch page, accepting the cookie consent wall if shown.
    async fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let url = format!("{}/watch?v={}", self.base_url, video_id);
        let html = self.get_text(&url, None).await?;

        if !html.contains("action=\"https://consent.youtube.com/s\"") {
            return Ok(html);
        }

        let consent = CONSENT_VALUE
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| TubechatError::Youtube("Failed to accept cookie consent".to_string()))?;

        debug!("Accepting cookie consent for {}", video_id);
        let cookie = format!("CONSENT=YES+{}", consent);
        let html = self.get_text(&url, Some(&cookie)).await?;

        if html.contains("action=\"https://consent.youtube.com/s\"") {
            return Err(TubechatError::Youtube(
                "Cookie consent was not accepted".to_string(),
            ));
        }

        Ok(html)
    }

    async fn get_text(&self, url: &str, cookie: Option<&str>) -> Result<String> {
        let mut request = self.client.get(url).header("Accept-Language", "en-US");
        if let Some(cookie) = cookie {
            request = request.header("Cookie", cookie);
        }

        let response = request.send().await?;
        check_status(response.status())?;
        Ok(response.text().await?)
    }

    /// Ask the innertube player endpoint for the video's caption tracks.
    async fn fetch_player(&self, video_id: &str, api_key: &str) -> Result<PlayerResponse> {
        let url = format!("{}/youtubei/v1/player?key={}", self.base_url, api_key);
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .client
            .post(&url)
            .header("Accept-Language", "en-US")
            .json(&body)
            .send()
            .await?;
        check_status(response.status())?;

        Ok(response.json().await?)
    }

    /// Download a caption track as `json3` timed text.
    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>> {
        let url = self.json3_url(&track.base_url)?;
        let body = self.get_text(url.as_str(), None).await?;
        parse_timed_text(&body)
    }

    fn json3_url(&self, track_url: &str) -> Result<Url> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| TubechatError::Config(format!("Invalid YouTube base URL: {}", e)))?;
        let mut url = base
            .join(track_url)
            .map_err(|e| TubechatError::Youtube(format!("Invalid caption track URL: {}", e)))?;

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "fmt")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair("fmt", "json3");

        Ok(url)
    }
}

#[async_trait]
impl TranscriptFetcher for YoutubeTranscriptFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        let html = self.fetch_watch_page(video_id).await?;

        let api_key = INNERTUBE_API_KEY
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                if html.contains("class=\"g-recaptcha\"") {
                    TubechatError::Youtube("YouTube is blocking requests from this IP".to_string())
                } else {
                    TubechatError::Youtube("Innertube API key not found on watch page".to_string())
                }
            })?;

        let player = self.fetch_player(video_id, &api_key).await?;
        check_playability(video_id, &player)?;

        let tracks = player
            .captions
            .and_then(|c| c.renderer)
            .map(|r| r.caption_tracks)
            .unwrap_or_default();

        if tracks.is_empty() {
            return Err(TubechatError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                reason: "subtitles are disabled for this video".to_string(),
            });
        }

        let track = select_track(video_id, &tracks, &self.languages)?;
        info!(
            "Fetching {} captions ({})",
            track.language_code,
            if track.is_generated() { "generated" } else { "manual" }
        );

        let segments = self.fetch_track(track).await?;
        if segments.is_empty() {
            warn!("Caption track for {} is empty", video_id);
        }

        Ok(Transcript::new(
            video_id.to_string(),
            track.language_code.clone(),
            track.is_generated(),
            segments,
        ))
    }
}

fn check_status(status: StatusCode) -> Result<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TubechatError::Youtube(
            "Too many requests, YouTube is rate limiting this client".to_string(),
        ));
    }
    if !status.is_success() {
        return Err(TubechatError::Youtube(format!("Unexpected status {}", status)));
    }
    Ok(())
}

fn check_playability(video_id: &str, player: &PlayerResponse) -> Result<()> {
    let Some(status) = &player.playability_status else {
        return Ok(());
    };

    let reason = status.reason.clone().unwrap_or_default();
    match status.status.as_str() {
        "OK" => Ok(()),
        "LOGIN_REQUIRED" if reason.contains("not a bot") => Err(TubechatError::Youtube(
            "YouTube requires sign-in to confirm this is not a bot".to_string(),
        )),
        "LOGIN_REQUIRED" => Err(TubechatError::TranscriptUnavailable {
            video_id: video_id.to_string(),
            reason: "video is age restricted".to_string(),
        }),
        _ => Err(TubechatError::TranscriptUnavailable {
            video_id: video_id.to_string(),
            reason: if reason.is_empty() {
                "video is unavailable".to_string()
            } else {
                format!("video is unavailable: {}", reason)
            },
        }),
    }
}

/// Pick a track for the first matching language, manual tracks before generated ones.
fn select_track<'a>(
    video_id: &str,
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Result<&'a CaptionTrack> {
    for language in languages {
        let matching = |generated: bool| {
            tracks
                .iter()
                .find(|t| &t.language_code == language && t.is_generated() == generated)
        };

        if let Some(track) = matching(false).or_else(|| matching(true)) {
            return Ok(track);
        }
    }

    let available: Vec<&str> = tracks.iter().map(|t| t.language_code.as_str()).collect();
    Err(TubechatError::TranscriptUnavailable {
        video_id: video_id.to_string(),
        reason: format!(
            "no transcript in {} (available: {})",
            languages.join(", "),
            available.join(", ")
        ),
    })
}

/// Parse a `json3` timed-text document into segments.
pub fn parse_timed_text(body: &str) -> Result<Vec<TranscriptSegment>> {
    let doc: TimedText = serde_json::from_str(body)?;

    let segments = doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event
                .segs?
                .into_iter()
                .filter_map(|s| s.utf8)
                .collect::<String>()
                .replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }

            Some(TranscriptSegment::new(
                text,
                event.t_start_ms.unwrap_or(0) as f64 / 1000.0,
                event.d_duration_ms.unwrap_or(0) as f64 / 1000.0,
            ))
        })
        .collect();

    Ok(segments)
}

// === Wire types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedTextEvent {
    t_start_ms: Option<u64>,
    d_duration_ms: Option<u64>,
    segs: Option<Vec<TimedTextSeg>>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    utf8: Option<String>,
}
