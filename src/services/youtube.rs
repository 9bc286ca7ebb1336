// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! YouTube Data API client for importing lesson videos.
//!
//! Handles:
//! - Playlist and video URL parsing
//! - Paginated playlist listing (50 items per page)
//! - Duration lookup in batches of 50, tolerating failed batches
//! - Mapping upstream failures onto `GatewayError`

use crate::models::Video;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Page size and duration batch size allowed by the API.
const MAX_RESULTS: usize = 50;

/// Failure talking to the YouTube Data API.
///
/// Display strings are shown to admins as-is.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(
        "Network error: Unable to connect to YouTube API. Please check your internet connection and try again."
    )]
    Transport(String),

    #[error("YouTube API access denied. Please check your API key and quota.")]
    AccessDenied,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MalformedRequest(String),

    #[error("YouTube API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Unexpected response from YouTube API: {0}")]
    Decode(String),
}

/// What a request was fetching, for error messages.
#[derive(Debug, Clone, Copy)]
enum Resource {
    Playlist,
    Video,
}

impl Resource {
    fn not_found(self) -> GatewayError {
        GatewayError::NotFound(match self {
            Resource::Playlist => "Playlist not found. Please check if the playlist URL is correct and the playlist is publicly available.".to_string(),
            Resource::Video => "Video not found. Please check if the video URL is correct and the video is publicly available.".to_string(),
        })
    }

    fn malformed(self) -> GatewayError {
        GatewayError::MalformedRequest(match self {
            Resource::Playlist => "Invalid request. Please check the playlist URL format.".to_string(),
            Resource::Video => "Invalid request. Please check the video URL format.".to_string(),
        })
    }
}

static PLAYLIST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"[?&]list=([a-zA-Z0-9_-]+)",
        r"/playlist\?list=([a-zA-Z0-9_-]+)",
    ])
});

static VIDEO_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]+)",
        r"youtube\.com/watch\?.*&v=([a-zA-Z0-9_-]+)",
    ])
});

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("duration pattern is valid")
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("URL pattern is valid"))
        .collect()
}

fn first_capture(patterns: &[Regex], url: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the playlist ID from a playlist URL.
pub fn extract_playlist_id(url: &str) -> Option<String> {
    first_capture(&PLAYLIST_PATTERNS, url)
}

/// Extract the video ID from a watch, short, or embed URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    first_capture(&VIDEO_PATTERNS, url)
}

/// Parse an ISO 8601 duration such as `PT1H2M3S` into seconds.
///
/// A duration too large for `u64` is treated as unknown.
pub fn parse_iso8601_duration(raw: &str) -> Option<u64> {
    let caps = DURATION_PATTERN.captures(raw.trim())?;
    let mut total: u64 = 0;
    for (group, unit) in [(1, 86_400u64), (2, 3_600), (3, 60), (4, 1)] {
        if let Some(m) = caps.get(group) {
            let value: u64 = m.as_str().parse().ok()?;
            total = total.checked_add(value.checked_mul(unit)?)?;
        }
    }
    Some(total)
}

/// YouTube Data API client.
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl YouTubeClient {
    /// Create a client. Without an API key every fetch is refused.
    pub fn new(api_key: Option<String>, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch every video of a playlist, in playlist order, with durations.
    ///
    /// A failed duration batch is logged and skipped; the affected videos
    /// keep `duration_seconds = None`.
    pub async fn fetch_playlist_videos(&self, playlist_id: &str) -> Result<Vec<Video>, GatewayError> {
        let mut videos: Vec<Video> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", "snippet,contentDetails".to_string()),
                ("playlistId", playlist_id.to_string()),
                ("maxResults", MAX_RESULTS.to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let page: PlaylistItemsPage = self
                .get_json("playlistItems", &query, Resource::Playlist)
                .await?;

            for item in page.items {
                let order = videos.len() as u32;
                videos.push(Video {
                    youtube_id: item.content_details.video_id,
                    title: item.snippet.title,
                    description: item.snippet.description,
                    thumbnail: item.snippet.thumbnails.best_url(),
                    duration_seconds: None,
                    order,
                });
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        for (batch_index, batch) in videos.chunks_mut(MAX_RESULTS).enumerate() {
            let ids = batch
                .iter()
                .map(|v| v.youtube_id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let query = [("part", "contentDetails".to_string()), ("id", ids)];

            match self
                .get_json::<VideosPage>("videos", &query, Resource::Video)
                .await
            {
                Ok(details) => {
                    for item in details.items {
                        let duration = item
                            .content_details
                            .and_then(|c| parse_iso8601_duration(&c.duration));
                        if let Some(video) = batch.iter_mut().find(|v| v.youtube_id == item.id) {
                            video.duration_seconds = duration;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        playlist_id,
                        batch = batch_index,
                        error = %e,
                        "Skipping failed duration batch"
                    );
                }
            }
        }

        tracing::debug!(playlist_id, count = videos.len(), "Fetched playlist videos");
        Ok(videos)
    }

    /// Fetch one video with its duration.
    pub async fn fetch_single_video(&self, video_id: &str) -> Result<Video, GatewayError> {
        let query = [
            ("part", "snippet,contentDetails".to_string()),
            ("id", video_id.to_string()),
        ];
        let page: VideosPage = self.get_json("videos", &query, Resource::Video).await?;

        let item = page
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Resource::Video.not_found())?;
        let snippet = item
            .snippet
            .ok_or_else(|| GatewayError::Decode("video has no snippet".to_string()))?;

        Ok(Video {
            youtube_id: item.id,
            title: snippet.title,
            description: snippet.description,
            thumbnail: snippet.thumbnails.best_url(),
            duration_seconds: item
                .content_details
                .and_then(|c| parse_iso8601_duration(&c.duration)),
            order: 0,
        })
    }

    /// GET an API resource with the key attached and parse the JSON body.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
        resource: Resource,
    ) -> Result<T, GatewayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GatewayError::AccessDenied)?;
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .query(&[("key", api_key)])
            .query(query)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, path, "YouTube request failed");
                GatewayError::Transport(e.to_string())
            })?;

        self.check_response_json(response, resource).await
    }

    /// Check response status and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
        resource: Resource,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                403 => GatewayError::AccessDenied,
                404 => resource.not_found(),
                400 => resource.malformed(),
                code => GatewayError::Upstream {
                    status: code,
                    message: upstream_message(&body).unwrap_or_else(|| {
                        status
                            .canonical_reason()
                            .unwrap_or("Unknown error")
                            .to_string()
                    }),
                },
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

/// Pull `error.message` out of an API error body.
fn upstream_message(body: &str) -> Option<String> {
    let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
    parsed.error.message.filter(|m| !m.is_empty())
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// One page of `playlistItems`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    snippet: Snippet,
    content_details: PlaylistItemDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemDetails {
    video_id: String,
}

/// Response of `videos`.
#[derive(Debug, Deserialize)]
struct VideosPage {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Option<Snippet>,
    content_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    duration: String,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    /// High resolution when available, otherwise default, otherwise empty.
    fn best_url(&self) -> String {
        self.high
            .as_ref()
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}
