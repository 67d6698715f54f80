//! Channel metadata extraction via yt-dlp.
//!
//! The extractor is the enrichment stage's only collaborator: given a
//! channel URL it returns channel metadata plus a bounded list of recent
//! videos (no downloads). Failures are partitioned into permanent (resource
//! gone or blocked, never retried) and transient (everything else).

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::models::{ChannelMetadata, ChannelVideo};

/// Extraction failure, partitioned for the claim/terminal state machine.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Resource gone or blocked; the channel gets a terminal 'failed'
    /// marker and is never reclaimed.
    #[error("permanent extraction failure: {0}")]
    Permanent(String),
    /// Anything else; no marker is written so the channel stays retryable.
    #[error("transient extraction failure: {0}")]
    Transient(String),
}

impl ExtractError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, ExtractError::Permanent(_))
    }
}

/// Raw channel dump as emitted by `yt-dlp --dump-single-json`.
///
/// Numeric fields arrive as JSON numbers that are occasionally floats, so
/// they deserialize as f64 and are coerced on read. `entries` stays
/// untyped: it nests per-tab playlists that are flattened manually.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelDump {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub uploader_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub subscriber_count: Option<f64>,
    #[serde(default)]
    pub channel_follower_count: Option<f64>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub entries: Vec<Value>,
}

/// Extracts channel metadata and a bounded recent-video slice.
#[async_trait]
pub trait ChannelMetadataExtractor: Send + Sync {
    async fn fetch_channel(&self, channel_url: &str) -> Result<ChannelDump, ExtractError>;
}

/// yt-dlp-backed extractor. One subprocess per call, no downloads.
pub struct YtDlpExtractor {
    binary: PathBuf,
    max_videos: usize,
    timeout: Duration,
}

impl YtDlpExtractor {
    /// Locate yt-dlp on PATH and configure the per-call bounds.
    pub fn new(max_videos: usize, timeout: Duration) -> anyhow::Result<Self> {
        let binary = which::which("yt-dlp").context("yt-dlp not found in PATH")?;
        Ok(Self {
            binary,
            max_videos: max_videos.max(1),
            timeout,
        })
    }

    pub fn max_videos(&self) -> usize {
        self.max_videos
    }
}

#[async_trait]
impl ChannelMetadataExtractor for YtDlpExtractor {
    async fn fetch_channel(&self, channel_url: &str) -> Result<ChannelDump, ExtractError> {
        if channel_url.is_empty() {
            return Err(ExtractError::Permanent("empty channel url".to_string()));
        }

        info!("Fetching channel metadata: {}", channel_url);

        let playlist_end = self.max_videos.to_string();
        let mut cmd = Command::new(&self.binary);
        cmd.args([
            "--dump-single-json",
            "--flat-playlist",
            "--extractor-args",
            "youtubetab:approximate_date",
            "--playlist-end",
            playlist_end.as_str(),
            "--skip-download",
            "--no-warnings",
        ]);
        cmd.arg(channel_url);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ExtractError::Transient(format!("yt-dlp timeout for {channel_url}")))?
            .map_err(|e| ExtractError::Transient(format!("failed to execute yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(classify_failure(&format!(
                "yt-dlp failed for {channel_url}: {}",
                truncate(&detail, 5000)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(ExtractError::Transient(format!(
                "yt-dlp produced empty output for {channel_url}"
            )));
        }

        let dump: ChannelDump = serde_json::from_str(stdout.trim()).map_err(|e| {
            ExtractError::Transient(format!("yt-dlp output was not valid JSON for {channel_url}: {e}"))
        })?;

        debug!(channel_url, entries = dump.entries.len(), "yt-dlp dump parsed");
        Ok(dump)
    }
}

/// Failure markers that mean the channel is gone or blocked. Typical
/// yt-dlp wording for deleted/404 channels.
const PERMANENT_MARKERS: &[&str] = &[
    "Failed to resolve url",
    "HTTP Error 404",
    "does the playlist exist",
];

fn classify_failure(message: &str) -> ExtractError {
    if PERMANENT_MARKERS.iter().any(|m| message.contains(m)) {
        ExtractError::Permanent(message.to_string())
    } else {
        ExtractError::Transient(message.to_string())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Extract raw channel metadata from a dump. Missing fields stay None.
pub fn parse_channel_metadata(channel_url: &str, dump: &ChannelDump) -> ChannelMetadata {
    let channel_id = non_empty(dump.channel_id.as_deref())
        .or_else(|| non_empty(dump.uploader_id.as_deref()))
        .map(str::to_string);
    let channel_name = non_empty(dump.channel.as_deref())
        .or_else(|| non_empty(dump.uploader.as_deref()))
        .map(str::to_string);
    let subscriber_count = dump
        .subscriber_count
        .or(dump.channel_follower_count)
        .map(|n| n as i64);

    ChannelMetadata {
        channel_url: channel_url.to_string(),
        channel_id,
        channel_name,
        subscriber_count,
        is_verified: dump.verified,
    }
}

/// Extract the last-N videos from a dump's flat-playlist entries.
pub fn parse_channel_videos(dump: &ChannelDump, max_videos: usize) -> Vec<ChannelVideo> {
    let mut flattened = Vec::new();
    flatten_entries(&dump.entries, &mut flattened);

    let mut videos = Vec::new();
    for entry in flattened {
        if videos.len() >= max_videos {
            break;
        }

        let Some(video_id) = entry.get("id").and_then(Value::as_str).filter(|s| !s.is_empty())
        else {
            continue;
        };

        let upload_date = entry
            .get("upload_date")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            // Flat-playlist entries often lack upload_date; fall back to
            // timestamp fields rendered in yt-dlp's YYYYMMDD shape.
            .or_else(|| {
                entry
                    .get("timestamp")
                    .and_then(Value::as_f64)
                    .or_else(|| entry.get("release_timestamp").and_then(Value::as_f64))
                    .and_then(|ts| DateTime::from_timestamp(ts as i64, 0))
                    .map(|dt| dt.format("%Y%m%d").to_string())
            });

        videos.push(ChannelVideo {
            video_id: video_id.to_string(),
            upload_date,
            duration_seconds: entry
                .get("duration")
                .and_then(Value::as_f64)
                .map(|d| d as i32),
            view_count: entry
                .get("view_count")
                .and_then(Value::as_f64)
                .map(|v| v as i64),
        });
    }

    videos
}

/// Recursively yield video entries, skipping the Shorts and Live tab
/// playlists.
fn flatten_entries<'a>(entries: &'a [Value], out: &mut Vec<&'a Value>) {
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            continue;
        };

        if let Some(nested) = obj.get("entries").and_then(Value::as_array) {
            let title = obj
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_lowercase();
            if title.contains("shorts") || title.contains("live") {
                continue;
            }
            flatten_entries(nested, out);
        } else {
            out.push(entry);
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
