//! Scraped search-result records, as produced by the external scraper.

use serde::Deserialize;
use url::Url;

/// A channel anchor extracted from a search-result tile. The scraper emits
/// every channel link it finds on the tile; the first one is the best guess
/// for the video's owning channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelAnchor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One raw search result from the scraper's JSON output.
///
/// Everything except `video_id` is best-effort; missing fields persist as
/// NULL so the normalization stage can record why a row was excluded.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapedVideo {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub views_text: Option<String>,
    #[serde(default)]
    pub published_text: Option<String>,
    #[serde(default)]
    pub video_type: Option<String>,
    #[serde(default)]
    pub is_multi_creator: Option<bool>,
    #[serde(default)]
    pub channels: Vec<ChannelAnchor>,
    /// Forward-compatible: honored when the scraper ever emits it directly.
    #[serde(default)]
    pub channel_url: Option<String>,
}

impl ScrapedVideo {
    /// Best-effort owning-channel extraction: first channel anchor carrying
    /// a well-formed absolute URL, else the direct `channel_url` field.
    pub fn owning_channel_url(&self) -> Option<&str> {
        self.channels
            .iter()
            .filter_map(|c| c.url.as_deref())
            .chain(self.channel_url.as_deref())
            .find(|u| !u.is_empty() && Url::parse(u).is_ok())
    }
}

/// Canonical watch URL derived from a video id.
pub fn video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Canonical thumbnail URL derived from a video id.
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owning_channel_prefers_anchor_list() {
        let raw: ScrapedVideo = serde_json::from_str(
            r#"{
                "video_id": "abc123",
                "channels": [
                    {"name": "Creator", "url": "https://www.youtube.com/@creator"},
                    {"name": "Other", "url": "https://www.youtube.com/@other"}
                ],
                "channel_url": "https://www.youtube.com/@direct"
            }"#,
        )
        .unwrap();
        assert_eq!(
            raw.owning_channel_url(),
            Some("https://www.youtube.com/@creator")
        );
    }

    #[test]
    fn test_owning_channel_falls_back_to_direct_field() {
        let raw: ScrapedVideo = serde_json::from_str(
            r#"{"video_id": "abc123", "channel_url": "https://www.youtube.com/@direct"}"#,
        )
        .unwrap();
        assert_eq!(
            raw.owning_channel_url(),
            Some("https://www.youtube.com/@direct")
        );

        let empty: ScrapedVideo = serde_json::from_str(r#"{"video_id": "abc123"}"#).unwrap();
        assert_eq!(empty.owning_channel_url(), None);
    }

    #[test]
    fn test_owning_channel_skips_malformed_urls() {
        let raw: ScrapedVideo = serde_json::from_str(
            r#"{
                "video_id": "abc123",
                "channels": [
                    {"name": "Broken", "url": "/@relative-path"},
                    {"name": "Creator", "url": "https://www.youtube.com/@creator"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            raw.owning_channel_url(),
            Some("https://www.youtube.com/@creator")
        );
    }

    #[test]
    fn test_derived_urls() {
        assert_eq!(video_url("xyz"), "https://www.youtube.com/watch?v=xyz");
        assert_eq!(
            thumbnail_url("xyz"),
            "https://i.ytimg.com/vi/xyz/hqdefault.jpg"
        );
    }
}
