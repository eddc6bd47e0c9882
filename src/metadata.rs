//! Video and channel metadata snapshots supplied by the fetch layer.
//!
//! Every optional or absent field deserializes to an empty/false value so
//! partially cached records can still be scored.

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub channel_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub channel_title: String,
    #[serde(alias = "custom_url")]
    pub custom_handle: Option<String>,
    pub handle: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subscriber_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub video_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub view_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub published_at: String,
    pub country: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub topic_categories: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub hidden_subscriber_count: bool,
    pub default_language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveStreamingDetails {
    pub actual_start_time: Option<String>,
    pub actual_end_time: Option<String>,
    pub scheduled_start_time: Option<String>,
    pub concurrent_viewers: Option<u64>,
    pub active_live_chat_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub video_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub channel_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub channel_title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub published_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_live: bool,
    pub live_streaming_details: Option<LiveStreamingDetails>,
    #[serde(deserialize_with = "null_as_default")]
    pub view_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub like_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub comment_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub comments_disabled: bool,
    pub live_chat_id: Option<String>,
    pub default_language: Option<String>,
}

impl ChannelMetadata {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.channel_id.trim().is_empty() {
            bail!("missing required field: channel_id");
        }
        Ok(())
    }

    /// Whole days between the channel's creation and `now`; 0 when the
    /// timestamp cannot be parsed.
    pub fn account_age_days(&self, now: DateTime<Utc>) -> i64 {
        parse_timestamp(&self.published_at)
            .map(|created| (now - created).num_days())
            .unwrap_or(0)
    }

    pub fn url(&self) -> String {
        format!("https://youtube.com/channel/{}", self.channel_id)
    }
}

impl VideoMetadata {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.video_id.trim().is_empty() {
            bail!("missing required field: video_id");
        }
        Ok(())
    }

    /// Title and description joined with a space.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    pub fn url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.video_id)
    }

    pub fn channel_url(&self) -> String {
        format!("https://youtube.com/channel/{}", self.channel_id)
    }
}

/// Accept JSON `null` wherever a field has a natural empty value; cached API
/// documents often carry explicit nulls.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a count with thousands separators, e.g. `25000` -> `"25,000"`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
