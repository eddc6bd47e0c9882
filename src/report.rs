//! Aggregate summary of a batch of detection records.

use crate::classifier::RiskCategory;
use crate::detector::DetectionRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write;

const TOP_SIGNALS: usize = 10;
const RENDERED_ROWS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub mean: f64,
    pub median: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
}

impl ScoreStats {
    /// Sample statistics; `stdev` is 0 for fewer than two values.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        let stdev = if n > 1 {
            let variance =
                sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Self {
            mean,
            median,
            stdev,
            min: sorted[0],
            max: sorted[n - 1],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub unique_channels: usize,
    pub live_streams: usize,
    pub recorded_videos: usize,
    pub category_distribution: BTreeMap<RiskCategory, usize>,
    pub total_score: ScoreStats,
    pub mean_video_score: f64,
    pub mean_channel_score: f64,
    pub top_video_signals: Vec<(String, usize)>,
    pub top_channel_signals: Vec<(String, usize)>,
    pub signal_categories: BTreeMap<String, usize>,
    pub impersonation_targets: Vec<(String, usize)>,
    pub by_query: Vec<(String, usize)>,
}

impl BatchSummary {
    pub fn from_records(records: &[DetectionRecord]) -> Self {
        let total = records.len();
        if total == 0 {
            return Self::default();
        }

        let unique_channels = records
            .iter()
            .map(|r| r.channel_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let live_streams = records.iter().filter(|r| r.is_live).count();

        let mut category_distribution = BTreeMap::new();
        for category in RiskCategory::all() {
            category_distribution.insert(category, 0);
        }
        for record in records {
            *category_distribution.entry(record.risk_category).or_insert(0) += 1;
        }

        let totals: Vec<f64> = records.iter().map(|r| r.total_risk_score).collect();
        let mean_video_score =
            records.iter().map(|r| r.video_risk_score).sum::<f64>() / total as f64;
        let mean_channel_score =
            records.iter().map(|r| r.channel_risk_score).sum::<f64>() / total as f64;

        let mut signal_categories: BTreeMap<String, usize> = BTreeMap::new();
        let mut targets: HashMap<String, usize> = HashMap::new();
        let mut queries: HashMap<String, usize> = HashMap::new();

        for record in records {
            for signal in &record.video_signals {
                if let Some(category) = video_signal_category(signal) {
                    *signal_categories.entry(category.to_string()).or_insert(0) += 1;
                }
            }
            for signal in &record.channel_signals {
                if let Some(category) = channel_signal_category(signal) {
                    *signal_categories.entry(category.to_string()).or_insert(0) += 1;
                }
            }
            for signal in record.video_signals.iter().chain(&record.channel_signals) {
                for target in impersonation_targets(signal) {
                    *targets.entry(target).or_insert(0) += 1;
                }
            }

            let query = record.search_query.as_deref().unwrap_or("unknown");
            *queries.entry(query.to_string()).or_insert(0) += 1;
        }

        Self {
            total,
            unique_channels,
            live_streams,
            recorded_videos: total - live_streams,
            category_distribution,
            total_score: ScoreStats::from_values(&totals),
            mean_video_score,
            mean_channel_score,
            top_video_signals: top_counts(
                records.iter().flat_map(|r| r.video_signals.iter()),
                TOP_SIGNALS,
            ),
            top_channel_signals: top_counts(
                records.iter().flat_map(|r| r.channel_signals.iter()),
                TOP_SIGNALS,
            ),
            signal_categories,
            impersonation_targets: sorted_counts(targets),
            by_query: sorted_counts(queries),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "📊 Stream-Jacking Detection Summary")?;
        writeln!(out, "═══════════════════════════════════════")?;
        writeln!(out)?;

        if self.total == 0 {
            writeln!(out, "No detection records to summarize.")?;
            return Ok(());
        }

        writeln!(out, "📈 Dataset:")?;
        writeln!(out, "  Total Records: {}", self.total)?;
        writeln!(out, "  Unique Channels: {}", self.unique_channels)?;
        writeln!(out, "  ├─ Live Streams: {}", self.live_streams)?;
        writeln!(out, "  └─ Recorded Videos: {}", self.recorded_videos)?;
        writeln!(out)?;

        writeln!(out, "⚠️  Risk Distribution:")?;
        for category in RiskCategory::all() {
            let count = self.category_distribution.get(&category).copied().unwrap_or(0);
            let pct = count as f64 / self.total as f64 * 100.0;
            writeln!(out, "  {} {}: {} ({:.1}%)", category_emoji(category), category, count, pct)?;
        }
        writeln!(out)?;

        let stats = &self.total_score;
        writeln!(out, "📐 Total Risk Score:")?;
        writeln!(out, "  Mean: {:.2}  Median: {:.2}  Std Dev: {:.2}", stats.mean, stats.median, stats.stdev)?;
        writeln!(out, "  Range: {:.1} - {:.1}", stats.min, stats.max)?;
        writeln!(
            out,
            "  Mean Video Score: {:.2}  Mean Channel Score: {:.2}",
            self.mean_video_score, self.mean_channel_score
        )?;
        writeln!(out)?;

        writeln!(out, "🔍 Top Video Signals:")?;
        write_rows(out, &self.top_video_signals)?;
        writeln!(out, "🔍 Top Channel Signals:")?;
        write_rows(out, &self.top_channel_signals)?;

        writeln!(out, "🏷️  Signal Categories:")?;
        for (category, count) in &self.signal_categories {
            writeln!(out, "  • {}: {}", title_case(category), count)?;
        }
        writeln!(out)?;

        if !self.impersonation_targets.is_empty() {
            writeln!(out, "🎯 Most Impersonated Targets:")?;
            write_rows(out, &self.impersonation_targets)?;
        }

        writeln!(out, "🔎 Records by Search Query:")?;
        write_rows(out, &self.by_query)?;

        Ok(())
    }
}

fn write_rows(out: &mut String, rows: &[(String, usize)]) -> std::fmt::Result {
    if rows.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (label, count) in rows.iter().take(RENDERED_ROWS) {
        writeln!(out, "  • {label}: {count}")?;
    }
    writeln!(out)
}

fn category_emoji(category: RiskCategory) -> &'static str {
    match category {
        RiskCategory::Critical | RiskCategory::High => "🔴",
        RiskCategory::Medium => "🟡",
        RiskCategory::Low => "🟢",
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First matching bucket for a video signal.
pub fn video_signal_category(signal: &str) -> Option<&'static str> {
    let lower = signal.to_lowercase();
    if lower.contains("impersonation") {
        Some("impersonation")
    } else if lower.contains("scam keyword") {
        Some("scam_keywords")
    } else if lower.contains("address") || lower.contains("url") {
        Some("malicious_links")
    } else if lower.contains("comment") {
        Some("restricted_comments")
    } else if lower.contains("live") {
        Some("live_streaming")
    } else {
        None
    }
}

/// First matching bucket for a channel signal.
pub fn channel_signal_category(signal: &str) -> Option<&'static str> {
    let lower = signal.to_lowercase();
    if lower.contains("impersonation") {
        Some("impersonation")
    } else if lower.contains("hijack") {
        Some("account_hijacking")
    } else if lower.contains("subscriber") {
        Some("suspicious_metrics")
    } else if lower.contains("crypto") {
        Some("crypto_indicators")
    } else {
        None
    }
}

/// Targets named in an impersonation signal, e.g.
/// `"Name impersonation: Exact match: tesla, Exact match: spacex"` yields
/// `["tesla", "spacex"]`. Signals without a target yield `"unknown"`.
pub fn impersonation_targets(signal: &str) -> Vec<String> {
    if !signal.to_lowercase().contains("impersonation") {
        return Vec::new();
    }
    let Some((_, detail)) = signal.split_once(':') else {
        return vec!["unknown".to_string()];
    };

    detail
        .split(", ")
        .filter_map(|part| part.rsplit(':').next())
        .map(|target| target.trim().to_lowercase())
        .filter(|target| !target.is_empty())
        .collect()
}

fn top_counts<'r>(items: impl Iterator<Item = &'r String>, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.clone()).or_insert(0) += 1;
    }
    let mut sorted = sorted_counts(counts);
    sorted.truncate(limit);
    sorted
}

/// Descending by count, ties broken alphabetically.
fn sorted_counts(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn create_test_record(
        video_id: &str,
        channel_id: &str,
        total: f64,
        category: RiskCategory,
        video_signals: &[&str],
        channel_signals: &[&str],
    ) -> DetectionRecord {
        DetectionRecord {
            video_id: video_id.to_string(),
            video_title: format!("Video {video_id}"),
            channel_id: channel_id.to_string(),
            channel_title: "Channel".to_string(),
            is_live: video_signals.contains(&"Currently live streaming"),
            video_risk_score: total,
            channel_risk_score: 0.0,
            total_risk_score: total,
            risk_category: category,
            confidence_score: 0.5,
            critical_checks_passed: 0,
            video_signals: video_signals.iter().map(|s| s.to_string()).collect(),
            channel_signals: channel_signals.iter().map(|s| s.to_string()).collect(),
            detected_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            search_query: Some("bitcoin live".to_string()),
            video_url: format!("https://youtube.com/watch?v={video_id}"),
            channel_url: format!("https://youtube.com/channel/{channel_id}"),
        }
    }

    fn sample_records() -> Vec<DetectionRecord> {
        vec![
            create_test_record(
                "v1",
                "c1",
                90.0,
                RiskCategory::High,
                &[
                    "Title impersonation: Substitution impersonation: tesla",
                    "Currently live streaming",
                ],
                &["Name impersonation: Exact match: tesla, Exact match: elon musk"],
            ),
            create_test_record(
                "v2",
                "c1",
                50.0,
                RiskCategory::Medium,
                &["Contains crypto address or suspicious URL", "Currently live streaming"],
                &["Handle-name mismatch (possible hijack)"],
            ),
            create_test_record(
                "v3",
                "c2",
                10.0,
                RiskCategory::Low,
                &["Comments disabled or restricted"],
                &["Subscriber count hidden", "Crypto-heavy description (4 keywords)"],
            ),
        ]
    }

    #[test]
    fn test_score_stats() {
        let stats = ScoreStats::from_values(&[90.0, 50.0, 10.0]);
        assert_eq!(stats.mean, 50.0);
        assert_eq!(stats.median, 50.0);
        assert_eq!(stats.stdev, 40.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 90.0);

        let single = ScoreStats::from_values(&[42.0]);
        assert_eq!(single.stdev, 0.0);
        assert_eq!(ScoreStats::from_values(&[1.0, 2.0, 3.0, 4.0]).median, 2.5);
    }

    #[test]
    fn test_summary_counts() {
        let summary = BatchSummary::from_records(&sample_records());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.unique_channels, 2);
        assert_eq!(summary.live_streams, 2);
        assert_eq!(summary.recorded_videos, 1);
        assert_eq!(summary.category_distribution[&RiskCategory::High], 1);
        assert_eq!(summary.category_distribution[&RiskCategory::Critical], 0);
        assert_eq!(summary.top_video_signals[0], ("Currently live streaming".to_string(), 2));
        assert_eq!(summary.by_query, vec![("bitcoin live".to_string(), 3)]);
    }

    #[test]
    fn test_signal_categories() {
        let summary = BatchSummary::from_records(&sample_records());
        let categories = &summary.signal_categories;
        assert_eq!(categories["impersonation"], 2);
        assert_eq!(categories["live_streaming"], 2);
        assert_eq!(categories["malicious_links"], 1);
        assert_eq!(categories["restricted_comments"], 1);
        assert_eq!(categories["account_hijacking"], 1);
        assert_eq!(categories["suspicious_metrics"], 1);
        assert_eq!(categories["crypto_indicators"], 1);
        assert!(!categories.contains_key("scam_keywords"));
    }

    #[test]
    fn test_impersonation_targets() {
        assert_eq!(
            impersonation_targets("Name impersonation: Exact match: tesla, Exact match: elon musk"),
            vec!["tesla", "elon musk"]
        );
        assert_eq!(
            impersonation_targets("Promotional domain with impersonation"),
            vec!["unknown"]
        );
        assert!(impersonation_targets("Currently live streaming").is_empty());

        let summary = BatchSummary::from_records(&sample_records());
        assert_eq!(
            summary.impersonation_targets,
            vec![("tesla".to_string(), 2), ("elon musk".to_string(), 1)]
        );
    }

    #[test]
    fn test_empty_summary_renders() {
        let summary = BatchSummary::from_records(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.render().contains("No detection records"));
    }

    #[test]
    fn test_render_includes_sections() {
        let rendered = BatchSummary::from_records(&sample_records()).render();
        assert!(rendered.contains("Total Records: 3"));
        assert!(rendered.contains("HIGH: 1 (33.3%)"));
        assert!(rendered.contains("Account Hijacking: 1"));
        assert!(rendered.contains("• tesla: 2"));
    }
}
