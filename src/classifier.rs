//! Composite classification of a scored video and its channel.
//!
//! The blended score decides the category unless all five critical criteria
//! hold at once, in which case the stream is CRITICAL regardless of score.

use crate::config::{CompositeScoring, ScoringConfig};
use crate::lexicon::{keyword_hits, Lexicon};
use crate::matcher::TextMatcher;
use crate::metadata::{ChannelMetadata, VideoMetadata};
use crate::signals::{clamp_score, Scored};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CRITICAL_CHECK_COUNT: usize = 5;

/// Risk categories, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "LOW",
            RiskCategory::Medium => "MEDIUM",
            RiskCategory::High => "HIGH",
            RiskCategory::Critical => "CRITICAL",
        }
    }

    pub fn all() -> [RiskCategory; 4] {
        [
            RiskCategory::Critical,
            RiskCategory::High,
            RiskCategory::Medium,
            RiskCategory::Low,
        ]
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five conditions whose joint presence marks a stream CRITICAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CriticalChecks {
    pub is_live: bool,
    pub crypto_address: bool,
    pub channel_impersonation: bool,
    pub comments_disabled: bool,
    pub scam_keyword: bool,
}

impl CriticalChecks {
    pub fn passed(&self) -> usize {
        [
            self.is_live,
            self.crypto_address,
            self.channel_impersonation,
            self.comments_disabled,
            self.scam_keyword,
        ]
        .iter()
        .filter(|c| **c)
        .count()
    }

    pub fn all(&self) -> bool {
        self.passed() == CRITICAL_CHECK_COUNT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub risk_category: RiskCategory,
    pub confidence_score: f64,
    pub total_risk_score: f64,
    pub critical_checks_passed: usize,
    pub meets_critical_criteria: bool,
}

pub struct CompositeClassifier<'a> {
    lexicon: &'a Lexicon,
    max_variations: usize,
    scoring: CompositeScoring,
}

impl<'a> CompositeClassifier<'a> {
    pub fn new(lexicon: &'a Lexicon, scoring: &ScoringConfig) -> Self {
        Self {
            lexicon,
            max_variations: scoring.max_variations,
            scoring: scoring.composite.clone(),
        }
    }

    pub fn critical_checks(
        &self,
        video: &VideoMetadata,
        channel: Option<&ChannelMetadata>,
    ) -> CriticalChecks {
        let matcher = TextMatcher::new(self.lexicon, self.max_variations);
        let channel_title = channel.map(|c| c.channel_title.as_str()).unwrap_or("");
        let combined = video.combined_text().to_lowercase();

        CriticalChecks {
            is_live: video.is_live,
            crypto_address: matcher.contains_crypto_address(&video.description),
            channel_impersonation: !matcher.detect_target_impersonation(channel_title).is_empty(),
            comments_disabled: video.comments_disabled,
            scam_keyword: !keyword_hits(&combined, &self.lexicon.critical_keywords).is_empty(),
        }
    }

    /// Map a blended score to a category and confidence using the score
    /// thresholds alone.
    pub fn categorize(&self, total: f64) -> (RiskCategory, f64) {
        let s = &self.scoring;
        if total >= s.high_threshold {
            let confidence = interpolate(total, s.high_threshold, 100.0, s.high_confidence);
            (RiskCategory::High, confidence)
        } else if total >= s.medium_threshold {
            let confidence =
                interpolate(total, s.medium_threshold, s.high_threshold, s.medium_confidence);
            (RiskCategory::Medium, confidence)
        } else {
            (RiskCategory::Low, (total / 100.0).clamp(0.0, 1.0))
        }
    }

    pub fn classify(
        &self,
        video: &Scored<'_, VideoMetadata>,
        channel: Option<&Scored<'_, ChannelMetadata>>,
    ) -> CompositeResult {
        if let Some(channel) = channel {
            if self.lexicon.is_trusted_channel(&channel.metadata.channel_id) {
                return CompositeResult {
                    risk_category: RiskCategory::Low,
                    confidence_score: self.scoring.trusted_confidence,
                    total_risk_score: 0.0,
                    critical_checks_passed: 0,
                    meets_critical_criteria: false,
                };
            }
        }

        let channel_score = channel.map(|c| c.risk_score()).unwrap_or(0.0);
        let total = clamp_score(video.risk_score() + channel_score * self.scoring.channel_blend);

        let checks = self.critical_checks(video.metadata, channel.map(|c| c.metadata));
        let (risk_category, confidence_score) = if checks.all() {
            (RiskCategory::Critical, self.scoring.critical_confidence)
        } else {
            self.categorize(total)
        };

        CompositeResult {
            risk_category,
            confidence_score,
            total_risk_score: total,
            critical_checks_passed: checks.passed(),
            meets_critical_criteria: checks.all(),
        }
    }
}

/// Linear interpolation of `range` as `value` moves from `low` to `high`.
fn interpolate(value: f64, low: f64, high: f64, range: (f64, f64)) -> f64 {
    if high <= low {
        return range.0;
    }
    let t = ((value - low) / (high - low)).clamp(0.0, 1.0);
    range.0 + t * (range.1 - range.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::signals::SignalResult;

    fn create_test_lexicon() -> (Lexicon, ScoringConfig) {
        let config = DetectorConfig::default();
        (Lexicon::compile(&config.lexicon).unwrap(), config.scoring)
    }

    fn critical_video() -> VideoMetadata {
        VideoMetadata {
            video_id: "vid1".to_string(),
            title: "Crypto Giveaway".to_string(),
            description: "Send to 0x742d35Cc6634C0532925a3b844Bc454e4438f44e".to_string(),
            channel_id: "UCfake".to_string(),
            is_live: true,
            comments_disabled: true,
            ..Default::default()
        }
    }

    fn impersonating_channel() -> ChannelMetadata {
        ChannelMetadata {
            channel_id: "UCfake".to_string(),
            channel_title: "Elon Musk Live".to_string(),
            ..Default::default()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_category_ordering() {
        assert!(RiskCategory::Critical > RiskCategory::High);
        assert!(RiskCategory::High > RiskCategory::Medium);
        assert!(RiskCategory::Medium > RiskCategory::Low);
        assert_eq!(
            serde_json::to_string(&RiskCategory::Critical).unwrap(),
            "\"CRITICAL\""
        );
    }

    #[test]
    fn test_threshold_boundaries() {
        let (lexicon, scoring) = create_test_lexicon();
        let classifier = CompositeClassifier::new(&lexicon, &scoring);

        assert_eq!(classifier.categorize(70.0).0, RiskCategory::High);
        assert_eq!(classifier.categorize(40.0).0, RiskCategory::Medium);
        assert_eq!(classifier.categorize(39.99).0, RiskCategory::Low);
        assert_eq!(classifier.categorize(69.99).0, RiskCategory::Medium);
    }

    #[test]
    fn test_confidence_interpolation() {
        let (lexicon, scoring) = create_test_lexicon();
        let classifier = CompositeClassifier::new(&lexicon, &scoring);

        assert!(approx(classifier.categorize(70.0).1, 0.75));
        assert!(approx(classifier.categorize(100.0).1, 0.90));
        assert!(approx(classifier.categorize(85.0).1, 0.825));
        assert!(approx(classifier.categorize(40.0).1, 0.50));
        assert!(approx(classifier.categorize(55.0).1, 0.625));
        assert!(approx(classifier.categorize(25.0).1, 0.25));
        assert!(approx(classifier.categorize(0.0).1, 0.0));
    }

    #[test]
    fn test_all_five_criteria_is_critical() {
        let (lexicon, scoring) = create_test_lexicon();
        let classifier = CompositeClassifier::new(&lexicon, &scoring);
        let video = critical_video();
        let channel = impersonating_channel();

        // Deliberately low scores: the critical rule ignores the blend
        let scored_video = Scored::new(&video, SignalResult::new(vec![], 10.0));
        let scored_channel = Scored::new(&channel, SignalResult::new(vec![], 10.0));

        let result = classifier.classify(&scored_video, Some(&scored_channel));
        assert_eq!(result.risk_category, RiskCategory::Critical);
        assert_eq!(result.confidence_score, 0.95);
        assert_eq!(result.total_risk_score, 15.0);
        assert_eq!(result.critical_checks_passed, 5);
        assert!(result.meets_critical_criteria);
    }

    #[test]
    fn test_four_of_five_uses_blended_score() {
        let (lexicon, scoring) = create_test_lexicon();
        let classifier = CompositeClassifier::new(&lexicon, &scoring);
        let video = VideoMetadata {
            comments_disabled: false,
            ..critical_video()
        };
        let channel = impersonating_channel();

        let scored_video = Scored::new(&video, SignalResult::new(vec![], 50.0));
        let scored_channel = Scored::new(&channel, SignalResult::new(vec![], 40.0));

        let result = classifier.classify(&scored_video, Some(&scored_channel));
        assert_eq!(result.risk_category, RiskCategory::High);
        assert_eq!(result.total_risk_score, 70.0);
        assert_eq!(result.critical_checks_passed, 4);
        assert!(!result.meets_critical_criteria);
    }

    #[test]
    fn test_missing_channel_fails_impersonation_check() {
        let (lexicon, scoring) = create_test_lexicon();
        let classifier = CompositeClassifier::new(&lexicon, &scoring);
        let video = critical_video();
        let scored_video = Scored::new(&video, SignalResult::new(vec![], 45.0));

        let result = classifier.classify(&scored_video, None);
        assert_eq!(result.critical_checks_passed, 4);
        assert_eq!(result.risk_category, RiskCategory::Medium);
        assert_eq!(result.total_risk_score, 45.0);
    }

    #[test]
    fn test_blended_score_is_clamped() {
        let (lexicon, scoring) = create_test_lexicon();
        let classifier = CompositeClassifier::new(&lexicon, &scoring);
        let video = VideoMetadata {
            is_live: false,
            ..critical_video()
        };
        let channel = impersonating_channel();

        let scored_video = Scored::new(&video, SignalResult::new(vec![], 100.0));
        let scored_channel = Scored::new(&channel, SignalResult::new(vec![], 100.0));

        let result = classifier.classify(&scored_video, Some(&scored_channel));
        assert_eq!(result.total_risk_score, 100.0);
        assert_eq!(result.risk_category, RiskCategory::High);
    }

    #[test]
    fn test_trusted_channel_is_always_low() {
        let (lexicon, scoring) = create_test_lexicon();
        let classifier = CompositeClassifier::new(&lexicon, &scoring);
        let video = critical_video();
        let channel = ChannelMetadata {
            channel_id: "UC16niRr50-MSBwiO3YDb3RA".to_string(),
            channel_title: "Elon Musk Live".to_string(),
            ..Default::default()
        };

        let scored_video = Scored::new(&video, SignalResult::new(vec![], 100.0));
        let scored_channel = Scored::new(&channel, SignalResult::new(vec![], 100.0));

        let result = classifier.classify(&scored_video, Some(&scored_channel));
        assert_eq!(result.risk_category, RiskCategory::Low);
        assert_eq!(result.confidence_score, 1.0);
        assert_eq!(result.total_risk_score, 0.0);
        assert_eq!(result.critical_checks_passed, 0);
    }
}
