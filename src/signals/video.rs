use super::{RuleHit, RuleRegistry, Scored, SignalResult, SignalRule};
use crate::config::{ScoringConfig, VideoScoring};
use crate::lexicon::{keyword_hits, Lexicon};
use crate::matcher::TextMatcher;
use crate::metadata::{format_count, VideoMetadata};

pub const EDUCATIONAL_SIGNAL: &str = "Educational/News intent detected (Risk reduced)";

/// Exemption flags derived before any video rule runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntentFlags {
    pub educational_hits: usize,
    pub scam_hits: usize,
    /// The owning channel's normal subject matter is crypto
    pub crypto_native: bool,
    /// Legitimate news/education content; dampens the final score
    pub educational: bool,
}

impl IntentFlags {
    /// Educational when educational vocabulary outnumbers scam vocabulary by
    /// more than `margin`, or when the channel is crypto-native.
    pub fn classify(lexicon: &Lexicon, video: &VideoMetadata, margin: usize) -> Self {
        let combined = video.combined_text().to_lowercase();
        let channel_title = video.channel_title.to_lowercase();

        let educational_hits = keyword_hits(&combined, &lexicon.educational_keywords).len();
        let scam_hits = keyword_hits(&combined, &lexicon.scam_keywords).len();
        let crypto_native =
            !keyword_hits(&channel_title, &lexicon.crypto_native_indicators).is_empty();

        Self {
            educational_hits,
            scam_hits,
            crypto_native,
            educational: educational_hits > scam_hits + margin || crypto_native,
        }
    }
}

pub struct VideoContext<'a> {
    pub matcher: TextMatcher<'a>,
    pub intent: IntentFlags,
    /// Lowercased title and description
    pub combined_lower: String,
    pub title_impersonations: Vec<String>,
}

pub type VideoRules<'a> = RuleRegistry<VideoMetadata, VideoContext<'a>>;

/// Impersonation in the title, ignoring plain subject mentions such as
/// "SpaceX Launch" that carry no official/giveaway claim.
pub struct TitleImpersonation {
    pub weight: f64,
}

impl TitleImpersonation {
    pub fn is_subject_mention(title: &str, matches: &[String], claim_words: &[String]) -> bool {
        let all_exact = matches.iter().all(|m| m.starts_with("Exact match"));
        let title_lower = title.to_lowercase();
        all_exact && keyword_hits(&title_lower, claim_words).is_empty()
    }
}

impl<'a> SignalRule<VideoMetadata, VideoContext<'a>> for TitleImpersonation {
    fn evaluate(&self, video: &VideoMetadata, ctx: &VideoContext<'a>) -> Option<RuleHit> {
        if ctx.title_impersonations.is_empty() {
            return None;
        }

        let claim_words = &ctx.matcher.lexicon().impersonation_claim_words;
        if Self::is_subject_mention(&video.title, &ctx.title_impersonations, claim_words) {
            return None;
        }

        Some(RuleHit::new(
            self.weight,
            format!("Title impersonation: {}", ctx.title_impersonations.join(", ")),
        ))
    }

    fn name(&self) -> &str {
        "title_impersonation"
    }
}

pub struct ScamPhrase {
    pub weight: f64,
}

impl<'a> SignalRule<VideoMetadata, VideoContext<'a>> for ScamPhrase {
    fn evaluate(&self, video: &VideoMetadata, ctx: &VideoContext<'a>) -> Option<RuleHit> {
        let (found, _) = ctx
            .matcher
            .detect_high_confidence_scam_phrase(&video.combined_text());
        found.then(|| RuleHit::new(self.weight, "High-confidence scam phrase detected"))
    }

    fn name(&self) -> &str {
        "scam_phrase"
    }
}

pub struct ScamKeywords {
    pub weight: f64,
    pub min_matches: usize,
}

impl<'a> SignalRule<VideoMetadata, VideoContext<'a>> for ScamKeywords {
    fn evaluate(&self, _video: &VideoMetadata, ctx: &VideoContext<'a>) -> Option<RuleHit> {
        let lexicon = ctx.matcher.lexicon();
        let mut matches = keyword_hits(&ctx.combined_lower, &lexicon.scam_keywords);
        if ctx.intent.crypto_native {
            matches.retain(|kw| !lexicon.generic_ticker_keywords.iter().any(|g| g.as_str() == *kw));
        }

        if matches.len() < self.min_matches {
            return None;
        }

        let shown: Vec<&str> = matches.iter().take(3).copied().collect();
        Some(RuleHit::new(
            self.weight,
            format!("Multiple scam keywords: {}", shown.join(", ")),
        ))
    }

    fn name(&self) -> &str {
        "scam_keywords"
    }
}

pub struct UrgencyLanguage {
    pub weight: f64,
    pub min_matches: usize,
}

impl<'a> SignalRule<VideoMetadata, VideoContext<'a>> for UrgencyLanguage {
    fn evaluate(&self, _video: &VideoMetadata, ctx: &VideoContext<'a>) -> Option<RuleHit> {
        if ctx.intent.educational {
            return None;
        }

        let (_, words) = ctx.matcher.detect_urgency_language(&ctx.combined_lower);
        if words.len() < self.min_matches {
            return None;
        }

        Some(RuleHit::new(
            self.weight,
            format!("Urgency language: {}", words[..2.min(words.len())].join(", ")),
        ))
    }

    fn name(&self) -> &str {
        "urgency_language"
    }
}

pub struct CryptoAddressOrUrl {
    pub weight: f64,
}

impl<'a> SignalRule<VideoMetadata, VideoContext<'a>> for CryptoAddressOrUrl {
    fn evaluate(&self, video: &VideoMetadata, ctx: &VideoContext<'a>) -> Option<RuleHit> {
        let description = &video.description;
        if ctx.matcher.contains_crypto_address(description)
            || ctx.matcher.contains_suspicious_url(description)
        {
            Some(RuleHit::new(
                self.weight,
                "Contains crypto address or suspicious URL",
            ))
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "crypto_address_or_url"
    }
}

pub struct CommentsDisabled {
    pub weight: f64,
}

impl<'a> SignalRule<VideoMetadata, VideoContext<'a>> for CommentsDisabled {
    fn evaluate(&self, video: &VideoMetadata, _ctx: &VideoContext<'a>) -> Option<RuleHit> {
        video
            .comments_disabled
            .then(|| RuleHit::new(self.weight, "Comments disabled or restricted"))
    }

    fn name(&self) -> &str {
        "comments_disabled"
    }
}

pub struct LiveStream {
    pub weight: f64,
}

impl<'a> SignalRule<VideoMetadata, VideoContext<'a>> for LiveStream {
    fn evaluate(&self, video: &VideoMetadata, _ctx: &VideoContext<'a>) -> Option<RuleHit> {
        video
            .is_live
            .then(|| RuleHit::new(self.weight, "Currently live streaming"))
    }

    fn name(&self) -> &str {
        "live_stream"
    }
}

/// Many views with almost no comments. Continuous camera feeds are exempt.
pub struct EngagementAnomaly {
    pub weight: f64,
    pub min_views: u64,
    pub max_comments: u64,
}

impl<'a> SignalRule<VideoMetadata, VideoContext<'a>> for EngagementAnomaly {
    fn evaluate(&self, video: &VideoMetadata, ctx: &VideoContext<'a>) -> Option<RuleHit> {
        let title = video.title.to_lowercase();
        let is_live_cam = !keyword_hits(&title, &ctx.matcher.lexicon().live_cam_indicators).is_empty();

        if video.view_count > self.min_views && video.comment_count < self.max_comments && !is_live_cam
        {
            Some(RuleHit::new(
                self.weight,
                format!(
                    "High views ({}) but very low engagement",
                    format_count(video.view_count)
                ),
            ))
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "engagement_anomaly"
    }
}

pub struct VideoScamDomain {
    pub known_weight: f64,
    pub promo_weight: f64,
}

impl<'a> SignalRule<VideoMetadata, VideoContext<'a>> for VideoScamDomain {
    fn evaluate(&self, video: &VideoMetadata, ctx: &VideoContext<'a>) -> Option<RuleHit> {
        let (has_scam_domain, domains) = ctx.matcher.matches_known_scam_domain(&video.description);
        if has_scam_domain {
            return Some(RuleHit::new(
                self.known_weight,
                format!("Suspicious domain(s): {}", domains.join(", ")),
            ));
        }

        if !ctx.intent.crypto_native && ctx.matcher.contains_promo_domain(&video.description) {
            return Some(RuleHit::new(
                self.promo_weight,
                "Promotional domain (unusual for channel type)",
            ));
        }

        None
    }

    fn name(&self) -> &str {
        "scam_domain"
    }
}

/// Scores video metadata against the video rule set.
pub struct VideoEvaluator<'a> {
    lexicon: &'a Lexicon,
    max_variations: usize,
    educational_margin: usize,
    educational_discount: f64,
    rules: VideoRules<'a>,
}

impl<'a> VideoEvaluator<'a> {
    pub fn new(lexicon: &'a Lexicon, scoring: &ScoringConfig) -> Self {
        Self {
            lexicon,
            max_variations: scoring.max_variations,
            educational_margin: scoring.video.educational_margin,
            educational_discount: scoring.video.educational_discount,
            rules: Self::default_rules(&scoring.video),
        }
    }

    pub fn with_rules(mut self, rules: VideoRules<'a>) -> Self {
        self.rules = rules;
        self
    }

    pub fn default_rules(scoring: &VideoScoring) -> VideoRules<'a> {
        let mut rules: VideoRules<'a> = RuleRegistry::new();
        rules.register(Box::new(TitleImpersonation {
            weight: scoring.title_impersonation,
        }));
        rules.register(Box::new(ScamPhrase {
            weight: scoring.scam_phrase,
        }));
        rules.register(Box::new(ScamKeywords {
            weight: scoring.scam_keywords,
            min_matches: scoring.scam_keyword_min,
        }));
        rules.register(Box::new(UrgencyLanguage {
            weight: scoring.urgency,
            min_matches: scoring.urgency_min,
        }));
        rules.register(Box::new(CryptoAddressOrUrl {
            weight: scoring.crypto_address,
        }));
        rules.register(Box::new(CommentsDisabled {
            weight: scoring.comments_disabled,
        }));
        rules.register(Box::new(LiveStream {
            weight: scoring.live,
        }));
        rules.register(Box::new(EngagementAnomaly {
            weight: scoring.engagement_anomaly,
            min_views: scoring.engagement_min_views,
            max_comments: scoring.engagement_max_comments,
        }));
        rules.register(Box::new(VideoScamDomain {
            known_weight: scoring.known_scam_domain,
            promo_weight: scoring.promo_domain,
        }));
        rules
    }

    pub fn rules(&self) -> &VideoRules<'a> {
        &self.rules
    }

    pub fn context(&self, video: &VideoMetadata) -> VideoContext<'a> {
        let matcher = TextMatcher::new(self.lexicon, self.max_variations);
        VideoContext {
            intent: IntentFlags::classify(self.lexicon, video, self.educational_margin),
            combined_lower: video.combined_text().to_lowercase(),
            title_impersonations: matcher.detect_target_impersonation(&video.title),
            matcher,
        }
    }

    pub fn evaluate<'m>(&self, video: &'m VideoMetadata) -> anyhow::Result<Scored<'m, VideoMetadata>> {
        video.validate()?;

        let context = self.context(video);
        let (mut signals, mut total) = self.rules.evaluate(video, &context);

        if context.intent.educational {
            log::debug!(
                "Video {} classified as educational ({} educational vs {} scam hits, crypto-native: {})",
                video.video_id,
                context.intent.educational_hits,
                context.intent.scam_hits,
                context.intent.crypto_native
            );
            signals.push(EDUCATIONAL_SIGNAL.to_string());
            total = (total - self.educational_discount).max(0.0);
        }

        let result = SignalResult::new(signals, total);
        log::debug!(
            "Video {} scored {:.1} with {} signal(s)",
            video.video_id,
            result.risk_score,
            result.signals.len()
        );

        Ok(Scored::new(video, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;

    fn create_test_lexicon() -> (Lexicon, ScoringConfig) {
        let config = DetectorConfig::default();
        (Lexicon::compile(&config.lexicon).unwrap(), config.scoring)
    }

    fn create_test_video() -> VideoMetadata {
        VideoMetadata {
            video_id: "vid123".to_string(),
            title: "Morning Walk Through the Park".to_string(),
            description: "A relaxing stroll.".to_string(),
            channel_id: "UCwalker".to_string(),
            channel_title: "Walking Tours".to_string(),
            view_count: 500,
            comment_count: 40,
            ..Default::default()
        }
    }

    #[test]
    fn test_benign_video_scores_zero() {
        let (lexicon, scoring) = create_test_lexicon();
        let evaluator = VideoEvaluator::new(&lexicon, &scoring);
        let video = create_test_video();

        let scored = evaluator.evaluate(&video).unwrap();
        assert!(scored.signals().is_empty());
        assert_eq!(scored.risk_score(), 0.0);
    }

    #[test]
    fn test_classic_scam_stream() {
        let (lexicon, scoring) = create_test_lexicon();
        let evaluator = VideoEvaluator::new(&lexicon, &scoring);
        let video = VideoMetadata {
            title: "Tеsla Official Giveaway LIVE".to_string(),
            description: "Send 1 BTC and get 2 BTC back! Limited time, act now. \
                          0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
                .to_string(),
            is_live: true,
            comments_disabled: true,
            view_count: 40_000,
            comment_count: 0,
            ..create_test_video()
        };

        let scored = evaluator.evaluate(&video).unwrap();
        let signals = scored.signals();
        assert_eq!(signals[0], "Title impersonation: Substitution impersonation: tesla");
        assert!(signals.contains(&"High-confidence scam phrase detected".to_string()));
        assert!(signals.contains(&"Multiple scam keywords: giveaway, send, btc".to_string()));
        assert!(signals.contains(&"Urgency language: limited time, act now".to_string()));
        assert!(signals.contains(&"Contains crypto address or suspicious URL".to_string()));
        assert!(signals.contains(&"Comments disabled or restricted".to_string()));
        assert!(signals.contains(&"Currently live streaming".to_string()));
        assert!(signals.contains(&"High views (40,000) but very low engagement".to_string()));
        assert_eq!(scored.risk_score(), 100.0);
    }

    #[test]
    fn test_subject_mention_not_impersonation() {
        let (lexicon, scoring) = create_test_lexicon();
        let evaluator = VideoEvaluator::new(&lexicon, &scoring);

        let video = VideoMetadata {
            title: "SpaceX Starship Launch".to_string(),
            ..create_test_video()
        };
        let scored = evaluator.evaluate(&video).unwrap();
        assert!(scored.signals().is_empty());

        let video = VideoMetadata {
            title: "SpaceX Official Launch".to_string(),
            ..create_test_video()
        };
        let scored = evaluator.evaluate(&video).unwrap();
        assert_eq!(
            scored.signals(),
            &["Title impersonation: Exact match: spacex".to_string()]
        );
        assert_eq!(scored.risk_score(), 25.0);
    }

    #[test]
    fn test_educational_dampening() {
        let (lexicon, scoring) = create_test_lexicon();
        let evaluator = VideoEvaluator::new(&lexicon, &scoring);

        let educational = VideoMetadata {
            title: "Bitcoin Technical Analysis and Price Forecast".to_string(),
            description: "Wallet and investment talk".to_string(),
            comments_disabled: true,
            ..create_test_video()
        };
        let plain = VideoMetadata {
            title: "Bitcoin Stream".to_string(),
            ..educational.clone()
        };

        let educational_scored = evaluator.evaluate(&educational).unwrap();
        let plain_scored = evaluator.evaluate(&plain).unwrap();

        assert_eq!(plain_scored.risk_score(), 35.0);
        assert_eq!(educational_scored.risk_score(), 5.0);
        assert_eq!(
            educational_scored.signals().last().map(String::as_str),
            Some(EDUCATIONAL_SIGNAL)
        );
        assert!(!plain_scored.signals().contains(&EDUCATIONAL_SIGNAL.to_string()));
    }

    #[test]
    fn test_educational_discount_floors_at_zero() {
        let (lexicon, scoring) = create_test_lexicon();
        let evaluator = VideoEvaluator::new(&lexicon, &scoring);
        let video = VideoMetadata {
            title: "Weekly Market Update and News".to_string(),
            is_live: true,
            ..create_test_video()
        };

        let scored = evaluator.evaluate(&video).unwrap();
        assert_eq!(
            scored.signals(),
            &[
                "Currently live streaming".to_string(),
                EDUCATIONAL_SIGNAL.to_string()
            ]
        );
        assert_eq!(scored.risk_score(), 0.0);
    }

    #[test]
    fn test_crypto_native_channel_exemptions() {
        let (lexicon, scoring) = create_test_lexicon();
        let evaluator = VideoEvaluator::new(&lexicon, &scoring);
        let video = VideoMetadata {
            title: "BTC and ETH morning stream".to_string(),
            description: "Get a bonus on the exchange".to_string(),
            channel_title: "Crypto Daily".to_string(),
            ..create_test_video()
        };

        let intent = IntentFlags::classify(&lexicon, &video, 0);
        assert!(intent.crypto_native);
        assert!(intent.educational);

        let scored = evaluator.evaluate(&video).unwrap();
        // Tickers dropped from the keyword count, promo term ignored
        assert!(!scored
            .signals()
            .iter()
            .any(|s| s.starts_with("Multiple scam keywords")));
        assert!(!scored.signals().iter().any(|s| s.starts_with("Promotional domain")));
    }

    #[test]
    fn test_urgency_suppressed_for_educational_content() {
        let (lexicon, scoring) = create_test_lexicon();
        let evaluator = VideoEvaluator::new(&lexicon, &scoring);

        let video = VideoMetadata {
            title: "Live now: hurry, last chance".to_string(),
            ..create_test_video()
        };
        let scored = evaluator.evaluate(&video).unwrap();
        assert_eq!(
            scored.signals(),
            &["Urgency language: live now, hurry".to_string()]
        );

        let video = VideoMetadata {
            title: "Live now: hurry, last chance for news and analysis".to_string(),
            ..create_test_video()
        };
        let scored = evaluator.evaluate(&video).unwrap();
        assert!(!scored.signals().iter().any(|s| s.starts_with("Urgency")));
    }

    #[test]
    fn test_live_cam_engagement_exemption() {
        let (lexicon, scoring) = create_test_lexicon();
        let evaluator = VideoEvaluator::new(&lexicon, &scoring);

        let video = VideoMetadata {
            title: "Harbor Webcam".to_string(),
            view_count: 50_000,
            comment_count: 2,
            ..create_test_video()
        };
        let scored = evaluator.evaluate(&video).unwrap();
        assert!(scored.signals().is_empty());

        let video = VideoMetadata {
            title: "Harbor Tour".to_string(),
            ..video
        };
        let scored = evaluator.evaluate(&video).unwrap();
        assert_eq!(
            scored.signals(),
            &["High views (50,000) but very low engagement".to_string()]
        );
    }

    #[test]
    fn test_video_scam_domains() {
        let (lexicon, scoring) = create_test_lexicon();
        let evaluator = VideoEvaluator::new(&lexicon, &scoring);

        let video = VideoMetadata {
            description: "Register at is.gd/abc".to_string(),
            ..create_test_video()
        };
        let scored = evaluator.evaluate(&video).unwrap();
        assert_eq!(scored.signals(), &["Suspicious domain(s): is.gd".to_string()]);
        assert_eq!(scored.risk_score(), 15.0);

        let video = VideoMetadata {
            description: "Claim your gift card".to_string(),
            ..create_test_video()
        };
        let scored = evaluator.evaluate(&video).unwrap();
        assert_eq!(
            scored.signals(),
            &["Promotional domain (unusual for channel type)".to_string()]
        );
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let (lexicon, scoring) = create_test_lexicon();
        let evaluator = VideoEvaluator::new(&lexicon, &scoring);
        let video = VideoMetadata {
            title: "Elon Musk LIVE: double your BTC".to_string(),
            description: "giveaway wallet bonus bit.ly/xyz".to_string(),
            is_live: true,
            ..create_test_video()
        };

        let first = evaluator.evaluate(&video).unwrap();
        let second = evaluator.evaluate(&video).unwrap();
        assert_eq!(first.result, second.result);
    }

    #[test]
    fn test_custom_rule_set() {
        let (lexicon, scoring) = create_test_lexicon();
        let mut rules = VideoEvaluator::default_rules(&scoring.video);
        assert!(rules.remove("live_stream"));
        let evaluator = VideoEvaluator::new(&lexicon, &scoring).with_rules(rules);

        let video = VideoMetadata {
            is_live: true,
            ..create_test_video()
        };
        let scored = evaluator.evaluate(&video).unwrap();
        assert!(scored.signals().is_empty());
        assert_eq!(evaluator.rules().len(), 8);
    }
}
