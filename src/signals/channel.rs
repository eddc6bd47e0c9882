use super::{RuleHit, RuleRegistry, Scored, SignalResult, SignalRule};
use crate::config::{ChannelScoring, ScoringConfig};
use crate::lexicon::{keyword_hits, Lexicon};
use crate::matcher::TextMatcher;
use crate::metadata::{format_count, ChannelMetadata};
use chrono::{DateTime, Utc};

pub const TRUSTED_CHANNEL_SIGNAL: &str = "Trusted Channel (Whitelisted)";

/// Values shared by every channel rule for one evaluation.
pub struct ChannelContext<'a> {
    pub matcher: TextMatcher<'a>,
    /// Impersonation matches in the channel title
    pub impersonations: Vec<String>,
    pub account_age_days: i64,
    /// Topic categories mapped to coarse names
    pub topics: Vec<String>,
}

pub type ChannelRules<'a> = RuleRegistry<ChannelMetadata, ChannelContext<'a>>;

pub struct NameImpersonation {
    pub weight: f64,
}

impl<'a> SignalRule<ChannelMetadata, ChannelContext<'a>> for NameImpersonation {
    fn evaluate(&self, _channel: &ChannelMetadata, ctx: &ChannelContext<'a>) -> Option<RuleHit> {
        if ctx.impersonations.is_empty() {
            return None;
        }
        Some(RuleHit::new(
            self.weight,
            format!("Name impersonation: {}", ctx.impersonations.join(", ")),
        ))
    }

    fn name(&self) -> &str {
        "name_impersonation"
    }
}

/// The display title names a brand the immutable handle does not, which is
/// what a hijacked and renamed account looks like.
pub struct HandleMismatch {
    pub weight: f64,
}

impl HandleMismatch {
    pub fn is_mismatch(title: &str, handle: &str, targets: &[String]) -> bool {
        let handle = handle.to_lowercase().replace(['@', '/'], "");
        let title = title.to_lowercase().replace([' ', '-'], "");

        if handle.contains(&title) || title.contains(&handle) {
            return false;
        }

        let brands: Vec<String> = targets
            .iter()
            .map(|t| t.to_lowercase().replace(' ', ""))
            .filter(|t| !t.is_empty())
            .collect();
        let title_has_brand = brands.iter().any(|b| title.contains(b.as_str()));
        let handle_has_brand = brands.iter().any(|b| handle.contains(b.as_str()));

        title_has_brand && !handle_has_brand
    }
}

impl<'a> SignalRule<ChannelMetadata, ChannelContext<'a>> for HandleMismatch {
    fn evaluate(&self, channel: &ChannelMetadata, ctx: &ChannelContext<'a>) -> Option<RuleHit> {
        let handle = channel
            .custom_handle
            .as_deref()
            .or(channel.handle.as_deref())
            .filter(|h| !h.trim().is_empty())?;

        if Self::is_mismatch(&channel.channel_title, handle, &ctx.matcher.lexicon().targets) {
            Some(RuleHit::new(
                self.weight,
                "Handle-name mismatch (possible hijack)",
            ))
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "handle_mismatch"
    }
}

pub struct DormantAccount {
    pub weight: f64,
    pub min_age_days: i64,
    pub max_videos: u64,
}

impl<'a> SignalRule<ChannelMetadata, ChannelContext<'a>> for DormantAccount {
    fn evaluate(&self, channel: &ChannelMetadata, ctx: &ChannelContext<'a>) -> Option<RuleHit> {
        if ctx.account_age_days > self.min_age_days && channel.video_count < self.max_videos {
            Some(RuleHit::new(
                self.weight,
                format!(
                    "Old account ({} days) with minimal content",
                    ctx.account_age_days
                ),
            ))
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "dormant_account"
    }
}

pub struct InflatedSubscribers {
    pub weight: f64,
    pub min_subscribers: u64,
    pub max_videos: u64,
}

impl<'a> SignalRule<ChannelMetadata, ChannelContext<'a>> for InflatedSubscribers {
    fn evaluate(&self, channel: &ChannelMetadata, _ctx: &ChannelContext<'a>) -> Option<RuleHit> {
        if channel.subscriber_count > self.min_subscribers && channel.video_count < self.max_videos
        {
            Some(RuleHit::new(
                self.weight,
                format!(
                    "High subscribers ({}) but minimal content",
                    format_count(channel.subscriber_count)
                ),
            ))
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "inflated_subscribers"
    }
}

pub struct HiddenSubscribers {
    pub weight: f64,
}

impl<'a> SignalRule<ChannelMetadata, ChannelContext<'a>> for HiddenSubscribers {
    fn evaluate(&self, channel: &ChannelMetadata, _ctx: &ChannelContext<'a>) -> Option<RuleHit> {
        channel
            .hidden_subscriber_count
            .then(|| RuleHit::new(self.weight, "Subscriber count hidden"))
    }

    fn name(&self) -> &str {
        "hidden_subscribers"
    }
}

pub struct CryptoHeavyDescription {
    pub weight: f64,
    pub min_keywords: usize,
}

impl<'a> SignalRule<ChannelMetadata, ChannelContext<'a>> for CryptoHeavyDescription {
    fn evaluate(&self, channel: &ChannelMetadata, ctx: &ChannelContext<'a>) -> Option<RuleHit> {
        let description = channel.description.to_lowercase();
        let mentions = keyword_hits(
            &description,
            &ctx.matcher.lexicon().channel_crypto_keywords,
        )
        .len();

        if mentions >= self.min_keywords {
            Some(RuleHit::new(
                self.weight,
                format!("Crypto-heavy description ({mentions} keywords)"),
            ))
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "crypto_heavy_description"
    }
}

/// Known scam domains always count; generic promo terms only alongside
/// title impersonation.
pub struct ChannelScamDomain {
    pub known_weight: f64,
    pub promo_weight: f64,
}

impl<'a> SignalRule<ChannelMetadata, ChannelContext<'a>> for ChannelScamDomain {
    fn evaluate(&self, channel: &ChannelMetadata, ctx: &ChannelContext<'a>) -> Option<RuleHit> {
        let (has_scam_domain, domains) = ctx.matcher.matches_known_scam_domain(&channel.description);
        if has_scam_domain {
            return Some(RuleHit::new(
                self.known_weight,
                format!("Known scam domain(s): {}", domains.join(", ")),
            ));
        }

        if !ctx.impersonations.is_empty() && ctx.matcher.contains_promo_domain(&channel.description)
        {
            return Some(RuleHit::new(
                self.promo_weight,
                "Promotional domain with impersonation",
            ));
        }

        None
    }

    fn name(&self) -> &str {
        "scam_domain"
    }
}

/// A gaming/music/lifestyle channel impersonating a crypto or tech figure.
pub struct TopicMismatch {
    pub weight: f64,
}

impl<'a> SignalRule<ChannelMetadata, ChannelContext<'a>> for TopicMismatch {
    fn evaluate(&self, _channel: &ChannelMetadata, ctx: &ChannelContext<'a>) -> Option<RuleHit> {
        if ctx.topics.is_empty() || ctx.impersonations.is_empty() {
            return None;
        }

        let lexicon = ctx.matcher.lexicon();
        let has_safe_topic = ctx.topics.iter().any(|t| lexicon.safe_topics.contains(t));
        let has_trusted_topic = ctx.topics.iter().any(|t| lexicon.trusted_topics.contains(t));

        if has_safe_topic && !has_trusted_topic {
            Some(RuleHit::new(
                self.weight,
                format!(
                    "Topic Mismatch (Possible Hijack): {} channel streaming crypto",
                    ctx.topics.join(", ")
                ),
            ))
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "topic_mismatch"
    }
}

/// Scores channel metadata against the channel rule set.
pub struct ChannelEvaluator<'a> {
    lexicon: &'a Lexicon,
    max_variations: usize,
    rules: ChannelRules<'a>,
}

impl<'a> ChannelEvaluator<'a> {
    pub fn new(lexicon: &'a Lexicon, scoring: &ScoringConfig) -> Self {
        Self::with_rules(
            lexicon,
            scoring.max_variations,
            Self::default_rules(&scoring.channel),
        )
    }

    pub fn with_rules(lexicon: &'a Lexicon, max_variations: usize, rules: ChannelRules<'a>) -> Self {
        Self {
            lexicon,
            max_variations,
            rules,
        }
    }

    pub fn default_rules(scoring: &ChannelScoring) -> ChannelRules<'a> {
        let mut rules: ChannelRules<'a> = RuleRegistry::new();
        rules.register(Box::new(NameImpersonation {
            weight: scoring.name_impersonation,
        }));
        rules.register(Box::new(HandleMismatch {
            weight: scoring.handle_mismatch,
        }));
        rules.register(Box::new(DormantAccount {
            weight: scoring.dormant_account,
            min_age_days: scoring.dormant_min_age_days,
            max_videos: scoring.dormant_max_videos,
        }));
        rules.register(Box::new(InflatedSubscribers {
            weight: scoring.inflated_subscribers,
            min_subscribers: scoring.inflated_min_subscribers,
            max_videos: scoring.inflated_max_videos,
        }));
        rules.register(Box::new(HiddenSubscribers {
            weight: scoring.hidden_subscribers,
        }));
        rules.register(Box::new(CryptoHeavyDescription {
            weight: scoring.crypto_heavy_description,
            min_keywords: scoring.crypto_keyword_min,
        }));
        rules.register(Box::new(ChannelScamDomain {
            known_weight: scoring.known_scam_domain,
            promo_weight: scoring.promo_domain,
        }));
        rules.register(Box::new(TopicMismatch {
            weight: scoring.topic_mismatch,
        }));
        rules
    }

    pub fn rules(&self) -> &ChannelRules<'a> {
        &self.rules
    }

    pub fn context(&self, channel: &ChannelMetadata, now: DateTime<Utc>) -> ChannelContext<'a> {
        let matcher = TextMatcher::new(self.lexicon, self.max_variations);
        ChannelContext {
            impersonations: matcher.detect_target_impersonation(&channel.channel_title),
            account_age_days: channel.account_age_days(now),
            topics: channel
                .topic_categories
                .iter()
                .map(|t| self.lexicon.map_topic(t))
                .collect(),
            matcher,
        }
    }

    /// Score `channel` as of `now`. Trusted channels short-circuit to zero risk.
    pub fn evaluate<'m>(
        &self,
        channel: &'m ChannelMetadata,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Scored<'m, ChannelMetadata>> {
        channel.validate()?;

        if self.lexicon.is_trusted_channel(&channel.channel_id) {
            log::debug!("Channel {} is whitelisted", channel.channel_id);
            return Ok(Scored::new(
                channel,
                SignalResult::new(vec![TRUSTED_CHANNEL_SIGNAL.to_string()], 0.0),
            ));
        }

        let context = self.context(channel, now);
        let (signals, total) = self.rules.evaluate(channel, &context);
        let result = SignalResult::new(signals, total);

        log::debug!(
            "Channel {} scored {:.1} with {} signal(s)",
            channel.channel_id,
            result.risk_score,
            result.signals.len()
        );

        Ok(Scored::new(channel, result))
    }
}
