//! Compiled, read-only lexicon shared by every evaluator.
//!
//! Built once from [`LexiconConfig`] at startup. Regular expressions are
//! compiled here so that evaluation never touches the regex compiler and
//! never fails on a bad pattern.

use crate::config::LexiconConfig;
use anyhow::Context;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug)]
pub struct Lexicon {
    pub targets: Vec<String>,
    pub short_tickers: Vec<(String, Regex)>,
    /// Lowercase character and its replacements, in priority order
    pub substitutions: Vec<(char, Vec<String>)>,
    pub scam_keywords: Vec<String>,
    pub generic_ticker_keywords: Vec<String>,
    pub critical_keywords: Vec<String>,
    pub channel_crypto_keywords: Vec<String>,
    pub urgency_phrases: Vec<String>,
    pub scam_phrases: Vec<(String, Regex)>,
    pub crypto_addresses: Vec<Regex>,
    pub shorteners: Vec<Regex>,
    pub scam_context_keywords: Vec<String>,
    pub known_scam_domains: Vec<String>,
    pub promo_domain_terms: Vec<String>,
    pub trusted_channels: HashSet<String>,
    pub educational_keywords: Vec<String>,
    pub crypto_native_indicators: Vec<String>,
    pub impersonation_claim_words: Vec<String>,
    pub live_cam_indicators: Vec<String>,
    pub topic_mapping: BTreeMap<String, String>,
    pub safe_topics: Vec<String>,
    pub trusted_topics: Vec<String>,
}

fn compile(pattern: &str, kind: &str) -> anyhow::Result<Regex> {
    Regex::new(pattern).with_context(|| format!("Invalid {kind} pattern: {pattern}"))
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

impl Lexicon {
    pub fn compile(config: &LexiconConfig) -> anyhow::Result<Self> {
        let short_tickers = config
            .short_tickers
            .iter()
            .map(|term| {
                let term = term.to_lowercase();
                let regex = compile(&format!(r"(?i)\b{}\b", regex::escape(&term)), "ticker")?;
                Ok((term, regex))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let scam_phrases = config
            .scam_phrase_patterns
            .iter()
            .map(|p| Ok((p.clone(), compile(p, "scam phrase")?)))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let crypto_addresses = config
            .crypto_address_patterns
            .iter()
            .map(|p| compile(p, "crypto address"))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let shorteners = config
            .shortener_patterns
            .iter()
            .map(|p| compile(&format!("(?i){p}"), "URL shortener"))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let substitutions = config
            .substitutions
            .iter()
            .flat_map(|sub| sub.from.to_lowercase().map(move |lower| (lower, sub.to.clone())))
            .collect();

        Ok(Self {
            targets: config.all_targets(),
            short_tickers,
            substitutions,
            scam_keywords: lowercase_all(&config.scam_keywords),
            generic_ticker_keywords: lowercase_all(&config.generic_ticker_keywords),
            critical_keywords: lowercase_all(&config.critical_keywords),
            channel_crypto_keywords: lowercase_all(&config.channel_crypto_keywords),
            urgency_phrases: lowercase_all(&config.urgency_phrases),
            scam_phrases,
            crypto_addresses,
            shorteners,
            scam_context_keywords: lowercase_all(&config.scam_context_keywords),
            known_scam_domains: lowercase_all(&config.known_scam_domains),
            promo_domain_terms: lowercase_all(&config.promo_domain_terms),
            trusted_channels: config.trusted_channels.iter().cloned().collect(),
            educational_keywords: lowercase_all(&config.educational_keywords),
            crypto_native_indicators: lowercase_all(&config.crypto_native_indicators),
            impersonation_claim_words: lowercase_all(&config.impersonation_claim_words),
            live_cam_indicators: lowercase_all(&config.live_cam_indicators),
            topic_mapping: config.topic_mapping.clone(),
            safe_topics: config.safe_topics.clone(),
            trusted_topics: config.trusted_topics.clone(),
        })
    }

    pub fn is_trusted_channel(&self, channel_id: &str) -> bool {
        self.trusted_channels.contains(channel_id)
    }

    /// Map a topic-category label (usually a Wikipedia URL) to a coarse category.
    pub fn map_topic(&self, url: &str) -> String {
        if url.is_empty() {
            return "Unknown".to_string();
        }
        let topic = url.rsplit('/').next().unwrap_or(url);
        self.topic_mapping
            .get(topic)
            .cloned()
            .unwrap_or_else(|| topic.to_string())
    }
}

/// Keywords from `keywords` contained in the already-lowercased `text`, in lexicon order.
pub fn keyword_hits<'k>(text_lower: &str, keywords: &'k [String]) -> Vec<&'k str> {
    keywords
        .iter()
        .filter(|kw| text_lower.contains(kw.as_str()))
        .map(String::as_str)
        .collect()
}
