use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Visually confusable replacements for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharSubstitution {
    pub from: char,
    pub to: Vec<String>,
}

/// Top-level detector configuration, loaded once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub lexicon: LexiconConfig,
    pub scoring: ScoringConfig,
}

/// Word lists and patterns consulted by the matcher and the evaluators.
///
/// All plain-text entries are compared against lowercased input, so they
/// should be written in lowercase. Impersonation targets keep their original
/// casing for display in signal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    pub crypto_figures: Vec<String>,
    pub tech_brands: Vec<String>,
    pub crypto_projects: Vec<String>,
    /// Short tickers only matched on whole-word boundaries
    pub short_tickers: Vec<String>,
    /// Confusable replacements per lowercase character, in priority order
    pub substitutions: Vec<CharSubstitution>,
    pub scam_keywords: Vec<String>,
    /// Scam keywords ignored for crypto-native channels
    pub generic_ticker_keywords: Vec<String>,
    /// Narrower keyword set used by the critical composite rule
    pub critical_keywords: Vec<String>,
    pub channel_crypto_keywords: Vec<String>,
    pub urgency_phrases: Vec<String>,
    pub scam_phrase_patterns: Vec<String>,
    pub crypto_address_patterns: Vec<String>,
    pub shortener_patterns: Vec<String>,
    pub scam_context_keywords: Vec<String>,
    pub known_scam_domains: Vec<String>,
    pub promo_domain_terms: Vec<String>,
    pub trusted_channels: Vec<String>,
    pub educational_keywords: Vec<String>,
    pub crypto_native_indicators: Vec<String>,
    pub impersonation_claim_words: Vec<String>,
    pub live_cam_indicators: Vec<String>,
    /// Wikipedia topic URL suffix -> coarse category
    pub topic_mapping: BTreeMap<String, String>,
    pub safe_topics: Vec<String>,
    pub trusted_topics: Vec<String>,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        let substitutions = [
            ('l', vec!["1", "i", "|", "ı"]),
            ('a', vec!["@", "4", "α", "а"]),
            ('e', vec!["3", "ε", "е"]),
            ('i', vec!["1", "l", "|", "ı", "і"]),
            ('o', vec!["0", "ο", "о"]),
            ('s', vec!["5", "$", "ѕ"]),
            ('c', vec!["с"]),
            ('p', vec!["р"]),
            ('x', vec!["х"]),
            ('y', vec!["у"]),
        ]
        .into_iter()
        .map(|(from, to)| CharSubstitution { from, to: strings(&to) })
        .collect();

        let topic_mapping = [
            ("Video_game_culture", "Gaming"),
            ("Action_game", "Gaming"),
            ("Role-playing_video_game", "Gaming"),
            ("Strategy_video_game", "Gaming"),
            ("Music", "Music"),
            ("Pop_music", "Music"),
            ("Rock_music", "Music"),
            ("Hip_hop_music", "Music"),
            ("Film", "Entertainment"),
            ("Entertainment", "Entertainment"),
            ("Lifestyle_(sociology)", "Lifestyle"),
            ("Fashion", "Lifestyle"),
            ("Beauty", "Lifestyle"),
            ("Food", "Lifestyle"),
            ("Technology", "Tech"),
            ("Society", "Society"),
            ("Knowledge", "Education"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            crypto_figures: strings(&[
                "elon musk",
                "vitalik buterin",
                "michael saylor",
                "cz",
                "changpeng zhao",
                "brian armstrong",
                "cathie wood",
                "vitalik",
                "buterin",
            ]),
            tech_brands: strings(&[
                "tesla",
                "spacex",
                "apple",
                "microsoft",
                "nvidia",
                "google",
                "meta",
                "amazon",
                "openai",
            ]),
            crypto_projects: strings(&[
                "ethereum", "bitcoin", "binance", "coinbase", "ripple", "cardano", "solana",
                "polygon",
            ]),
            short_tickers: strings(&["eth", "btc", "bnb", "ada", "sol", "xrp"]),
            substitutions,
            scam_keywords: strings(&[
                "giveaway",
                "double",
                "send",
                "receive",
                "btc",
                "eth",
                "cryptocurrency",
                "free crypto",
                "investment",
                "wallet",
                "airdrop",
                "bonus",
            ]),
            generic_ticker_keywords: strings(&["btc", "eth", "cryptocurrency"]),
            critical_keywords: strings(&["crypto", "giveaway", "double", "send"]),
            channel_crypto_keywords: strings(&[
                "crypto", "bitcoin", "ethereum", "wallet", "giveaway", "btc", "eth",
            ]),
            urgency_phrases: strings(&[
                "live now",
                "ending soon",
                "limited time",
                "hurry",
                "last chance",
                "only today",
                "expires",
                "don't miss",
                "act now",
                "urgent",
            ]),
            scam_phrase_patterns: strings(&[
                r"send\s+\d+.*get\s+\d+.*back",
                r"double\s+your\s+(btc|eth|crypto)",
                r"guaranteed\s+returns?",
                r"limited\s+time\s+crypto\s+giveaway",
                r"elon\s+musk\s+(live\s+)?giveaway",
                r"send\s+\d+\s+(btc|eth).*receive\s+\d+",
            ]),
            crypto_address_patterns: strings(&[
                r"[13][a-km-zA-HJ-NP-Z1-9]{25,34}",
                r"0x[a-fA-F0-9]{40}",
                r"bc1[a-z0-9]{39,59}",
            ]),
            shortener_patterns: strings(&[
                r"bit\.ly",
                r"tinyurl",
                r"goo\.gl",
                r"\bt\.co\b",
                r"ow\.ly",
            ]),
            scam_context_keywords: strings(&[
                "giveaway", "double", "free", "bonus", "elon", "tesla",
            ]),
            known_scam_domains: strings(&["telegra.ph", "tiny.cc", "is.gd"]),
            promo_domain_terms: strings(&["gift", "bonus", "promo"]),
            trusted_channels: strings(&[
                "UCUMZ7gohGI9pU35BDk8lfVA", // Bloomberg Markets and Finance
                "UCEAZeUIeJs0IjQiqTCdVSIg", // Yahoo Finance
                "UC4R8DWoMoI7CAwX8_LjQHig", // LiveNOW from FOX
                "UCW39zufHfsuGgpLviKh297Q", // DW News
                "UCvJJ_dzjViJCoLf5uKUTwoA", // CNBC
                "UCBi2mrWuNuyYy4gbM6fU18Q", // ABC News
                "UCXIJgqnII2ZOINSWNOGFThg", // Fox News
                "UC16niRr50-MSBwiO3YDb3RA", // BBC News
                "UChOcfkM4395an2d_i539-HQ", // CoinDesk
                "UCFwMITSkc1Fms6PoJoh1OUQ", // LabPadre Space
                "UCWCEYVwSqr7Epo6sSCfUgiw", // MIRROR NOW
                "UC9-uZt8l6LaZUKuuEz6VF6w", // Day Trading with Matt
            ]),
            educational_keywords: strings(&[
                "analysis",
                "market update",
                "trading strategy",
                "technical analysis",
                "chart",
                "forecast",
                "prediction",
                "news",
                "interview",
                "documentary",
                "review",
                "tutorial",
                "explained",
                "breakdown",
                "discussion",
                "panel",
                "conference",
                "summit",
                "podcast",
                "signals",
                "liquidation",
                "watchlist",
                "trader",
                "trading",
                "ta ",
                "swing",
                "day trading",
                "price action",
            ]),
            crypto_native_indicators: strings(&[
                "crypto",
                "bitcoin",
                "ethereum",
                "blockchain",
                "trading",
                "trader",
                "defi",
                "nft",
                "altcoin",
                "hodl",
            ]),
            impersonation_claim_words: strings(&["official", "giveaway", "gift"]),
            live_cam_indicators: strings(&["cam", "24/7", "sentinel", "rover", "live view"]),
            topic_mapping,
            safe_topics: strings(&["Gaming", "Music", "Entertainment", "Lifestyle"]),
            trusted_topics: strings(&["Tech", "Society", "Education"]),
        }
    }
}

impl LexiconConfig {
    /// Every impersonation target: figures, then brands, then projects.
    pub fn all_targets(&self) -> Vec<String> {
        self.crypto_figures
            .iter()
            .chain(&self.tech_brands)
            .chain(&self.crypto_projects)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Hard cap on confusable variants generated per target
    pub max_variations: usize,
    pub channel: ChannelScoring,
    pub video: VideoScoring,
    pub composite: CompositeScoring,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_variations: 100,
            channel: ChannelScoring::default(),
            video: VideoScoring::default(),
            composite: CompositeScoring::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelScoring {
    pub name_impersonation: f64,
    pub handle_mismatch: f64,
    pub dormant_account: f64,
    pub dormant_min_age_days: i64,
    pub dormant_max_videos: u64,
    pub inflated_subscribers: f64,
    pub inflated_min_subscribers: u64,
    pub inflated_max_videos: u64,
    pub hidden_subscribers: f64,
    pub crypto_heavy_description: f64,
    pub crypto_keyword_min: usize,
    pub known_scam_domain: f64,
    pub promo_domain: f64,
    pub topic_mismatch: f64,
}

impl Default for ChannelScoring {
    fn default() -> Self {
        Self {
            name_impersonation: 30.0,
            handle_mismatch: 25.0,
            dormant_account: 20.0,
            dormant_min_age_days: 365,
            dormant_max_videos: 10,
            inflated_subscribers: 20.0,
            inflated_min_subscribers: 10_000,
            inflated_max_videos: 5,
            hidden_subscribers: 10.0,
            crypto_heavy_description: 10.0,
            crypto_keyword_min: 3,
            known_scam_domain: 15.0,
            promo_domain: 10.0,
            topic_mismatch: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoScoring {
    pub title_impersonation: f64,
    pub scam_phrase: f64,
    pub scam_keywords: f64,
    pub scam_keyword_min: usize,
    pub urgency: f64,
    pub urgency_min: usize,
    pub crypto_address: f64,
    pub comments_disabled: f64,
    pub live: f64,
    pub engagement_anomaly: f64,
    pub engagement_min_views: u64,
    pub engagement_max_comments: u64,
    pub known_scam_domain: f64,
    pub promo_domain: f64,
    /// Educational hits must exceed scam hits by more than this margin
    pub educational_margin: usize,
    pub educational_discount: f64,
}

impl Default for VideoScoring {
    fn default() -> Self {
        Self {
            title_impersonation: 25.0,
            scam_phrase: 35.0,
            scam_keywords: 15.0,
            scam_keyword_min: 2,
            urgency: 10.0,
            urgency_min: 2,
            crypto_address: 25.0,
            comments_disabled: 20.0,
            live: 5.0,
            engagement_anomaly: 15.0,
            engagement_min_views: 1000,
            engagement_max_comments: 10,
            known_scam_domain: 15.0,
            promo_domain: 10.0,
            educational_margin: 0,
            educational_discount: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeScoring {
    pub channel_blend: f64,
    pub high_threshold: f64,
    pub medium_threshold: f64,
    pub critical_confidence: f64,
    pub trusted_confidence: f64,
    pub high_confidence: (f64, f64),
    pub medium_confidence: (f64, f64),
    /// Minimum total score for a record to count as a detection in batch output.
    pub detection_threshold: f64,
}

impl Default for CompositeScoring {
    fn default() -> Self {
        Self {
            channel_blend: 0.5,
            high_threshold: 70.0,
            medium_threshold: 40.0,
            critical_confidence: 0.95,
            trusted_confidence: 1.0,
            high_confidence: (0.75, 0.90),
            medium_confidence: (0.50, 0.75),
            detection_threshold: 30.0,
        }
    }
}

impl DetectorConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: DetectorConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {path}"))?;
        Ok(())
    }

    /// Load from `path` if it exists, otherwise fall back to the built-in defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::from_file(path)
        } else {
            log::warn!("Configuration file '{path}' not found, using default configuration");
            Ok(Self::default())
        }
    }

    /// Check numeric settings for consistency. Pattern syntax is checked when
    /// the lexicon is compiled.
    pub fn validate(&self) -> anyhow::Result<()> {
        let scoring = &self.scoring;
        if scoring.max_variations == 0 {
            bail!("scoring.max_variations must be greater than zero");
        }

        let composite = &scoring.composite;
        if composite.channel_blend < 0.0 {
            bail!("scoring.composite.channel_blend must not be negative");
        }
        if !(0.0..=100.0).contains(&composite.medium_threshold)
            || !(0.0..=100.0).contains(&composite.high_threshold)
            || composite.medium_threshold >= composite.high_threshold
        {
            bail!(
                "scoring.composite thresholds must satisfy 0 <= medium ({}) < high ({}) <= 100",
                composite.medium_threshold,
                composite.high_threshold
            );
        }

        if !(0.0..=100.0).contains(&composite.detection_threshold) {
            bail!(
                "scoring.composite.detection_threshold must be within [0, 100], got {}",
                composite.detection_threshold
            );
        }

        let confidences = [
            ("critical_confidence", composite.critical_confidence),
            ("trusted_confidence", composite.trusted_confidence),
            ("high_confidence.0", composite.high_confidence.0),
            ("high_confidence.1", composite.high_confidence.1),
            ("medium_confidence.0", composite.medium_confidence.0),
            ("medium_confidence.1", composite.medium_confidence.1),
        ];
        for (name, value) in confidences {
            if !(0.0..=1.0).contains(&value) {
                bail!("scoring.composite.{name} must be within [0, 1], got {value}");
            }
        }

        if self.lexicon.all_targets().is_empty() {
            bail!("lexicon must define at least one impersonation target");
        }

        Ok(())
    }
}
