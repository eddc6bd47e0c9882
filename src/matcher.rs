use crate::lexicon::{keyword_hits, Lexicon};
use std::collections::HashSet;

/// Impersonation and scam-pattern detection over free text.
#[derive(Debug, Clone, Copy)]
pub struct TextMatcher<'a> {
    lexicon: &'a Lexicon,
    max_variations: usize,
}

impl<'a> TextMatcher<'a> {
    pub fn new(lexicon: &'a Lexicon, max_variations: usize) -> Self {
        Self {
            lexicon,
            max_variations,
        }
    }

    pub fn lexicon(&self) -> &'a Lexicon {
        self.lexicon
    }

    /// Detect impersonation of the lexicon's targets in `text`.
    pub fn detect_target_impersonation(&self, text: &str) -> Vec<String> {
        self.detect_impersonation(text, &self.lexicon.targets)
    }

    /// Report each target found in `text`, either verbatim (case-insensitive)
    /// or through a confusable-character variant, followed by any short
    /// tickers that appear as whole words.
    pub fn detect_impersonation(&self, text: &str, targets: &[String]) -> Vec<String> {
        let mut detections = Vec::new();
        let text_lower = text.to_lowercase();

        for target in targets {
            let target_lower = target.to_lowercase();
            if target_lower.is_empty() {
                continue;
            }

            if text_lower.contains(&target_lower) {
                detections.push(format!("Exact match: {target}"));
                continue;
            }

            if self
                .substitution_variants(&target_lower)
                .iter()
                .any(|variant| text_lower.contains(variant.as_str()))
            {
                detections.push(format!("Substitution impersonation: {target}"));
            }
        }

        for (term, pattern) in &self.lexicon.short_tickers {
            if pattern.is_match(&text_lower) {
                detections.push(format!("Exact match: {term}"));
            }
        }

        detections
    }

    /// Generate confusable spellings of `text` (which should be lowercase).
    ///
    /// Every occurrence of a substitutable character is replaced at once.
    /// Each character class is first applied on its own to `text`, in table
    /// order, so long targets still get every class before the cap. Classes
    /// are then compounded on the variants produced so far. The original text
    /// is always the first entry and the result never grows past
    /// `max_variations`.
    pub fn substitution_variants(&self, text: &str) -> Vec<String> {
        let cap = self.max_variations;
        let mut variants = vec![text.to_string()];
        let mut seen: HashSet<String> = variants.iter().cloned().collect();

        let classes: Vec<&(char, Vec<String>)> = self
            .lexicon
            .substitutions
            .iter()
            .filter(|(ch, _)| text.contains(*ch))
            .collect();

        for (ch, substitutes) in &classes {
            for substitute in substitutes {
                if variants.len() >= cap {
                    return variants;
                }
                let candidate = text.replace(*ch, substitute);
                if seen.insert(candidate.clone()) {
                    variants.push(candidate);
                }
            }
        }

        for (ch, substitutes) in &classes {
            let mut new_variants = Vec::new();
            'fill: for variant in &variants {
                for substitute in substitutes {
                    if variants.len() + new_variants.len() >= cap {
                        break 'fill;
                    }
                    let candidate = variant.replace(*ch, substitute);
                    if seen.insert(candidate.clone()) {
                        new_variants.push(candidate);
                    }
                }
            }
            variants.extend(new_variants);
        }

        variants
    }

    pub fn detect_urgency_language(&self, text: &str) -> (bool, Vec<String>) {
        let text_lower = text.to_lowercase();
        let found: Vec<String> = keyword_hits(&text_lower, &self.lexicon.urgency_phrases)
            .into_iter()
            .map(str::to_string)
            .collect();
        (!found.is_empty(), found)
    }

    /// Returns the scam-phrase patterns that match `text`.
    pub fn detect_high_confidence_scam_phrase(&self, text: &str) -> (bool, Vec<String>) {
        let text_lower = text.to_lowercase();
        let found: Vec<String> = self
            .lexicon
            .scam_phrases
            .iter()
            .filter(|(_, regex)| regex.is_match(&text_lower))
            .map(|(pattern, _)| pattern.clone())
            .collect();
        (!found.is_empty(), found)
    }

    /// Shape-only match for BTC (base58 and bech32) and Ethereum addresses.
    pub fn contains_crypto_address(&self, text: &str) -> bool {
        self.lexicon
            .crypto_addresses
            .iter()
            .any(|regex| regex.is_match(text))
    }

    /// A shortened URL only counts when scam-context wording appears in the same text.
    pub fn contains_suspicious_url(&self, text: &str) -> bool {
        let has_shortener = self.lexicon.shorteners.iter().any(|r| r.is_match(text));
        if !has_shortener {
            return false;
        }

        let text_lower = text.to_lowercase();
        !keyword_hits(&text_lower, &self.lexicon.scam_context_keywords).is_empty()
    }

    pub fn matches_known_scam_domain(&self, text: &str) -> (bool, Vec<String>) {
        let text_lower = text.to_lowercase();
        let found: Vec<String> = keyword_hits(&text_lower, &self.lexicon.known_scam_domains)
            .into_iter()
            .map(str::to_string)
            .collect();
        (!found.is_empty(), found)
    }

    pub fn contains_promo_domain(&self, text: &str) -> bool {
        let text_lower = text.to_lowercase();
        !keyword_hits(&text_lower, &self.lexicon.promo_domain_terms).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LexiconConfig;

    fn create_test_lexicon() -> Lexicon {
        Lexicon::compile(&LexiconConfig::default()).unwrap()
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let lexicon = create_test_lexicon();
        let matcher = TextMatcher::new(&lexicon, 100);

        let detections = matcher.detect_impersonation("TESLA Live Event", &lexicon.targets);
        assert_eq!(detections, vec!["Exact match: tesla"]);
    }

    #[test]
    fn test_homoglyph_substitution_detected() {
        let lexicon = create_test_lexicon();
        let matcher = TextMatcher::new(&lexicon, 100);
        let targets = vec!["Tesla".to_string()];

        // Cyrillic "е"
        let detections = matcher.detect_impersonation("Tеsla Giveaway Live", &targets);
        assert_eq!(detections, vec!["Substitution impersonation: Tesla"]);

        let detections = matcher.detect_impersonation("T3SLA giveaway", &targets);
        assert_eq!(detections, vec!["Substitution impersonation: Tesla"]);
    }

    #[test]
    fn test_short_ticker_requires_word_boundary() {
        let lexicon = create_test_lexicon();
        let matcher = TextMatcher::new(&lexicon, 100);

        let detections = matcher.detect_impersonation("a new method for baking bread", &[]);
        assert!(detections.is_empty());

        let detections = matcher.detect_impersonation("send eth now", &[]);
        assert_eq!(detections, vec!["Exact match: eth"]);

        let detections = matcher.detect_impersonation("Solar panels and Adam", &[]);
        assert!(detections.is_empty());
    }

    #[test]
    fn test_variant_generation_is_bounded_and_deterministic() {
        let lexicon = create_test_lexicon();
        let matcher = TextMatcher::new(&lexicon, 100);

        let first = matcher.substitution_variants("vitalik buterin");
        let second = matcher.substitution_variants("vitalik buterin");
        assert_eq!(first, second);
        assert!(first.len() <= 100);
        assert_eq!(first[0], "vitalik buterin");

        let small = TextMatcher::new(&lexicon, 5);
        assert_eq!(small.substitution_variants("solana").len(), 5);

        let plain = matcher.substitution_variants("zzz");
        assert_eq!(plain, vec!["zzz"]);
    }

    #[test]
    fn test_every_class_tried_before_cap_on_long_targets() {
        let lexicon = create_test_lexicon();
        let matcher = TextMatcher::new(&lexicon, 100);

        let variants = matcher.substitution_variants("michael saylor");
        assert_eq!(variants.len(), 100);
        assert!(variants.contains(&"michae1 say1or".to_string()));
        assert!(variants.contains(&"michael $aylor".to_string()));
        assert!(variants.contains(&"michael sayl0r".to_string()));

        let targets = vec!["michael saylor".to_string()];
        let detections = matcher.detect_impersonation("Michae1 Say1or Bitcoin Live", &targets);
        assert_eq!(detections, vec!["Substitution impersonation: michael saylor"]);
    }

    #[test]
    fn test_urgency_language() {
        let lexicon = create_test_lexicon();
        let matcher = TextMatcher::new(&lexicon, 100);

        let (found, words) = matcher.detect_urgency_language("LIVE NOW - limited time only, hurry!");
        assert!(found);
        assert_eq!(words, vec!["live now", "limited time", "hurry"]);

        let (found, words) = matcher.detect_urgency_language("weekly market recap");
        assert!(!found);
        assert!(words.is_empty());
    }

    #[test]
    fn test_high_confidence_scam_phrase() {
        let lexicon = create_test_lexicon();
        let matcher = TextMatcher::new(&lexicon, 100);

        let (found, _) = matcher.detect_high_confidence_scam_phrase("Send 1 BTC and get 2 BTC back!");
        assert!(found);

        let (found, phrases) = matcher.detect_high_confidence_scam_phrase("Double your ETH today");
        assert!(found);
        assert_eq!(phrases, vec![r"double\s+your\s+(btc|eth|crypto)"]);

        let (found, _) = matcher.detect_high_confidence_scam_phrase("Bitcoin price analysis");
        assert!(!found);
    }

    #[test]
    fn test_crypto_address_shapes() {
        let lexicon = create_test_lexicon();
        let matcher = TextMatcher::new(&lexicon, 100);

        assert!(matcher.contains_crypto_address("send to 0x742d35Cc6634C0532925a3b844Bc454e4438f44e"));
        assert!(matcher.contains_crypto_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"));
        assert!(matcher.contains_crypto_address("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq"));
        assert!(!matcher.contains_crypto_address("no address here"));
    }

    #[test]
    fn test_shortener_requires_scam_context() {
        let lexicon = create_test_lexicon();
        let matcher = TextMatcher::new(&lexicon, 100);

        assert!(!matcher.contains_suspicious_url("slides: https://bit.ly/abc123"));
        assert!(matcher.contains_suspicious_url("Claim your giveaway at https://bit.ly/abc123"));
        assert!(!matcher.contains_suspicious_url("free giveaway today, no links"));
    }

    #[test]
    fn test_known_scam_domain() {
        let lexicon = create_test_lexicon();
        let matcher = TextMatcher::new(&lexicon, 100);

        let (found, domains) = matcher.matches_known_scam_domain("Details: https://telegra.ph/x");
        assert!(found);
        assert_eq!(domains, vec!["telegra.ph"]);

        let (found, _) = matcher.matches_known_scam_domain("https://bit.ly/abc");
        assert!(!found);
    }
}
