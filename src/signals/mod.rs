//! Signal rules and the evaluators that run them.
//!
//! Each suspicion signal is an independent [`SignalRule`] registered in a
//! [`RuleRegistry`]. Evaluators precompute a per-record context (matcher
//! results, intent flags, account age) and hand it to every rule, so
//! exemptions such as crypto-native channels are read from the context
//! instead of being re-derived inside each rule.

pub mod channel;
pub mod video;

use serde::{Deserialize, Serialize};

pub use channel::{ChannelContext, ChannelEvaluator};
pub use video::{IntentFlags, VideoContext, VideoEvaluator};

pub const MAX_SCORE: f64 = 100.0;

/// Clamp a raw score into `[0, 100]`.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, MAX_SCORE)
}

/// Why a record looks suspicious, and how much.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalResult {
    pub signals: Vec<String>,
    pub risk_score: f64,
}

impl SignalResult {
    pub fn new(signals: Vec<String>, risk_score: f64) -> Self {
        Self {
            signals,
            risk_score: clamp_score(risk_score),
        }
    }
}

/// A fired rule: the weight it contributes and the signal text it emits.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub weight: f64,
    pub signal: String,
}

impl RuleHit {
    pub fn new(weight: f64, signal: impl Into<String>) -> Self {
        Self {
            weight,
            signal: signal.into(),
        }
    }
}

pub trait SignalRule<S, C>: Send + Sync {
    fn evaluate(&self, subject: &S, context: &C) -> Option<RuleHit>;
    fn name(&self) -> &str;
}

/// Ordered collection of rules over subject `S` with context `C`.
pub struct RuleRegistry<S, C> {
    rules: Vec<Box<dyn SignalRule<S, C>>>,
}

impl<S, C> Default for RuleRegistry<S, C> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<S, C> RuleRegistry<S, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: Box<dyn SignalRule<S, C>>) {
        self.rules.push(rule);
    }

    pub fn with(mut self, rule: Box<dyn SignalRule<S, C>>) -> Self {
        self.register(rule);
        self
    }

    /// Remove every rule with the given name. Returns whether any was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.name() != name);
        self.rules.len() != before
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule in registration order. Returns the emitted signals and
    /// the unclamped sum of weights.
    pub fn evaluate(&self, subject: &S, context: &C) -> (Vec<String>, f64) {
        let mut signals = Vec::new();
        let mut total = 0.0;

        for rule in &self.rules {
            if let Some(hit) = rule.evaluate(subject, context) {
                log::debug!("Rule {} fired (+{}): {}", rule.name(), hit.weight, hit.signal);
                total += hit.weight;
                signals.push(hit.signal);
            }
        }

        (signals, total)
    }
}

/// A metadata record paired with the signals derived from it. The metadata
/// is borrowed, never modified.
#[derive(Debug, Clone)]
pub struct Scored<'m, T> {
    pub metadata: &'m T,
    pub result: SignalResult,
}

impl<'m, T> Scored<'m, T> {
    pub fn new(metadata: &'m T, result: SignalResult) -> Self {
        Self { metadata, result }
    }

    pub fn risk_score(&self) -> f64 {
        self.result.risk_score
    }

    pub fn signals(&self) -> &[String] {
        &self.result.signals
    }
}
