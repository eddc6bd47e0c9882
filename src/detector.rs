//! End-to-end scoring of candidate streams.
//!
//! A [`Candidate`] bundles a video snapshot with its (optional) channel
//! snapshot. [`StreamJackingDetector`] runs both evaluators and the composite
//! classifier and flattens the outcome into a [`DetectionRecord`].

use crate::classifier::{CompositeClassifier, RiskCategory};
use crate::config::ScoringConfig;
use crate::lexicon::Lexicon;
use crate::metadata::{ChannelMetadata, VideoMetadata};
use crate::signals::{ChannelEvaluator, VideoEvaluator};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub video: VideoMetadata,
    #[serde(default)]
    pub channel: Option<ChannelMetadata>,
    #[serde(default)]
    pub search_query: Option<String>,
}

/// One input entry: a candidate, or why it could not be read.
pub type CandidateEntry = Result<Candidate, BatchFailure>;

/// Accepted shapes of a candidate input file. Entries stay raw JSON until
/// each is converted on its own, so one malformed entry cannot sink the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CandidateFile {
    List(Vec<serde_json::Value>),
    Wrapped { candidates: Vec<serde_json::Value> },
}

impl CandidateFile {
    pub fn into_entries(self) -> Vec<CandidateEntry> {
        let values = match self {
            CandidateFile::List(values) => values,
            CandidateFile::Wrapped { candidates } => candidates,
        };

        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let video_id = value
                    .pointer("/video/video_id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                serde_json::from_value::<Candidate>(value).map_err(|e| BatchFailure {
                    index,
                    video_id,
                    error: format!("Invalid candidate entry: {e}"),
                })
            })
            .collect()
    }

    /// Parse an input file. Only a file that is not a candidate list at all
    /// is an error; bad entries come back as failed entries.
    pub fn from_json(content: &str) -> anyhow::Result<Vec<CandidateEntry>> {
        let file: CandidateFile = serde_json::from_str(content)
            .context("Failed to parse candidate input: expected a list or {\"candidates\": [...]}")?;
        Ok(file.into_entries())
    }
}

/// Flat, serializable verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub video_id: String,
    pub video_title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub is_live: bool,
    pub video_risk_score: f64,
    pub channel_risk_score: f64,
    pub total_risk_score: f64,
    pub risk_category: RiskCategory,
    pub confidence_score: f64,
    pub critical_checks_passed: usize,
    pub video_signals: Vec<String>,
    pub channel_signals: Vec<String>,
    pub detected_at: DateTime<Utc>,
    pub search_query: Option<String>,
    pub video_url: String,
    pub channel_url: String,
}

impl DetectionRecord {
    pub fn signal_count(&self) -> usize {
        self.video_signals.len() + self.channel_signals.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub index: usize,
    pub video_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub records: Vec<DetectionRecord>,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub total_candidates: usize,
    pub processed: usize,
    pub failed: usize,
    pub total_detections: usize,
    pub scan_completed_at: DateTime<Utc>,
}

/// JSON document written by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub results: Vec<DetectionRecord>,
    pub metadata: ScanMetadata,
}

impl ResultsDocument {
    /// Build the output document. With `detections_only`, records below
    /// `threshold` are left out of `results`; they are always counted as
    /// processed.
    pub fn from_outcome(
        outcome: &BatchOutcome,
        threshold: f64,
        detections_only: bool,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let detections: Vec<&DetectionRecord> = outcome
            .records
            .iter()
            .filter(|r| r.total_risk_score >= threshold)
            .collect();

        let results = if detections_only {
            detections.iter().map(|r| (*r).clone()).collect()
        } else {
            outcome.records.clone()
        };

        Self {
            metadata: ScanMetadata {
                total_candidates: outcome.records.len() + outcome.failures.len(),
                processed: outcome.records.len(),
                failed: outcome.failures.len(),
                total_detections: detections.len(),
                scan_completed_at: completed_at,
            },
            results,
        }
    }
}

pub struct StreamJackingDetector<'a> {
    channel: ChannelEvaluator<'a>,
    video: VideoEvaluator<'a>,
    classifier: CompositeClassifier<'a>,
}

impl<'a> StreamJackingDetector<'a> {
    pub fn new(lexicon: &'a Lexicon, scoring: &ScoringConfig) -> Self {
        Self {
            channel: ChannelEvaluator::new(lexicon, scoring),
            video: VideoEvaluator::new(lexicon, scoring),
            classifier: CompositeClassifier::new(lexicon, scoring),
        }
    }

    pub fn from_parts(
        channel: ChannelEvaluator<'a>,
        video: VideoEvaluator<'a>,
        classifier: CompositeClassifier<'a>,
    ) -> Self {
        Self {
            channel,
            video,
            classifier,
        }
    }

    /// Score one candidate as of `at`, which is also the record timestamp.
    pub fn evaluate(&self, candidate: &Candidate, at: DateTime<Utc>) -> anyhow::Result<DetectionRecord> {
        let video = &candidate.video;
        let scored_video = self.video.evaluate(video)?;
        let scored_channel = match &candidate.channel {
            Some(channel) => Some(
                self.channel
                    .evaluate(channel, at)
                    .with_context(|| format!("Invalid channel for video {}", video.video_id))?,
            ),
            None => None,
        };

        let composite = self.classifier.classify(&scored_video, scored_channel.as_ref());

        let (channel_risk_score, channel_signals) = match &scored_channel {
            Some(scored) => (scored.risk_score(), scored.signals().to_vec()),
            None => (0.0, Vec::new()),
        };

        Ok(DetectionRecord {
            video_id: video.video_id.clone(),
            video_title: video.title.clone(),
            channel_id: video.channel_id.clone(),
            channel_title: video.channel_title.clone(),
            is_live: video.is_live,
            video_risk_score: scored_video.risk_score(),
            channel_risk_score,
            total_risk_score: composite.total_risk_score,
            risk_category: composite.risk_category,
            confidence_score: composite.confidence_score,
            critical_checks_passed: composite.critical_checks_passed,
            video_signals: scored_video.signals().to_vec(),
            channel_signals,
            detected_at: at,
            search_query: candidate.search_query.clone(),
            video_url: video.url(),
            channel_url: video.channel_url(),
        })
    }

    /// Score every candidate. Failures are logged and collected; they never
    /// abort the batch.
    pub fn evaluate_batch(&self, candidates: &[Candidate], at: DateTime<Utc>) -> BatchOutcome {
        let entries: Vec<CandidateEntry> = candidates.iter().cloned().map(Ok).collect();
        self.evaluate_entries(&entries, at)
    }

    /// Like [`Self::evaluate_batch`], but entries that failed to parse are
    /// carried into the outcome as failures.
    pub fn evaluate_entries(&self, entries: &[CandidateEntry], at: DateTime<Utc>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        log::info!("Evaluating {} candidate(s)", entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let candidate = match entry {
                Ok(candidate) => candidate,
                Err(failure) => {
                    log::warn!("Skipping candidate {index}: {}", failure.error);
                    outcome.failures.push(BatchFailure {
                        index,
                        ..failure.clone()
                    });
                    continue;
                }
            };

            match self.evaluate(candidate, at) {
                Ok(record) => {
                    log::debug!(
                        "{} {} ({:.1}): {}",
                        record.risk_category,
                        record.video_id,
                        record.total_risk_score,
                        record.video_title
                    );
                    outcome.records.push(record);
                }
                Err(e) => {
                    log::warn!("Skipping candidate {index}: {e:#}");
                    outcome.failures.push(BatchFailure {
                        index,
                        video_id: candidate.video.video_id.clone(),
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        log::info!(
            "Batch complete: {} processed, {} failed",
            outcome.records.len(),
            outcome.failures.len()
        );
        outcome
    }
}
