pub mod classifier;
pub mod config;
pub mod detector;
pub mod lexicon;
pub mod matcher;
pub mod metadata;
pub mod report;
pub mod signals;

pub use classifier::{CompositeClassifier, CompositeResult, RiskCategory};
pub use config::DetectorConfig;
pub use detector::{Candidate, DetectionRecord, ResultsDocument, StreamJackingDetector};
pub use lexicon::Lexicon;
pub use matcher::TextMatcher;
pub use metadata::{ChannelMetadata, VideoMetadata};
pub use report::BatchSummary;
pub use signals::{ChannelEvaluator, SignalResult, VideoEvaluator};
