// Scoring: per-pair aggregation of dimension scores and conversion into results.

pub mod aggregator;
pub mod assembly;
pub mod weights;

pub use aggregator::{Aggregation, AnalysisRecord, MatchAnalyzer, ScoreAggregator};
pub use assembly::assemble_match_result;
pub use weights::{Weights, WEIGHT_TOLERANCE};
