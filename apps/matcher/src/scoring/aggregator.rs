//! Score Aggregator — runs the five dimension analyzers for one CV/job pair and
//! folds their scores into a single weighted score and recommendation.
//!
//! The five analyzer calls are independent and run concurrently; they are
//! combined in fixed dimension order once all of them have returned, so the
//! result does not depend on which call finished first.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::analyzers::{AnalyzerSet, Dimension, DimensionAnalysis};
use crate::errors::AnalysisError;
use crate::models::{Document, Recommendation};
use crate::scoring::weights::Weights;

/// Separator between per-dimension explanations in the combined explanation.
const EXPLANATION_SEPARATOR: &str = "; ";

/// Raw aggregation output, keyed by field name. Turned into a `MatchResult`
/// by `scoring::assembly`.
pub type AnalysisRecord = Map<String, Value>;

/// Produces one aggregation record per CV/job pair. The orchestrator depends
/// only on this trait.
#[async_trait]
pub trait MatchAnalyzer: Send + Sync {
    async fn analyze_match(&self, cv: &Document, job: &Document) -> Result<AnalysisRecord, AnalysisError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregation
// ────────────────────────────────────────────────────────────────────────────

/// Typed aggregation of one pair, before it is flattened into a record.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// One entry per dimension, in `Dimension::ALL` order.
    pub analyses: Vec<(Dimension, DimensionAnalysis)>,
    pub weighted_final_score: f64,
    pub recommendation: Recommendation,
    pub explanation: String,
    pub weights: Weights,
}

impl Aggregation {
    /// Combines per-dimension analyses. Each score is clamped into [0, 1]
    /// (non-finite scores count as 0.0) before weighting, and so is the sum.
    pub fn combine(analyses: Vec<(Dimension, DimensionAnalysis)>, weights: Weights) -> Self {
        let analyses: Vec<(Dimension, DimensionAnalysis)> = analyses
            .into_iter()
            .map(|(dimension, mut analysis)| {
                analysis.score = clamp_score(analysis.score);
                (dimension, analysis)
            })
            .collect();

        // Weights may sum to 1.0 ± tolerance, which can push a perfect pair past 1.0.
        let weighted_final_score = analyses
            .iter()
            .map(|(dimension, analysis)| analysis.score * weights.get(*dimension))
            .sum::<f64>()
            .clamp(0.0, 1.0);

        let explanation = analyses
            .iter()
            .filter(|(_, analysis)| !analysis.explanation.trim().is_empty())
            .map(|(dimension, analysis)| format!("{}: {}", dimension.label(), analysis.explanation))
            .collect::<Vec<_>>()
            .join(EXPLANATION_SEPARATOR);

        Self {
            recommendation: Recommendation::from_score(weighted_final_score),
            analyses,
            weighted_final_score,
            explanation,
            weights,
        }
    }

    pub fn score(&self, dimension: Dimension) -> f64 {
        self.analyses
            .iter()
            .find(|(d, _)| *d == dimension)
            .map(|(_, analysis)| analysis.score)
            .unwrap_or(0.0)
    }

    /// Flattens into the record layout result assembly expects.
    pub fn into_record(self) -> Result<AnalysisRecord, AnalysisError> {
        let mut record = AnalysisRecord::new();
        for dimension in Dimension::ALL {
            record.insert(dimension.score_key(), json!(self.score(dimension)));
        }
        record.insert("weighted_final_score".into(), json!(self.weighted_final_score));
        record.insert("recommendation".into(), json!(self.recommendation.label()));
        record.insert("explanation".into(), json!(self.explanation));
        record.insert("agent_weights".into(), Value::Object(self.weights.to_map()));

        let mut detailed = Map::new();
        for (dimension, analysis) in self.analyses {
            detailed.insert(dimension.name().to_string(), serde_json::to_value(analysis)?);
        }
        record.insert("detailed_results".into(), Value::Object(detailed));
        Ok(record)
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ScoreAggregator
// ────────────────────────────────────────────────────────────────────────────

/// Default `MatchAnalyzer`: five dimension analyzers plus validated weights.
pub struct ScoreAggregator {
    analyzers: AnalyzerSet,
    weights: Weights,
}

impl ScoreAggregator {
    /// `weights` must already have passed `Weights::validate`.
    pub fn new(analyzers: AnalyzerSet, weights: Weights) -> Self {
        Self { analyzers, weights }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Runs all five analyzers. Any analyzer error fails the whole aggregation;
    /// no partial score is computed.
    pub async fn aggregate(&self, cv: &Document, job: &Document) -> Result<Aggregation, AnalysisError> {
        let (cv_content, job_content) = (cv.content.as_str(), job.content.as_str());
        let a = &self.analyzers;

        let (skills, location, experience, preferences, education) = tokio::try_join!(
            a.skills.analyze(cv_content, job_content),
            a.location.analyze(cv_content, job_content),
            a.experience.analyze(cv_content, job_content),
            a.preferences.analyze(cv_content, job_content),
            a.education.analyze(cv_content, job_content),
        )?;

        let aggregation = Aggregation::combine(
            vec![
                (Dimension::Skills, skills),
                (Dimension::Location, location),
                (Dimension::Experience, experience),
                (Dimension::Preferences, preferences),
                (Dimension::Education, education),
            ],
            self.weights,
        );

        debug!(
            cv_id = %cv.id,
            job_id = %job.id,
            score = aggregation.weighted_final_score,
            recommendation = %aggregation.recommendation,
            "aggregation completed"
        );
        Ok(aggregation)
    }
}

#[async_trait]
impl MatchAnalyzer for ScoreAggregator {
    async fn analyze_match(&self, cv: &Document, job: &Document) -> Result<AnalysisRecord, AnalysisError> {
        self.aggregate(cv, job).await?.into_record()
    }
}
