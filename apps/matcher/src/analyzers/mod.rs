//! Dimension analyzers — one scorer per matching axis.
//!
//! Each analyzer compares a CV's content with a job's content along a single
//! dimension and returns a score in [0, 1] plus a short explanation. Analyzers
//! absorb their own degraded conditions (bad model output, missing sections) by
//! returning `DimensionAnalysis::fallback`; only truly exceptional failures
//! surface as `AnalysisError`.
//!
//! Backends:
//! - `keyword` — pure-Rust, deterministic, reads the `Label: value` lines of
//!   processed documents.
//! - `llm` — one Claude prompt per dimension through `LlmClient`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AnalysisError;

pub mod keyword;
pub mod llm;
pub mod prompts;

// ────────────────────────────────────────────────────────────────────────────
// Dimensions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Skills,
    Location,
    Experience,
    Preferences,
    Education,
}

impl Dimension {
    /// Fixed order used for explanations, detail records and weight maps.
    pub const ALL: [Dimension; 5] = [
        Dimension::Skills,
        Dimension::Location,
        Dimension::Experience,
        Dimension::Preferences,
        Dimension::Education,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Skills => "skills",
            Dimension::Location => "location",
            Dimension::Experience => "experience",
            Dimension::Preferences => "preferences",
            Dimension::Education => "education",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Skills => "Skills",
            Dimension::Location => "Location",
            Dimension::Experience => "Experience",
            Dimension::Preferences => "Preferences",
            Dimension::Education => "Education",
        }
    }

    /// Key of this dimension's score in an aggregation record.
    pub fn score_key(&self) -> String {
        format!("{}_score", self.name())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer output and trait
// ────────────────────────────────────────────────────────────────────────────

/// Raw output of one analyzer. `details` carries dimension-specific fields
/// (matched skills, parsed locations, ...) for display and audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DimensionAnalysis {
    pub score: f64,
    pub explanation: String,
    #[serde(default, flatten)]
    pub details: Map<String, Value>,
}

impl DimensionAnalysis {
    pub fn new(score: f64, explanation: impl Into<String>) -> Self {
        Self {
            score,
            explanation: explanation.into(),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Zero-score record returned when an analyzer cannot produce a result.
    pub fn fallback(dimension: Dimension) -> Self {
        Self::new(0.0, format!("Error in {} analysis", dimension.name()))
    }
}

/// Scores one CV/job pair along a single dimension.
#[async_trait]
pub trait DimensionAnalyzer: Send + Sync {
    fn dimension(&self) -> Dimension;

    async fn analyze(
        &self,
        cv_content: &str,
        job_content: &str,
    ) -> Result<DimensionAnalysis, AnalysisError>;
}

/// The five analyzers the aggregator drives, one per dimension.
#[derive(Clone)]
pub struct AnalyzerSet {
    pub skills: Arc<dyn DimensionAnalyzer>,
    pub location: Arc<dyn DimensionAnalyzer>,
    pub experience: Arc<dyn DimensionAnalyzer>,
    pub preferences: Arc<dyn DimensionAnalyzer>,
    pub education: Arc<dyn DimensionAnalyzer>,
}

impl AnalyzerSet {
    pub fn keyword() -> Self {
        Self {
            skills: Arc::new(keyword::SkillsAnalyzer),
            location: Arc::new(keyword::LocationAnalyzer),
            experience: Arc::new(keyword::ExperienceAnalyzer),
            preferences: Arc::new(keyword::PreferencesAnalyzer),
            education: Arc::new(keyword::EducationAnalyzer),
        }
    }

    pub fn llm(client: crate::llm_client::LlmClient) -> Self {
        let make = |dimension| -> Arc<dyn DimensionAnalyzer> {
            Arc::new(llm::LlmDimensionAnalyzer::new(client.clone(), dimension))
        };
        Self {
            skills: make(Dimension::Skills),
            location: make(Dimension::Location),
            experience: make(Dimension::Experience),
            preferences: make(Dimension::Preferences),
            education: make(Dimension::Education),
        }
    }

    pub fn get(&self, dimension: Dimension) -> &Arc<dyn DimensionAnalyzer> {
        match dimension {
            Dimension::Skills => &self.skills,
            Dimension::Location => &self.location,
            Dimension::Experience => &self.experience,
            Dimension::Preferences => &self.preferences,
            Dimension::Education => &self.education,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_order_and_keys() {
        let names: Vec<&str> = Dimension::ALL.iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            ["skills", "location", "experience", "preferences", "education"]
        );
        assert_eq!(Dimension::Preferences.score_key(), "preferences_score");
        assert_eq!(Dimension::Education.label(), "Education");
    }

    #[test]
    fn test_fallback_is_zero_score() {
        let fallback = DimensionAnalysis::fallback(Dimension::Location);
        assert_eq!(fallback.score, 0.0);
        assert_eq!(fallback.explanation, "Error in location analysis");
        assert!(fallback.details.is_empty());
    }

    #[test]
    fn test_analysis_serializes_details_flat() {
        let analysis = DimensionAnalysis::new(0.5, "half").with_detail("matched_skills", vec!["rust"]);
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["score"], 0.5);
        assert_eq!(value["matched_skills"][0], "rust");
    }

    #[test]
    fn test_keyword_set_wires_each_dimension() {
        let set = AnalyzerSet::keyword();
        for dimension in Dimension::ALL {
            assert_eq!(set.get(dimension).dimension(), dimension);
        }
    }
}
