use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AssemblyError;
use crate::models::document::Document;

// ────────────────────────────────────────────────────────────────────────────
// Recommendation
// ────────────────────────────────────────────────────────────────────────────

/// Discrete label derived from the weighted final score. Declared from best to
/// worst; `Ord` follows match quality, so `StrongMatch > NoMatch`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Recommendation {
    #[serde(rename = "Strong Match")]
    StrongMatch,
    #[serde(rename = "Good Match")]
    GoodMatch,
    #[serde(rename = "Fair Match")]
    FairMatch,
    #[serde(rename = "Poor Match")]
    PoorMatch,
    #[serde(rename = "No Match")]
    NoMatch,
}

const STRONG_THRESHOLD: f64 = 0.8;
const GOOD_THRESHOLD: f64 = 0.6;
const FAIR_THRESHOLD: f64 = 0.4;
const POOR_THRESHOLD: f64 = 0.2;

impl Recommendation {
    pub const ALL: [Recommendation; 5] = [
        Recommendation::StrongMatch,
        Recommendation::GoodMatch,
        Recommendation::FairMatch,
        Recommendation::PoorMatch,
        Recommendation::NoMatch,
    ];

    /// Thresholds are evaluated highest-first and are inclusive at the bound.
    pub fn from_score(score: f64) -> Self {
        if score >= STRONG_THRESHOLD {
            Recommendation::StrongMatch
        } else if score >= GOOD_THRESHOLD {
            Recommendation::GoodMatch
        } else if score >= FAIR_THRESHOLD {
            Recommendation::FairMatch
        } else if score >= POOR_THRESHOLD {
            Recommendation::PoorMatch
        } else {
            Recommendation::NoMatch
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "Strong Match",
            Recommendation::GoodMatch => "Good Match",
            Recommendation::FairMatch => "Fair Match",
            Recommendation::PoorMatch => "Poor Match",
            Recommendation::NoMatch => "No Match",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Recommendation::StrongMatch => 4,
            Recommendation::GoodMatch => 3,
            Recommendation::FairMatch => 2,
            Recommendation::PoorMatch => 1,
            Recommendation::NoMatch => 0,
        }
    }
}

impl PartialOrd for Recommendation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Recommendation {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Recommendation {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Recommendation::ALL
            .into_iter()
            .find(|r| r.label() == s)
            .ok_or_else(|| AssemblyError::UnknownRecommendation(s.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scores and results
// ────────────────────────────────────────────────────────────────────────────

/// Per-dimension scores of one CV/job pair, each in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentScores {
    pub skills: f64,
    pub location: f64,
    pub experience: f64,
    pub preferences: f64,
    pub education: f64,
    #[serde(default)]
    pub explanation: String,
}

impl AgentScores {
    /// Scores keyed by dimension name, in dimension order.
    pub fn as_pairs(&self) -> [(&'static str, f64); 5] {
        [
            ("skills", self.skills),
            ("location", self.location),
            ("experience", self.experience),
            ("preferences", self.preferences),
            ("education", self.education),
        ]
    }
}

/// Outcome of matching one CV against one job. Built once by result assembly
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    cv_document: Document,
    job_document: Document,
    weighted_final_score: f64,
    recommendation: Recommendation,
    explanation: String,
    agent_scores: AgentScores,
    detailed_results: Option<Map<String, Value>>,
}

impl MatchResult {
    pub(crate) fn new(
        cv_document: Document,
        job_document: Document,
        weighted_final_score: f64,
        recommendation: Recommendation,
        explanation: String,
        agent_scores: AgentScores,
        detailed_results: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            cv_document,
            job_document,
            weighted_final_score,
            recommendation,
            explanation,
            agent_scores,
            detailed_results,
        }
    }

    pub fn cv_document(&self) -> &Document {
        &self.cv_document
    }

    pub fn job_document(&self) -> &Document {
        &self.job_document
    }

    pub fn weighted_final_score(&self) -> f64 {
        self.weighted_final_score
    }

    pub fn recommendation(&self) -> Recommendation {
        self.recommendation
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn agent_scores(&self) -> &AgentScores {
        &self.agent_scores
    }

    pub fn detailed_results(&self) -> Option<&Map<String, Value>> {
        self.detailed_results.as_ref()
    }

    /// Flattens the result into the shape callers display or export.
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            cv_id: self.cv_document.id.clone(),
            job_id: self.job_document.id.clone(),
            cv_filename: self.cv_document.filename().to_string(),
            job_filename: self.job_document.filename().to_string(),
            weighted_final_score: self.weighted_final_score,
            score_display: format_score(self.weighted_final_score),
            recommendation: self.recommendation,
            explanation: self.explanation.clone(),
            agent_scores: self
                .agent_scores
                .as_pairs()
                .into_iter()
                .map(|(name, score)| (name.to_string(), score))
                .collect(),
        }
    }
}

/// Flat, serializable view of a `MatchResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub cv_id: String,
    pub job_id: String,
    pub cv_filename: String,
    pub job_filename: String,
    pub weighted_final_score: f64,
    pub score_display: String,
    pub recommendation: Recommendation,
    pub explanation: String,
    pub agent_scores: std::collections::BTreeMap<String, f64>,
}

/// Formats a [0, 1] score as a percentage with one decimal, e.g. `0.8523` → `85.2%`.
pub fn format_score(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::DocumentCategory;

    #[test]
    fn test_threshold_exactness() {
        assert_eq!(Recommendation::from_score(0.8), Recommendation::StrongMatch);
        assert_eq!(Recommendation::from_score(0.79999), Recommendation::GoodMatch);
        assert_eq!(Recommendation::from_score(0.6), Recommendation::GoodMatch);
        assert_eq!(Recommendation::from_score(0.4), Recommendation::FairMatch);
        assert_eq!(Recommendation::from_score(0.2), Recommendation::PoorMatch);
        assert_eq!(Recommendation::from_score(0.19999), Recommendation::NoMatch);
        assert_eq!(Recommendation::from_score(0.0), Recommendation::NoMatch);
        assert_eq!(Recommendation::from_score(1.0), Recommendation::StrongMatch);
    }

    #[test]
    fn test_recommendation_ordering() {
        assert!(Recommendation::StrongMatch > Recommendation::GoodMatch);
        assert!(Recommendation::GoodMatch > Recommendation::FairMatch);
        assert!(Recommendation::FairMatch > Recommendation::PoorMatch);
        assert!(Recommendation::PoorMatch > Recommendation::NoMatch);
    }

    #[test]
    fn test_recommendation_label_parse() {
        for rec in Recommendation::ALL {
            assert_eq!(rec.label().parse::<Recommendation>().unwrap(), rec);
        }
        let err = "Perfect Match".parse::<Recommendation>().unwrap_err();
        assert!(matches!(err, AssemblyError::UnknownRecommendation(s) if s == "Perfect Match"));
    }

    #[test]
    fn test_recommendation_serializes_as_label() {
        let json = serde_json::to_string(&Recommendation::FairMatch).unwrap();
        assert_eq!(json, "\"Fair Match\"");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.8523), "85.2%");
        assert_eq!(format_score(0.0), "0.0%");
    }

    #[test]
    fn test_summary_flattens_documents_and_scores() {
        let cv = Document::new("cv-1", DocumentCategory::Cv, "cv").with_metadata("filename", "alice.txt");
        let job = Document::new("job-1", DocumentCategory::Job, "job");
        let scores = AgentScores {
            skills: 0.9,
            location: 0.5,
            experience: 0.7,
            preferences: 0.2,
            education: 1.0,
            explanation: String::new(),
        };
        let result = MatchResult::new(
            cv,
            job,
            0.72,
            Recommendation::GoodMatch,
            "Skills: strong".to_string(),
            scores,
            None,
        );

        let summary = result.summary();
        assert_eq!(summary.cv_filename, "alice.txt");
        assert_eq!(summary.job_filename, "job-1");
        assert_eq!(summary.score_display, "72.0%");
        assert_eq!(summary.agent_scores.len(), 5);
        assert_eq!(summary.agent_scores["education"], 1.0);
    }
}
