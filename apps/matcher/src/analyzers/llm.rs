use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::prompts::{build_prompt, ANALYSIS_SYSTEM};
use super::{Dimension, DimensionAnalysis, DimensionAnalyzer};
use crate::errors::AnalysisError;
use crate::llm_client::LlmClient;

/// Shape every dimension prompt asks the model to return.
#[derive(Debug, Deserialize)]
struct LlmDimensionResponse {
    score: f64,
    explanation: String,
    #[serde(default)]
    details: Map<String, Value>,
}

/// Scores one dimension with a single Claude call.
///
/// Never fails: transport errors, refusals and malformed JSON all degrade to
/// `DimensionAnalysis::fallback`, so one flaky call costs a dimension score
/// rather than the whole candidate.
pub struct LlmDimensionAnalyzer {
    client: LlmClient,
    dimension: Dimension,
}

impl LlmDimensionAnalyzer {
    pub fn new(client: LlmClient, dimension: Dimension) -> Self {
        Self { client, dimension }
    }
}

#[async_trait]
impl DimensionAnalyzer for LlmDimensionAnalyzer {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    async fn analyze(&self, cv_content: &str, job_content: &str) -> Result<DimensionAnalysis, AnalysisError> {
        let prompt = build_prompt(self.dimension, cv_content, job_content);

        match self
            .client
            .complete_json::<LlmDimensionResponse>(ANALYSIS_SYSTEM, &prompt)
            .await
        {
            Ok(response) => {
                debug!(dimension = %self.dimension, score = response.score, "LLM analysis completed");
                Ok(into_analysis(response))
            }
            Err(e) => {
                warn!(dimension = %self.dimension, error = %e, "LLM analysis failed, using fallback");
                Ok(DimensionAnalysis::fallback(self.dimension))
            }
        }
    }
}

fn into_analysis(response: LlmDimensionResponse) -> DimensionAnalysis {
    let score = if response.score.is_finite() {
        response.score.clamp(0.0, 1.0)
    } else {
        0.0
    };
    DimensionAnalysis {
        score,
        explanation: response.explanation,
        details: response.details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parses_with_details() {
        let raw = r#"{"score": 0.75, "explanation": "Most skills covered",
                      "details": {"matched_skills": ["rust", "sql"]}}"#;
        let response: LlmDimensionResponse = serde_json::from_str(raw).unwrap();
        let analysis = into_analysis(response);
        assert_eq!(analysis.score, 0.75);
        assert_eq!(analysis.details["matched_skills"][1], "sql");
    }

    #[test]
    fn test_response_details_are_optional() {
        let raw = r#"{"score": 0.2, "explanation": "Far away"}"#;
        let response: LlmDimensionResponse = serde_json::from_str(raw).unwrap();
        assert!(into_analysis(response).details.is_empty());
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let high = into_analysis(LlmDimensionResponse {
            score: 1.4,
            explanation: String::new(),
            details: Map::new(),
        });
        assert_eq!(high.score, 1.0);

        let nan = into_analysis(LlmDimensionResponse {
            score: f64::NAN,
            explanation: String::new(),
            details: Map::new(),
        });
        assert_eq!(nan.score, 0.0);
    }

    #[test]
    fn test_analyzer_keeps_its_dimension() {
        let client = LlmClient::new("test-key".to_string()).unwrap();
        let analyzer = LlmDimensionAnalyzer::new(client, Dimension::Education);
        assert_eq!(analyzer.dimension(), Dimension::Education);
    }
}
