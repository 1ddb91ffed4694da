use std::sync::Arc;

use tracing::debug;

use crate::errors::CandidateError;
use crate::models::{Document, DocumentCategory, MatchResult};
use crate::scoring::{assemble_match_result, MatchAnalyzer};

/// One source/candidate pair, owned by the task that analyzes it.
///
/// The source is always the query side; `run` puts the pair in (cv, job)
/// order from the source's category before calling the analyzer.
#[derive(Debug, Clone)]
pub struct MatchTask {
    source: Arc<Document>,
    candidate: Document,
}

impl MatchTask {
    pub fn new(source: Arc<Document>, candidate: Document) -> Self {
        Self { source, candidate }
    }

    pub fn candidate_id(&self) -> &str {
        &self.candidate.id
    }

    fn oriented(&self) -> (&Document, &Document) {
        match self.source.category {
            DocumentCategory::Cv => (&self.source, &self.candidate),
            DocumentCategory::Job => (&self.candidate, &self.source),
        }
    }

    /// Analyzes and assembles this pair. Errors are the caller's cue to drop
    /// the candidate; they never abort the batch.
    pub async fn run(self, analyzer: Arc<dyn MatchAnalyzer>) -> Result<Option<MatchResult>, CandidateError> {
        let (cv, job) = self.oriented();
        let record = analyzer.analyze_match(cv, job).await.map_err(|e| {
            debug!(candidate_id = %self.candidate_id(), error = %e, "candidate analysis failed");
            e
        })?;

        let (cv, job) = (cv.clone(), job.clone());
        let result = assemble_match_result(&record, cv, job).map_err(|e| {
            debug!(candidate_id = %self.candidate_id(), error = %e, "candidate record rejected");
            e
        })?;

        debug!(
            candidate_id = %self.candidate_id(),
            score = result.weighted_final_score(),
            "candidate scored"
        );
        Ok(Some(result))
    }
}
