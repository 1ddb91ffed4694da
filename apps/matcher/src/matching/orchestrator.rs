//! Matching Orchestrator — turns one source document into a ranked, bounded,
//! thresholded list of matches against the opposite category.
//!
//! Flow: repository over-fetch → one `MatchTask` per candidate → executor →
//! sort by score (ties by candidate id) → drop below `min_match_score` →
//! keep the first `top_candidates_count`.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::info;

use crate::errors::MatchingError;
use crate::events::{DomainEvent, EventPublisher};
use crate::executor::{ParallelExecutor, ProgressCallback};
use crate::matching::task::MatchTask;
use crate::models::{Document, DocumentCategory, MatchResult};
use crate::repository::CandidateRepository;
use crate::scoring::MatchAnalyzer;

pub const CV_TO_JOBS_CONTEXT: &str = "CV to Jobs Matching";
pub const JOB_TO_CVS_CONTEXT: &str = "Job to CVs Matching";

pub const DEFAULT_TOP_CANDIDATES_COUNT: usize = 5;
pub const DEFAULT_MIN_MATCH_SCORE: f64 = 0.3;

/// Result-list bounds applied after scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingLimits {
    pub top_candidates_count: usize,
    pub min_match_score: f64,
}

impl Default for MatchingLimits {
    fn default() -> Self {
        Self {
            top_candidates_count: DEFAULT_TOP_CANDIDATES_COUNT,
            min_match_score: DEFAULT_MIN_MATCH_SCORE,
        }
    }
}

pub struct MatchingOrchestrator {
    repository: Arc<dyn CandidateRepository>,
    analyzer: Arc<dyn MatchAnalyzer>,
    executor: ParallelExecutor,
    publisher: Arc<dyn EventPublisher>,
    limits: MatchingLimits,
}

impl MatchingOrchestrator {
    pub fn new(
        repository: Arc<dyn CandidateRepository>,
        analyzer: Arc<dyn MatchAnalyzer>,
        executor: ParallelExecutor,
        publisher: Arc<dyn EventPublisher>,
        limits: MatchingLimits,
    ) -> Self {
        Self {
            repository,
            analyzer,
            executor,
            publisher,
            limits,
        }
    }

    pub fn limits(&self) -> MatchingLimits {
        self.limits
    }

    // ── Core algorithm ───────────────────────────────────────────────────────

    /// Ranks `target` documents against `source`.
    ///
    /// Repository failures propagate unchanged. Candidates whose analysis or
    /// assembly fails are dropped; an empty candidate pool yields an empty
    /// list without scheduling any task.
    pub async fn run_match(
        &self,
        source: &Document,
        target: DocumentCategory,
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<MatchResult>, MatchingError> {
        let fetch_limit = self.limits.top_candidates_count.saturating_mul(2);
        let candidates = self
            .repository
            .find_similar(&source.content, target, fetch_limit)
            .await?;

        if candidates.is_empty() {
            info!(source_id = %source.id, %target, "no candidates retrieved");
            return Ok(Vec::new());
        }

        let total = candidates.len();
        let source = Arc::new(source.clone());
        let tasks: Vec<_> = candidates
            .into_iter()
            .map(|candidate| MatchTask::new(source.clone(), candidate).run(self.analyzer.clone()))
            .collect();

        let mut results = self.executor.execute(tasks, progress).await;
        let scored = results.len();

        results.sort_by(|a, b| rank(a, b, source.category));
        results.retain(|r| r.weighted_final_score() >= self.limits.min_match_score);
        results.truncate(self.limits.top_candidates_count);

        info!(
            source_id = %source.id,
            %target,
            candidates = total,
            scored,
            returned = results.len(),
            "matching finished"
        );
        Ok(results)
    }

    // ── Event-publishing entry points ────────────────────────────────────────

    /// Runs a match for `source` against the opposite category and publishes
    /// exactly one completed or failed event.
    pub async fn match_documents(&self, source: &Document) -> Result<Vec<MatchResult>, MatchingError> {
        self.match_documents_with_progress(source, None).await
    }

    pub async fn match_documents_with_progress(
        &self,
        source: &Document,
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<MatchResult>, MatchingError> {
        let target = source.category.opposite();
        let context = match source.category {
            DocumentCategory::Cv => CV_TO_JOBS_CONTEXT,
            DocumentCategory::Job => JOB_TO_CVS_CONTEXT,
        };

        match self.run_match(source, target, progress).await {
            Ok(results) => {
                self.publisher
                    .publish(DomainEvent::matching_completed(completion_message(results.len(), target), context));
                Ok(results)
            }
            Err(e) => {
                self.publisher.publish(DomainEvent::matching_failed(&e.to_string(), context));
                Err(e)
            }
        }
    }

    /// Jobs ranked for a CV.
    pub async fn match_cv_to_jobs(&self, cv: &Document) -> Result<Vec<MatchResult>, MatchingError> {
        self.match_cv_to_jobs_with_progress(cv, None).await
    }

    pub async fn match_cv_to_jobs_with_progress(
        &self,
        cv: &Document,
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<MatchResult>, MatchingError> {
        let cv = as_category(cv, DocumentCategory::Cv);
        self.match_documents_with_progress(&cv, progress).await
    }

    /// CVs ranked for a job posting.
    pub async fn match_job_to_cvs(&self, job: &Document) -> Result<Vec<MatchResult>, MatchingError> {
        self.match_job_to_cvs_with_progress(job, None).await
    }

    pub async fn match_job_to_cvs_with_progress(
        &self,
        job: &Document,
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<MatchResult>, MatchingError> {
        let job = as_category(job, DocumentCategory::Job);
        self.match_documents_with_progress(&job, progress).await
    }
}

/// Score descending, then the candidate's id ascending.
fn rank(a: &MatchResult, b: &MatchResult, source: DocumentCategory) -> Ordering {
    b.weighted_final_score()
        .total_cmp(&a.weighted_final_score())
        .then_with(|| candidate_id(a, source).cmp(candidate_id(b, source)))
}

fn candidate_id(result: &MatchResult, source: DocumentCategory) -> &str {
    match source {
        DocumentCategory::Cv => &result.job_document().id,
        DocumentCategory::Job => &result.cv_document().id,
    }
}

fn as_category(document: &Document, category: DocumentCategory) -> Document {
    let mut document = document.clone();
    document.category = category;
    document
}

fn completion_message(count: usize, target: DocumentCategory) -> String {
    let noun = match target {
        DocumentCategory::Cv => "CV",
        DocumentCategory::Job => "job",
    };
    if count == 0 {
        format!("No {noun} matches found")
    } else {
        format!("Found {count} {noun} matches")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::analyzers::{Dimension, DimensionAnalysis};
    use crate::errors::{AnalysisError, RepositoryError};
    use crate::events::EventKind;
    use crate::scoring::{Aggregation, AnalysisRecord, Weights};

    // ── Test doubles ──────────────────────────────────────────────────────────

    struct ScriptedRepository {
        documents: Vec<Document>,
        fail: bool,
        requested_limit: Mutex<Option<usize>>,
    }

    impl ScriptedRepository {
        fn with(documents: Vec<Document>) -> Self {
            Self {
                documents,
                fail: false,
                requested_limit: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::with(Vec::new())
            }
        }
    }

    #[async_trait]
    impl CandidateRepository for ScriptedRepository {
        async fn find_similar(
            &self,
            _query: &str,
            category: DocumentCategory,
            limit: usize,
        ) -> Result<Vec<Document>, RepositoryError> {
            *self.requested_limit.lock().unwrap() = Some(limit);
            if self.fail {
                return Err(RepositoryError::Unavailable("index offline".into()));
            }
            Ok(self
                .documents
                .iter()
                .filter(|d| d.category == category)
                .take(limit)
                .cloned()
                .collect())
        }
    }

    /// Scores each candidate uniformly by a per-id script; unscripted ids fail.
    struct ScriptedAnalyzer {
        scores: HashMap<String, f64>,
        calls: AtomicUsize,
    }

    impl ScriptedAnalyzer {
        fn new(scores: &[(&str, f64)]) -> Self {
            Self {
                scores: scores.iter().map(|(id, s)| (id.to_string(), *s)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MatchAnalyzer for ScriptedAnalyzer {
        async fn analyze_match(&self, cv: &Document, job: &Document) -> Result<AnalysisRecord, AnalysisError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            let score = self
                .scores
                .get(&cv.id)
                .or_else(|| self.scores.get(&job.id))
                .copied()
                .ok_or_else(|| AnalysisError::Dimension {
                    dimension: "skills".into(),
                    message: format!("no script for {}/{}", cv.id, job.id),
                })?;
            let analyses = Dimension::ALL
                .iter()
                .map(|d| (*d, DimensionAnalysis::new(score, "scripted")))
                .collect();
            Aggregation::combine(analyses, Weights::default()).into_record()
        }
    }

    /// Delegates to a `ScriptedAnalyzer` but strips `recommendation` from the
    /// records of the listed candidates.
    struct IncompleteRecords {
        inner: ScriptedAnalyzer,
        incomplete: Vec<&'static str>,
    }

    #[async_trait]
    impl MatchAnalyzer for IncompleteRecords {
        async fn analyze_match(&self, cv: &Document, job: &Document) -> Result<AnalysisRecord, AnalysisError> {
            let mut record = self.inner.analyze_match(cv, job).await?;
            if self.incomplete.iter().any(|id| *id == cv.id || *id == job.id) {
                record.remove("recommendation");
            }
            Ok(record)
        }
    }

    #[derive(Default)]
    struct RecordingPublisher(Mutex<Vec<DomainEvent>>);

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: DomainEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn cv(id: &str) -> Document {
        Document::new(id, DocumentCategory::Cv, format!("cv {id}"))
    }

    fn job(id: &str) -> Document {
        Document::new(id, DocumentCategory::Job, format!("job {id}"))
    }

    fn orchestrator(
        repository: Arc<ScriptedRepository>,
        analyzer: Arc<ScriptedAnalyzer>,
        publisher: Arc<RecordingPublisher>,
        limits: MatchingLimits,
    ) -> MatchingOrchestrator {
        MatchingOrchestrator::new(repository, analyzer, ParallelExecutor::new(3), publisher, limits)
    }

    fn scores(results: &[MatchResult]) -> Vec<f64> {
        results.iter().map(|r| (r.weighted_final_score() * 100.0).round() / 100.0).collect()
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_partial_failures_are_dropped_and_rest_ranked() {
        let repo = Arc::new(ScriptedRepository::with(
            ["c1", "c2", "c3", "c4", "c5"].into_iter().map(cv).collect(),
        ));
        // c2 and c4 have no script and fail.
        let analyzer = Arc::new(ScriptedAnalyzer::new(&[("c1", 0.5), ("c3", 0.9), ("c5", 0.1)]));
        let orch = orchestrator(repo, analyzer, Arc::default(), MatchingLimits::default());

        let results = orch.run_match(&job("j1"), DocumentCategory::Cv, None).await.unwrap();

        assert_eq!(scores(&results), vec![0.9, 0.5]);
        assert_eq!(results[0].cv_document().id, "c3");
        assert_eq!(results[1].cv_document().id, "c1");
    }

    #[tokio::test]
    async fn test_empty_pool_schedules_nothing() {
        let repo = Arc::new(ScriptedRepository::with(Vec::new()));
        let analyzer = Arc::new(ScriptedAnalyzer::new(&[]));
        let orch = orchestrator(repo, analyzer.clone(), Arc::default(), MatchingLimits::default());

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let progress = move |_: usize, _: usize| {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
        };

        let results = orch
            .run_match(&cv("c1"), DocumentCategory::Job, Some(&progress))
            .await
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(analyzer.calls.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_output_is_bounded_sorted_and_thresholded() {
        let ids: Vec<String> = (0..10).map(|i| format!("j{i}")).collect();
        let script: Vec<(&str, f64)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), (9 - i) as f64 / 10.0))
            .collect();
        let repo = Arc::new(ScriptedRepository::with(ids.iter().map(|id| job(id)).collect()));
        let analyzer = Arc::new(ScriptedAnalyzer::new(&script));
        let limits = MatchingLimits {
            top_candidates_count: 3,
            min_match_score: 0.75,
        };
        let orch = orchestrator(repo.clone(), analyzer, Arc::default(), limits);

        assert_eq!(orch.limits(), limits);
        let results = orch.run_match(&cv("c1"), DocumentCategory::Job, None).await.unwrap();

        assert_eq!(*repo.requested_limit.lock().unwrap(), Some(6));
        assert_eq!(scores(&results), vec![0.9, 0.8]);
        assert!(results.len() <= 3);
        assert!(results.iter().all(|r| r.weighted_final_score() >= 0.75));
        assert!(results
            .windows(2)
            .all(|w| w[0].weighted_final_score() >= w[1].weighted_final_score()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_equal_scores_break_ties_by_candidate_id() {
        let repo = Arc::new(ScriptedRepository::with(vec![job("b"), job("c"), job("a")]));
        let analyzer = Arc::new(ScriptedAnalyzer::new(&[("a", 0.6), ("b", 0.6), ("c", 0.6)]));
        let orch = orchestrator(repo, analyzer, Arc::default(), MatchingLimits::default());

        let results = orch.run_match(&cv("c1"), DocumentCategory::Job, None).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.job_document().id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_progress_counts_every_task() {
        let repo = Arc::new(ScriptedRepository::with(["c1", "c2", "c3"].into_iter().map(cv).collect()));
        let analyzer = Arc::new(ScriptedAnalyzer::new(&[("c1", 0.8)]));
        let orch = orchestrator(repo, analyzer, Arc::default(), MatchingLimits::default());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress = move |done: usize, total: usize| sink.lock().unwrap().push((done, total));

        orch.match_job_to_cvs_with_progress(&job("j1"), Some(&progress))
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_incomplete_records_are_dropped_like_failures() {
        let repo = Arc::new(ScriptedRepository::with(["j1", "j2", "j3", "j4"].into_iter().map(job).collect()));
        let analyzer = Arc::new(IncompleteRecords {
            inner: ScriptedAnalyzer::new(&[("j1", 0.9), ("j2", 0.95), ("j3", 0.6), ("j4", 0.7)]),
            incomplete: vec!["j2", "j4"],
        });
        let orch = MatchingOrchestrator::new(
            repo,
            analyzer,
            ParallelExecutor::new(2),
            Arc::new(RecordingPublisher::default()),
            MatchingLimits::default(),
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress = move |done: usize, total: usize| sink.lock().unwrap().push((done, total));

        let results = orch
            .match_cv_to_jobs_with_progress(&cv("c1"), Some(&progress))
            .await
            .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.job_document().id.as_str()).collect();
        assert_eq!(ids, vec!["j1", "j3"]);
        assert_eq!(scores(&results), vec![0.9, 0.6]);
        assert_eq!(seen.lock().unwrap().last(), Some(&(4, 4)));
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_completed_event_reports_match_count() {
        let repo = Arc::new(ScriptedRepository::with(vec![job("j1"), job("j2")]));
        let analyzer = Arc::new(ScriptedAnalyzer::new(&[("j1", 0.9), ("j2", 0.7)]));
        let publisher = Arc::new(RecordingPublisher::default());
        let orch = orchestrator(repo, analyzer, publisher.clone(), MatchingLimits::default());

        let results = orch.match_cv_to_jobs(&cv("c1")).await.unwrap();
        assert_eq!(results.len(), 2);

        let events = publisher.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::MatchingCompleted);
        assert_eq!(events[0].message, "Found 2 job matches");
        assert_eq!(events[0].context, CV_TO_JOBS_CONTEXT);
    }

    #[tokio::test]
    async fn test_completed_event_when_nothing_matches() {
        let repo = Arc::new(ScriptedRepository::with(Vec::new()));
        let analyzer = Arc::new(ScriptedAnalyzer::new(&[]));
        let publisher = Arc::new(RecordingPublisher::default());
        let orch = orchestrator(repo, analyzer, publisher.clone(), MatchingLimits::default());

        orch.match_job_to_cvs(&job("j1")).await.unwrap();
        let events = publisher.0.lock().unwrap();
        assert_eq!(events[0].message, "No CV matches found");
        assert_eq!(events[0].context, JOB_TO_CVS_CONTEXT);
    }

    #[tokio::test]
    async fn test_repository_failure_is_wrapped_and_published() {
        let repo = Arc::new(ScriptedRepository::failing());
        let analyzer = Arc::new(ScriptedAnalyzer::new(&[]));
        let publisher = Arc::new(RecordingPublisher::default());
        let orch = orchestrator(repo, analyzer, publisher.clone(), MatchingLimits::default());

        let err = orch.match_job_to_cvs(&job("j1")).await.unwrap_err();
        assert!(matches!(err, MatchingError::Repository(_)));
        assert!(err.to_string().starts_with("Matching operation failed"));

        let events = publisher.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::MatchingFailed);
        assert!(events[0].message.starts_with("Job to CVs Matching: Matching operation failed"));
    }
}
