// Matching: per-candidate tasks and the orchestrator that ranks them.

pub mod orchestrator;
pub mod task;

pub use orchestrator::{
    MatchingLimits, MatchingOrchestrator, CV_TO_JOBS_CONTEXT, DEFAULT_MIN_MATCH_SCORE, DEFAULT_TOP_CANDIDATES_COUNT,
    JOB_TO_CVS_CONTEXT,
};
pub use task::MatchTask;
