pub mod document;
pub mod match_result;

pub use document::{Document, DocumentCategory};
pub use match_result::{format_score, AgentScores, MatchResult, MatchSummary, Recommendation};
