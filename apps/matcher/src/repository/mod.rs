//! Candidate Repository — similarity search over the stored document corpus.
//!
//! The orchestrator only sees the `CandidateRepository` trait. Two backends:
//! an in-memory corpus (loaded from a directory or built in tests) and a
//! Postgres table ranked with full-text search.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::errors::RepositoryError;
use crate::models::{Document, DocumentCategory};

pub use memory::InMemoryRepository;
pub use postgres::PgCandidateRepository;

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Up to `limit` documents of `category`, most similar to `query` first.
    async fn find_similar(
        &self,
        query: &str,
        category: DocumentCategory,
        limit: usize,
    ) -> Result<Vec<Document>, RepositoryError>;
}
