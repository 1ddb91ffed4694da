use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::errors::RepositoryError;
use crate::models::{Document, DocumentCategory};
use crate::repository::CandidateRepository;

/// Expected schema:
///
/// ```sql
/// CREATE TABLE documents (
///     id       TEXT NOT NULL,
///     category TEXT NOT NULL CHECK (category IN ('cv', 'job')),
///     content  TEXT NOT NULL,
///     metadata JSONB NOT NULL DEFAULT '{}',
///     PRIMARY KEY (category, id)
/// );
/// ```
const FIND_SIMILAR_SQL: &str = r#"
    SELECT id, category, content, metadata
    FROM documents
    WHERE category = $1
    ORDER BY ts_rank(to_tsvector('english', content), plainto_tsquery('english', $2)) DESC, id
    LIMIT $3
"#;

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    category: String,
    content: String,
    metadata: Option<Value>,
}

impl DocumentRow {
    fn into_document(self) -> Result<Document, RepositoryError> {
        let category: DocumentCategory = self.category.parse().map_err(RepositoryError::Unavailable)?;
        let metadata = match self.metadata {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Ok(Document {
            id: self.id,
            category,
            content: self.content,
            metadata,
        })
    }
}

pub struct PgCandidateRepository {
    pool: PgPool,
}

impl PgCandidateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateRepository for PgCandidateRepository {
    async fn find_similar(
        &self,
        query: &str,
        category: DocumentCategory,
        limit: usize,
    ) -> Result<Vec<Document>, RepositoryError> {
        let rows = sqlx::query_as::<_, DocumentRow>(FIND_SIMILAR_SQL)
            .bind(category.as_str())
            .bind(query)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        debug!(%category, limit, returned = rows.len(), "postgres similarity search");
        rows.into_iter().map(DocumentRow::into_document).collect()
    }
}
