use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::analyzers::keyword::tokens;
use crate::errors::RepositoryError;
use crate::models::{Document, DocumentCategory};
use crate::repository::CandidateRepository;

/// Corpus held in memory, ranked by token overlap with the query.
#[derive(Default)]
pub struct InMemoryRepository {
    documents: RwLock<Vec<Document>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Adds a document, replacing any stored document with the same id and category.
    pub fn add_document(&self, document: Document) -> Result<(), RepositoryError> {
        let mut documents = self.write()?;
        documents.retain(|d| !(d.id == document.id && d.category == document.category));
        documents.push(document);
        Ok(())
    }

    pub fn documents_by_category(&self, category: DocumentCategory) -> Result<Vec<Document>, RepositoryError> {
        Ok(self
            .read()?
            .iter()
            .filter(|d| d.category == category)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> usize {
        self.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads every file under `<root>/cv` and `<root>/job`. The file stem becomes
    /// the document id and the file name is kept as `filename` metadata.
    /// A missing category directory is skipped.
    pub async fn load_dir(root: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let root = root.as_ref();
        let repository = Self::new();

        for category in [DocumentCategory::Cv, DocumentCategory::Job] {
            let dir = root.join(category.as_str());
            if !tokio::fs::try_exists(&dir).await? {
                warn!(path = %dir.display(), "corpus directory missing, skipping");
                continue;
            }

            let mut entries = tokio::fs::read_dir(&dir).await?;
            let mut loaded = 0usize;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if !entry.file_type().await?.is_file() {
                    continue;
                }
                let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let filename = path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or(id)
                    .to_string();

                let content = tokio::fs::read_to_string(&path).await?;
                repository.add_document(Document::new(id, category, content).with_metadata("filename", filename))?;
                loaded += 1;
            }
            info!(category = %category, loaded, "corpus loaded");
        }

        Ok(repository)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Document>>, RepositoryError> {
        self.documents
            .read()
            .map_err(|_| RepositoryError::Unavailable("document store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Document>>, RepositoryError> {
        self.documents
            .write()
            .map_err(|_| RepositoryError::Unavailable("document store lock poisoned".to_string()))
    }
}

/// Share of query tokens found in the document.
fn overlap(query: &HashSet<String>, content: &str) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let doc = tokens(content);
    query.intersection(&doc).count() as f64 / query.len() as f64
}

#[async_trait]
impl CandidateRepository for InMemoryRepository {
    async fn find_similar(
        &self,
        query: &str,
        category: DocumentCategory,
        limit: usize,
    ) -> Result<Vec<Document>, RepositoryError> {
        let query_tokens = tokens(query);
        let documents = self.read()?;
        let mut ranked: Vec<(f64, &Document)> = documents
            .iter()
            .filter(|d| d.category == category)
            .map(|d| (overlap(&query_tokens, &d.content), d))
            .collect();

        ranked.sort_by(|(a_score, a), (b_score, b)| b_score.total_cmp(a_score).then_with(|| a.id.cmp(&b.id)));
        ranked.truncate(limit);

        debug!(%category, limit, returned = ranked.len(), "in-memory similarity search");
        Ok(ranked.into_iter().map(|(_, d)| d.clone()).collect())
    }
}
