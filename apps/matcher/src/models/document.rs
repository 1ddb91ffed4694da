use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Cv,
    Job,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Cv => "cv",
            DocumentCategory::Job => "job",
        }
    }

    /// The category a document of this kind is matched against.
    pub fn opposite(&self) -> Self {
        match self {
            DocumentCategory::Cv => DocumentCategory::Job,
            DocumentCategory::Job => DocumentCategory::Cv,
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cv" => Ok(DocumentCategory::Cv),
            "job" => Ok(DocumentCategory::Job),
            other => Err(format!("unknown document category '{other}' (expected cv or job)")),
        }
    }
}

/// A CV or job posting. Immutable once built; cloned into each matching task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub category: DocumentCategory,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, category: DocumentCategory, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            content: content.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Original filename, falling back to the id for documents that never had one.
    pub fn filename(&self) -> &str {
        self.metadata
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or(&self.id)
    }
}
