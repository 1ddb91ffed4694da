use thiserror::Error;

/// Failure of a single dimension analyzer or of a whole aggregation.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{dimension} analysis failed: {message}")]
    Dimension { dimension: String, message: String },

    #[error("Failed to encode analysis record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Raised while turning an aggregation record into a `MatchResult`.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Unknown recommendation: {0}")]
    UnknownRecommendation(String),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

/// Storage or transport failure inside a candidate repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Agent weights must sum to 1.0, got {total:.3}")]
    WeightSum { total: f64 },

    #[error("Weight '{name}' must not be negative, got {value}")]
    NegativeWeight { name: String, value: f64 },

    #[error("MIN_MATCH_SCORE must be between 0 and 1, got {0}")]
    MinMatchScore(f64),

    #[error("TOP_CANDIDATES_COUNT must be at least 1")]
    TopCandidatesCount,

    #[error("MAX_WORKERS must be at least 1")]
    MaxWorkers,

    #[error("Environment variable '{key}' is invalid: {reason}")]
    InvalidVar { key: String, reason: String },

    #[error("Required environment variable '{0}' is not set")]
    MissingVar(String),
}

/// The single error a match request surfaces to its caller.
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("Matching operation failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// Why one candidate was dropped from a batch.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}
