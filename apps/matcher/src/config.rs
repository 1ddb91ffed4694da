use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::errors::ConfigError;
use crate::executor::DEFAULT_MAX_WORKERS;
use crate::matching::{MatchingLimits, DEFAULT_MIN_MATCH_SCORE, DEFAULT_TOP_CANDIDATES_COUNT};
use crate::scoring::Weights;

/// Which dimension analyzers score each pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyzerBackend {
    #[default]
    Keyword,
    Llm,
}

impl FromStr for AnalyzerBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyword" => Ok(AnalyzerBackend::Keyword),
            "llm" => Ok(AnalyzerBackend::Llm),
            other => Err(format!("expected 'keyword' or 'llm', got '{other}'")),
        }
    }
}

/// Matcher configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub top_candidates_count: usize,
    pub min_match_score: f64,
    pub max_workers: usize,
    /// Per-candidate deadline; `None` lets a task run as long as it needs.
    pub task_timeout: Option<Duration>,
    pub weights: Weights,
    pub analyzer_backend: AnalyzerBackend,
    pub anthropic_api_key: Option<String>,
    /// When set, candidates come from Postgres instead of a corpus directory.
    pub database_url: Option<String>,
    pub rust_log: String,
}

impl Config {
    /// Loads `.env` if present, reads the process environment and validates.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Self::from_lookup(|key| std::env::var(key).ok()).context("Invalid matcher configuration")?;
        config.validate().context("Invalid matcher configuration")?;
        Ok(config)
    }

    /// Builds a config from any key lookup. Unset keys take their defaults;
    /// set but unparsable keys are errors. Does not validate.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Weights::default();
        let weights = Weights {
            skills: parse_or(&lookup, "SKILLS_WEIGHT", defaults.skills)?,
            location: parse_or(&lookup, "LOCATION_WEIGHT", defaults.location)?,
            experience: parse_or(&lookup, "EXPERIENCE_WEIGHT", defaults.experience)?,
            preferences: parse_or(&lookup, "PREFERENCES_WEIGHT", defaults.preferences)?,
            education: parse_or(&lookup, "EDUCATION_WEIGHT", defaults.education)?,
        };

        let task_timeout = parse_opt::<u64, _>(&lookup, "TASK_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Config {
            top_candidates_count: parse_or(&lookup, "TOP_CANDIDATES_COUNT", DEFAULT_TOP_CANDIDATES_COUNT)?,
            min_match_score: parse_or(&lookup, "MIN_MATCH_SCORE", DEFAULT_MIN_MATCH_SCORE)?,
            max_workers: parse_or(&lookup, "MAX_WORKERS", DEFAULT_MAX_WORKERS)?,
            task_timeout,
            weights,
            analyzer_backend: parse_or(&lookup, "ANALYZER_BACKEND", AnalyzerBackend::default())?,
            anthropic_api_key: non_empty(&lookup, "ANTHROPIC_API_KEY"),
            database_url: non_empty(&lookup, "DATABASE_URL"),
            rust_log: non_empty(&lookup, "RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if !(0.0..=1.0).contains(&self.min_match_score) {
            return Err(ConfigError::MinMatchScore(self.min_match_score));
        }
        if self.top_candidates_count < 1 {
            return Err(ConfigError::TopCandidatesCount);
        }
        if self.max_workers < 1 {
            return Err(ConfigError::MaxWorkers);
        }
        if self.analyzer_backend == AnalyzerBackend::Llm && self.anthropic_api_key.is_none() {
            return Err(ConfigError::MissingVar("ANTHROPIC_API_KEY".to_string()));
        }
        Ok(())
    }

    pub fn limits(&self) -> MatchingLimits {
        MatchingLimits {
            top_candidates_count: self.top_candidates_count,
            min_match_score: self.min_match_score,
        }
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_opt<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::InvalidVar {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.top_candidates_count, 5);
        assert_eq!(cfg.min_match_score, 0.3);
        assert_eq!(cfg.max_workers, 5);
        assert_eq!(cfg.task_timeout, None);
        assert_eq!(cfg.weights, Weights::default());
        assert_eq!(cfg.analyzer_backend, AnalyzerBackend::Keyword);
        assert_eq!(cfg.rust_log, "info");
        cfg.validate().unwrap();
    }

    #[test]
    fn test_overrides_are_parsed() {
        let cfg = config(&[
            ("TOP_CANDIDATES_COUNT", "10"),
            ("MIN_MATCH_SCORE", "0.5"),
            ("TASK_TIMEOUT_SECS", "30"),
            ("ANALYZER_BACKEND", "LLM"),
            ("ANTHROPIC_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert_eq!(cfg.top_candidates_count, 10);
        assert_eq!(cfg.limits().min_match_score, 0.5);
        assert_eq!(cfg.task_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.analyzer_backend, AnalyzerBackend::Llm);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_unparsable_value_names_the_key() {
        let err = config(&[("MAX_WORKERS", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { ref key, .. } if key == "MAX_WORKERS"));
    }

    #[test]
    fn test_weight_sum_outside_tolerance_fails_validation() {
        let cfg = config(&[("SKILLS_WEIGHT", "0.25")]).unwrap(); // sum 0.95
        assert!(matches!(cfg.validate(), Err(ConfigError::WeightSum { .. })));

        let cfg = config(&[("SKILLS_WEIGHT", "0.305")]).unwrap(); // sum 1.005
        cfg.validate().unwrap();
    }

    #[test]
    fn test_out_of_range_limits_fail_validation() {
        let cfg = config(&[("MIN_MATCH_SCORE", "1.5")]).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::MinMatchScore(_))));

        let cfg = config(&[("TOP_CANDIDATES_COUNT", "0")]).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::TopCandidatesCount)));

        let cfg = config(&[("MAX_WORKERS", "0")]).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::MaxWorkers)));
    }

    #[test]
    fn test_llm_backend_requires_api_key() {
        let cfg = config(&[("ANALYZER_BACKEND", "llm")]).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingVar(ref k)) if k == "ANTHROPIC_API_KEY"));
    }
}
