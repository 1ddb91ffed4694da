use serde_json::{Map, Value};

use crate::analyzers::Dimension;
use crate::errors::AssemblyError;
use crate::models::{AgentScores, Document, MatchResult, Recommendation};
use crate::scoring::aggregator::AnalysisRecord;

const REQUIRED_FIELDS: [&str; 8] = [
    "skills_score",
    "location_score",
    "experience_score",
    "preferences_score",
    "education_score",
    "weighted_final_score",
    "recommendation",
    "explanation",
];

/// Builds a `MatchResult` from an aggregation record.
///
/// Every required key is checked before anything is parsed, so a record with
/// gaps fails with the full list of missing keys and no partial entity is
/// ever built. The caller supplies the document pair.
pub fn assemble_match_result(
    record: &AnalysisRecord,
    cv_document: Document,
    job_document: Document,
) -> Result<MatchResult, AssemblyError> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|key| !record.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AssemblyError::MissingFields(missing));
    }

    let agent_scores = AgentScores {
        skills: unit_score(record, &Dimension::Skills.score_key())?,
        location: unit_score(record, &Dimension::Location.score_key())?,
        experience: unit_score(record, &Dimension::Experience.score_key())?,
        preferences: unit_score(record, &Dimension::Preferences.score_key())?,
        education: unit_score(record, &Dimension::Education.score_key())?,
        explanation: String::new(),
    };
    let weighted_final_score = unit_score(record, "weighted_final_score")?;
    let recommendation: Recommendation = string_field(record, "recommendation")?.parse()?;
    let explanation = string_field(record, "explanation")?.to_string();

    let detailed_results = match record.get("detailed_results") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => return Err(invalid("detailed_results", "expected an object")),
    };

    Ok(MatchResult::new(
        cv_document,
        job_document,
        weighted_final_score,
        recommendation,
        explanation,
        agent_scores,
        detailed_results,
    ))
}

fn invalid(field: &str, reason: &str) -> AssemblyError {
    AssemblyError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn unit_score(record: &Map<String, Value>, key: &str) -> Result<f64, AssemblyError> {
    let value = record
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid(key, "expected a number"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(key, &format!("{value} is outside [0, 1]")));
    }
    Ok(value)
}

fn string_field<'a>(record: &'a Map<String, Value>, key: &str) -> Result<&'a str, AssemblyError> {
    record
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(key, "expected a string"))
}
