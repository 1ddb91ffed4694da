//! Keyword analyzers — deterministic, no network calls.
//!
//! Processed documents carry one `Label: value` line per field, e.g.
//!
//! ```text
//! Job Title: Backend Engineer
//! Required Skills: Rust, PostgreSQL, Kubernetes
//! Experience Level: Senior
//! Location: Berlin, Germany
//! Culture: remote-first; async communication
//! ```
//!
//! Each analyzer reads the fields relevant to its dimension and scores them.
//! A pair missing the fields an analyzer needs gets the fallback record.

use std::collections::HashSet;

use async_trait::async_trait;

use super::{Dimension, DimensionAnalysis, DimensionAnalyzer};
use crate::errors::AnalysisError;

const STOPWORDS: &[&str] = &[
    "and", "the", "for", "with", "from", "into", "our", "you", "your", "are", "who", "that",
    "this", "have", "has", "will", "not", "but", "all", "any", "can", "work",
];

// ────────────────────────────────────────────────────────────────────────────
// Field helpers
// ────────────────────────────────────────────────────────────────────────────

/// Returns the value of the first `Label: value` line whose label matches one
/// of `labels` (case-insensitive). Empty values count as absent.
pub(crate) fn field<'a>(content: &'a str, labels: &[&str]) -> Option<&'a str> {
    for label in labels {
        for line in content.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case(label) {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Splits a comma or semicolon separated field into lowercase items.
fn split_list(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Lowercase word tokens of length ≥ 3, stopwords removed.
pub(crate) fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '-')
        .map(|t| t.trim_matches('-').to_lowercase())
        .filter(|t| t.len() >= 3 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

/// Share of the job's required skills present in the CV's skill list.
pub struct SkillsAnalyzer;

#[async_trait]
impl DimensionAnalyzer for SkillsAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Skills
    }

    async fn analyze(&self, cv_content: &str, job_content: &str) -> Result<DimensionAnalysis, AnalysisError> {
        Ok(score_skills(cv_content, job_content))
    }
}

/// Whole-word match: "go programming" covers "go", "django" does not.
fn skill_covers(skill: &str, required: &str) -> bool {
    if skill == required {
        return true;
    }
    let words = |s: &str| -> Vec<String> {
        s.split(|c: char| c.is_whitespace() || c == '/')
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    };
    let (skill_words, required_words) = (words(skill), words(required));
    !required_words.is_empty()
        && skill_words
            .windows(required_words.len())
            .any(|window| window == required_words.as_slice())
}

fn score_skills(cv_content: &str, job_content: &str) -> DimensionAnalysis {
    let required = field(job_content, &["Required Skills", "Skills"])
        .map(split_list)
        .unwrap_or_default();
    if required.is_empty() {
        return DimensionAnalysis::fallback(Dimension::Skills);
    }
    let cv_skills = field(cv_content, &["Skills"]).map(split_list).unwrap_or_default();

    let matched: Vec<String> = required
        .iter()
        .filter(|req| cv_skills.iter().any(|skill| skill_covers(skill, req)))
        .cloned()
        .collect();
    let missing: Vec<&str> = required
        .iter()
        .filter(|req| !matched.contains(req))
        .map(String::as_str)
        .collect();

    let score = matched.len() as f64 / required.len() as f64;
    let mut explanation = format!(
        "Matched {} of {} required skills",
        matched.len(),
        required.len()
    );
    if !missing.is_empty() {
        explanation.push_str(&format!(" (missing: {})", missing.join(", ")));
    }

    DimensionAnalysis::new(score, explanation)
        .with_detail("cv_skills", cv_skills)
        .with_detail("required_skills", required.clone())
        .with_detail("matched_skills", matched)
}

// ────────────────────────────────────────────────────────────────────────────
// Location
// ────────────────────────────────────────────────────────────────────────────

const SAME_CITY_SCORE: f64 = 1.0;
const REMOTE_SCORE: f64 = 0.9;
const SAME_COUNTRY_SCORE: f64 = 0.6;
const DIFFERENT_COUNTRY_SCORE: f64 = 0.2;

/// City / remote / country comparison of `Location` fields.
pub struct LocationAnalyzer;

#[async_trait]
impl DimensionAnalyzer for LocationAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Location
    }

    async fn analyze(&self, cv_content: &str, job_content: &str) -> Result<DimensionAnalysis, AnalysisError> {
        Ok(score_location(cv_content, job_content))
    }
}

fn is_remote(job_content: &str) -> bool {
    let location_remote = field(job_content, &["Location"])
        .map(|loc| loc.to_lowercase().contains("remote"))
        .unwrap_or(false);
    let flag_remote = field(job_content, &["Remote Work", "Remote"])
        .map(|v| {
            let v = v.to_lowercase();
            ["yes", "true", "full", "remote", "fully remote"].contains(&v.as_str())
        })
        .unwrap_or(false);
    location_remote || flag_remote
}

fn location_parts(location: &str) -> (String, String) {
    let parts: Vec<String> = location
        .split(',')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    let city = parts.first().cloned().unwrap_or_default();
    let country = parts.last().cloned().unwrap_or_default();
    (city, country)
}

fn score_location(cv_content: &str, job_content: &str) -> DimensionAnalysis {
    let cv_location = field(cv_content, &["Location"]);
    let job_location = field(job_content, &["Location"]);
    let remote = is_remote(job_content);

    let detailed = |score: f64, explanation: String| {
        DimensionAnalysis::new(score, explanation)
            .with_detail("candidate_location", cv_location.unwrap_or_default())
            .with_detail("job_location", job_location.unwrap_or_default())
            .with_detail("remote_work", remote)
    };

    if let (Some(cv_loc), Some(job_loc)) = (cv_location, job_location) {
        let (cv_city, cv_country) = location_parts(cv_loc);
        let (job_city, job_country) = location_parts(job_loc);
        if !cv_city.is_empty() && cv_city == job_city {
            return detailed(SAME_CITY_SCORE, format!("Candidate is based in {job_loc}"));
        }
        if remote {
            return detailed(REMOTE_SCORE, "Position is remote".to_string());
        }
        if !cv_country.is_empty() && cv_country == job_country {
            return detailed(
                SAME_COUNTRY_SCORE,
                format!("Candidate in {cv_loc}, job in {job_loc} (same country)"),
            );
        }
        return detailed(
            DIFFERENT_COUNTRY_SCORE,
            format!("Candidate in {cv_loc}, job in {job_loc}"),
        );
    }

    if remote {
        return detailed(REMOTE_SCORE, "Position is remote".to_string());
    }
    DimensionAnalysis::fallback(Dimension::Location)
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

/// Seniority keywords, lowest first. The highest keyword found wins.
const LEVELS: &[(&str, u8)] = &[
    ("intern", 0),
    ("trainee", 0),
    ("entry", 1),
    ("junior", 1),
    ("mid", 2),
    ("intermediate", 2),
    ("regular", 2),
    ("senior", 3),
    ("lead", 4),
    ("staff", 4),
    ("principal", 5),
    ("head", 5),
    ("director", 5),
];

/// Seniority gap (required − candidate) → score.
const LEVEL_GAP_SCORES: [f64; 3] = [1.0, 0.6, 0.3];

/// Compares seniority levels, falling back to `N years` figures.
pub struct ExperienceAnalyzer;

#[async_trait]
impl DimensionAnalyzer for ExperienceAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Experience
    }

    async fn analyze(&self, cv_content: &str, job_content: &str) -> Result<DimensionAnalysis, AnalysisError> {
        Ok(score_experience(cv_content, job_content))
    }
}

fn parse_level(text: &str) -> Option<u8> {
    let words = tokens(text);
    LEVELS
        .iter()
        .filter(|(kw, _)| words.iter().any(|w| w == kw || w.starts_with(&format!("{kw}-"))))
        .map(|(_, level)| *level)
        .max()
}

/// First `N years` / `N+ years` figure in `text`.
fn parse_years(text: &str) -> Option<f64> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words.windows(2).find_map(|pair| {
        let unit = pair[1].to_lowercase();
        if !(unit.starts_with("year") || unit.starts_with("yr")) {
            return None;
        }
        pair[0].trim_end_matches('+').parse::<f64>().ok()
    })
}

fn score_experience(cv_content: &str, job_content: &str) -> DimensionAnalysis {
    let cv_text = [
        field(cv_content, &["Experience Level"]),
        field(cv_content, &["Years of Experience"]),
        field(cv_content, &["Experience Details"]),
    ];
    let job_text = [
        field(job_content, &["Experience Level"]),
        field(job_content, &["Years of Experience"]),
        field(job_content, &["Requirements"]),
    ];

    let cv_level = field(cv_content, &["Experience Level"]).and_then(parse_level);
    let job_level = field(job_content, &["Experience Level"]).and_then(parse_level);

    if let (Some(cv_level), Some(job_level)) = (cv_level, job_level) {
        let gap = job_level.saturating_sub(cv_level) as usize;
        let score = LEVEL_GAP_SCORES.get(gap).copied().unwrap_or(0.0);
        let explanation = if gap == 0 {
            "Candidate seniority meets the required level".to_string()
        } else {
            format!("Candidate is {gap} seniority level(s) below the requirement")
        };
        return DimensionAnalysis::new(score, explanation)
            .with_detail("cv_level", cv_level)
            .with_detail("required_level", job_level);
    }

    let cv_years = cv_text.iter().flatten().find_map(|t| parse_years(t));
    let job_years = job_text.iter().flatten().find_map(|t| parse_years(t));

    match (cv_years, job_years) {
        (Some(cv_years), Some(required)) => {
            let score = if required <= 0.0 {
                1.0
            } else {
                (cv_years / required).min(1.0)
            };
            DimensionAnalysis::new(
                score,
                format!("{cv_years} years of experience against {required} required"),
            )
            .with_detail("cv_experience_years", cv_years)
            .with_detail("required_experience_years", required)
        }
        _ => DimensionAnalysis::fallback(Dimension::Experience),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Preferences
// ────────────────────────────────────────────────────────────────────────────

/// Share of the job's culture terms mentioned in the candidate's preferences.
pub struct PreferencesAnalyzer;

#[async_trait]
impl DimensionAnalyzer for PreferencesAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Preferences
    }

    async fn analyze(&self, cv_content: &str, job_content: &str) -> Result<DimensionAnalysis, AnalysisError> {
        Ok(score_preferences(cv_content, job_content))
    }
}

fn score_preferences(cv_content: &str, job_content: &str) -> DimensionAnalysis {
    let (Some(cv_prefs), Some(culture)) = (
        field(cv_content, &["Preferences"]),
        field(job_content, &["Culture", "Preferences"]),
    ) else {
        return DimensionAnalysis::fallback(Dimension::Preferences);
    };

    let cv_terms = tokens(cv_prefs);
    let job_terms = tokens(culture);
    if job_terms.is_empty() {
        return DimensionAnalysis::fallback(Dimension::Preferences);
    }

    let mut shared: Vec<&String> = job_terms.intersection(&cv_terms).collect();
    shared.sort();
    let score = shared.len() as f64 / job_terms.len() as f64;
    let explanation = if shared.is_empty() {
        "No overlap between candidate preferences and job culture".to_string()
    } else {
        format!(
            "Shared preferences: {}",
            shared.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        )
    };

    DimensionAnalysis::new(score, explanation)
        .with_detail("cv_preferences", cv_prefs)
        .with_detail("job_culture", culture)
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

const DEGREES: &[(&str, u8)] = &[
    ("associate", 1),
    ("bachelor", 2),
    ("bsc", 2),
    ("licence", 2),
    ("master", 3),
    ("msc", 3),
    ("mba", 3),
    ("phd", 4),
    ("doctorate", 4),
];

/// Partial credit when the candidate is exactly one degree below.
const ONE_DEGREE_BELOW_SCORE: f64 = 0.5;

/// Ordinal degree comparison. No stated requirement scores 1.0.
pub struct EducationAnalyzer;

#[async_trait]
impl DimensionAnalyzer for EducationAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Education
    }

    async fn analyze(&self, cv_content: &str, job_content: &str) -> Result<DimensionAnalysis, AnalysisError> {
        Ok(score_education(cv_content, job_content))
    }
}

fn parse_degree(text: &str) -> Option<u8> {
    let words = tokens(&text.replace('\'', "").replace('.', ""));
    DEGREES
        .iter()
        .filter(|(kw, _)| words.iter().any(|w| w.starts_with(kw)))
        .map(|(_, level)| *level)
        .max()
}

fn score_education(cv_content: &str, job_content: &str) -> DimensionAnalysis {
    let required = field(job_content, &["Required Education", "Education"]).and_then(parse_degree);
    let Some(required) = required else {
        return DimensionAnalysis::new(1.0, "No formal degree requirement");
    };

    let Some(cv_education) = field(cv_content, &["Education"]) else {
        return DimensionAnalysis::new(0.0, "No education listed in CV")
            .with_detail("required_degree", required);
    };

    let cv_degree = parse_degree(cv_education).unwrap_or(0);
    let (score, explanation) = if cv_degree >= required {
        (1.0, "Candidate meets the degree requirement".to_string())
    } else if cv_degree + 1 == required {
        (
            ONE_DEGREE_BELOW_SCORE,
            "Candidate is one degree below the requirement".to_string(),
        )
    } else {
        (0.0, "Candidate does not meet the degree requirement".to_string())
    };

    DimensionAnalysis::new(score, explanation)
        .with_detail("cv_degree", cv_degree)
        .with_detail("required_degree", required)
}
