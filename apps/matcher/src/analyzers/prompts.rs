// Prompts for the LLM-backed dimension analyzers.
// Every prompt asks for the same JSON envelope so one response type covers all five.

use super::Dimension;

/// System prompt shared by every dimension call.
pub const ANALYSIS_SYSTEM: &str = "You are an experienced technical recruiter comparing a \
    candidate profile (CV) with a job posting. You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Output contract appended to every dimension prompt.
const RESPONSE_FORMAT: &str = "\
    Respond with a JSON object of the form \
    {\"score\": <number between 0.0 and 1.0>, \"explanation\": \"<one or two sentences>\", \
    \"details\": {<dimension-specific fields>}}.";

fn focus(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Skills => "\
            Compare the candidate's technical and soft skills with the skills the job requires. \
            List cv_skills, required_skills and matched_skills in details. \
            Score 1.0 when every required skill is covered.",
        Dimension::Location => "\
            Compare the candidate's location with the job location, taking remote or hybrid \
            work into account. Put candidate_location, job_location, remote_work and \
            commute_feasibility in details.",
        Dimension::Experience => "\
            Compare the candidate's years of experience and seniority level with what the \
            job requires. Put cv_experience_years, required_experience_years, cv_level and \
            required_level in details.",
        Dimension::Preferences => "\
            Compare the candidate's stated work preferences (work style, team size, culture, \
            contract type) with the job's culture and working conditions. Put cv_preferences, \
            job_culture and work_style_match in details.",
        Dimension::Education => "\
            Compare the candidate's degrees, fields of study and certifications with the \
            job's education requirements. Put cv_degree, cv_field, required_degree, \
            required_field and certifications in details. Score 1.0 when the job states \
            no education requirement.",
    }
}

/// Builds the user prompt for one dimension.
pub fn build_prompt(dimension: Dimension, cv_content: &str, job_content: &str) -> String {
    format!(
        "Dimension: {}\n\n{}\n\n{}\n\n<cv>\n{}\n</cv>\n\n<job>\n{}\n</job>",
        dimension.label(),
        focus(dimension),
        RESPONSE_FORMAT,
        cv_content,
        job_content
    )
}
