//! H1B Eligibility: combines the match analysis, visa timeline, background
//! answers and transcript into one structured completion.
//!
//! Flow: calculate_visa_timeline(today) → build prompt → complete_json → report.
//! The report is the model's judgment; nothing here validates it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::matching::MatchAnalysis;
use crate::analysis::prompts::{
    ELIGIBILITY_PROMPT_TEMPLATE, ELIGIBILITY_SYSTEM_ROLE, ELIGIBILITY_TEMPERATURE,
};
use crate::errors::AppError;
use crate::llm_client::prompts::{json_system, render_template};
use crate::llm_client::{complete_json, CompletionRequest, StructuredCompletion};
use crate::visa::models::VisaDetails;
use crate::visa::timeline::{calculate_visa_timeline, effective_hiring_deadline, VisaTimeline};

// ────────────────────────────────────────────────────────────────────────────
// Report data models (mirror the JSON schema in the eligibility prompt)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub eligibility_factors: EligibilityFactors,
    pub specialty_occupation_assessment: SpecialtyOccupationAssessment,
    pub stem_qualification: StemQualification,
    pub timeline_assessment: TimelineAssessment,
    pub overall_assessment: OverallAssessment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityFactors {
    pub education_qualification: EducationQualification,
    pub job_match_assessment: JobMatchAssessment,
    pub visa_timing: VisaTiming,
    pub background_check: BackgroundCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationQualification {
    pub score: f64,
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatchAssessment {
    pub score: f64,
    #[serde(default)]
    pub critical_gaps: Vec<String>,
    #[serde(default)]
    pub impact_on_h1b: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisaTiming {
    pub score: f64,
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub key_dates: KeyDates,
    #[serde(default)]
    pub risks: Vec<String>,
}

/// Dates as the model wrote them; not parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyDates {
    pub h1b_window_start: Option<String>,
    pub h1b_window_end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundCheck {
    pub status: String,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyOccupationAssessment {
    pub qualifies: bool,
    #[serde(default)]
    pub supporting_factors: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub job_skill_alignment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StemQualification {
    pub eligible_for_stem_opt: bool,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineAssessment {
    #[serde(default)]
    pub immediate_actions: Vec<String>,
    #[serde(default)]
    pub upcoming_deadlines: UpcomingDeadlines,
    #[serde(default)]
    pub contingency_plans: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpcomingDeadlines {
    pub next_h1b_filing: Option<String>,
    pub current_status_expiry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    pub eligible: bool,
    pub confidence_score: f64,
    /// Free text from the model; expected LOW / MEDIUM / HIGH.
    pub risk_level: String,
    #[serde(default)]
    pub key_concerns: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Eligibility report plus the timeline that was fed into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityOutcome {
    pub timeline: VisaTimeline,
    pub report: EligibilityReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt assembly
// ────────────────────────────────────────────────────────────────────────────

const NOT_APPLICABLE: &str = "Not applicable";

pub fn build_eligibility_prompt(
    transcript_text: &str,
    match_analysis: &MatchAnalysis,
    visa: &VisaDetails,
    timeline: &VisaTimeline,
) -> Result<String, AppError> {
    let match_percentage = format!("{:.0}", match_analysis.clamped_percentage());
    let matching_skills = match_analysis.matching_skills.join(", ");
    let missing_requirements = match_analysis.missing_requirements.join(", ");

    let validity_window = visa
        .window
        .map(|w| format!("{} to {}", w.start, w.end))
        .unwrap_or_else(|| NOT_APPLICABLE.to_string());
    let hiring_deadline = visa
        .window
        .map(|w| effective_hiring_deadline(w.end).to_string())
        .unwrap_or_else(|| NOT_APPLICABLE.to_string());

    let timeline_json =
        serde_json::to_string(timeline).map_err(|e| AppError::Internal(e.into()))?;
    let criminal_history_json = serde_json::to_string(&visa.criminal_history)
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(render_template(
        ELIGIBILITY_PROMPT_TEMPLATE,
        &[
            ("match_percentage", match_percentage.as_str()),
            ("matching_skills", matching_skills.as_str()),
            ("missing_requirements", missing_requirements.as_str()),
            ("required_education", match_analysis.required_education.as_str()),
            ("industry_alignment", match_analysis.industry_alignment.as_str()),
            ("visa_status", visa.status.as_str()),
            ("stem_degree", if visa.is_stem_degree { "Yes" } else { "No" }),
            ("validity_window", validity_window.as_str()),
            ("hiring_deadline", hiring_deadline.as_str()),
            ("timeline_json", timeline_json.as_str()),
            ("criminal_history_json", criminal_history_json.as_str()),
            ("transcript_text", transcript_text),
        ],
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Assessment
// ────────────────────────────────────────────────────────────────────────────

/// Runs the eligibility assessment relative to `today`.
pub async fn assess_eligibility(
    llm: &dyn StructuredCompletion,
    today: NaiveDate,
    transcript_text: &str,
    match_analysis: &MatchAnalysis,
    visa: &VisaDetails,
) -> Result<EligibilityOutcome, AppError> {
    if transcript_text.trim().is_empty() {
        return Err(AppError::Validation("A transcript is required".to_string()));
    }

    let timeline = calculate_visa_timeline(today, visa.status, visa.window.map(|w| w.end));
    info!(
        "Visa timeline for {}: days_remaining={:?}, risk={}",
        visa.status,
        timeline.days_remaining,
        timeline.risk_level.as_str()
    );

    let prompt = build_eligibility_prompt(transcript_text, match_analysis, visa, &timeline)?;
    let system = json_system(ELIGIBILITY_SYSTEM_ROLE);
    let request =
        CompletionRequest::new(&system, &prompt).with_temperature(ELIGIBILITY_TEMPERATURE);

    let report: EligibilityReport = complete_json(llm, request)
        .await
        .map_err(|e| AppError::llm("H1B eligibility analysis", e))?;

    info!(
        "Eligibility: eligible={}, confidence={}, risk={}",
        report.overall_assessment.eligible,
        report.overall_assessment.confidence_score,
        report.overall_assessment.risk_level
    );

    Ok(EligibilityOutcome { timeline, report })
}
