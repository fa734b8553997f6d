//! Resume ↔ JD match analysis: one structured completion per run.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::prompts::{MATCH_PROMPT_TEMPLATE, MATCH_SYSTEM_ROLE};
use crate::errors::AppError;
use crate::llm_client::prompts::{json_system, render_template};
use crate::llm_client::{complete_json, CompletionRequest, StructuredCompletion};

/// Structured output of the match analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    pub match_percentage: f64,
    #[serde(default)]
    pub matching_skills: Vec<String>,
    #[serde(default)]
    pub missing_requirements: Vec<String>,
    #[serde(default)]
    pub job_title_match: bool,
    #[serde(default)]
    pub required_education: String,
    #[serde(default)]
    pub industry_alignment: String,
    #[serde(default)]
    pub role_summary: String,
}

impl MatchAnalysis {
    /// Model output is not trusted to stay in range.
    pub fn clamped_percentage(&self) -> f64 {
        self.match_percentage.clamp(0.0, 100.0)
    }

    pub fn meets_threshold(&self, min_match: f64) -> bool {
        self.clamped_percentage() >= min_match
    }
}

pub fn build_match_prompt(resume_text: &str, jd_text: &str) -> String {
    render_template(
        MATCH_PROMPT_TEMPLATE,
        &[("jd_text", jd_text), ("resume_text", resume_text)],
    )
}

/// Asks the model how well the resume covers the job description.
pub async fn analyze_match(
    llm: &dyn StructuredCompletion,
    resume_text: &str,
    jd_text: &str,
) -> Result<MatchAnalysis, AppError> {
    if resume_text.trim().is_empty() || jd_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Both a resume and a job description are required".to_string(),
        ));
    }

    let prompt = build_match_prompt(resume_text, jd_text);
    let system = json_system(MATCH_SYSTEM_ROLE);

    let analysis: MatchAnalysis = complete_json(llm, CompletionRequest::new(&system, &prompt))
        .await
        .map_err(|e| AppError::llm("Resume-JD match analysis", e))?;

    info!(
        "Match analysis: {:.0}% ({} matching, {} missing)",
        analysis.clamped_percentage(),
        analysis.matching_skills.len(),
        analysis.missing_requirements.len()
    );

    Ok(analysis)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{match_analysis, MATCH_JSON};
    use super::*;
    use crate::llm_client::testing::ScriptedCompletion;

    #[test]
    fn test_match_prompt_contains_both_documents() {
        let prompt = build_match_prompt("RESUME BODY", "JD BODY");
        assert!(prompt.contains("RESUME BODY"));
        assert!(prompt.contains("JD BODY"));
        assert!(prompt.find("JD BODY").unwrap() < prompt.find("RESUME BODY").unwrap());
        assert!(!prompt.contains("{jd_text}"));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(match_analysis(50.0).meets_threshold(50.0));
        assert!(!match_analysis(49.5).meets_threshold(50.0));
    }

    #[test]
    fn test_out_of_range_percentage_is_clamped() {
        assert_eq!(match_analysis(140.0).clamped_percentage(), 100.0);
        assert_eq!(match_analysis(-3.0).clamped_percentage(), 0.0);
    }

    #[test]
    fn test_optional_fields_default_when_missing() {
        let parsed: MatchAnalysis = serde_json::from_str(r#"{"match_percentage": 40}"#).unwrap();
        assert_eq!(parsed.match_percentage, 40.0);
        assert!(parsed.matching_skills.is_empty());
        assert!(!parsed.job_title_match);
    }

    #[tokio::test]
    async fn test_analyze_match_parses_model_reply() {
        let llm = ScriptedCompletion::new().reply(MATCH_JSON);
        let analysis = analyze_match(&llm, "resume", "jd").await.unwrap();
        assert_eq!(analysis, match_analysis(72.0));

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system.contains("ATS"));
        assert_eq!(calls[0].temperature, None);
    }

    #[tokio::test]
    async fn test_analyze_match_fails_on_prose_reply() {
        let llm = ScriptedCompletion::new().reply("The candidate looks great!");
        let err = analyze_match(&llm, "resume", "jd").await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_analyze_match_requires_both_texts() {
        let llm = ScriptedCompletion::new();
        let err = analyze_match(&llm, "resume", "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(llm.calls().is_empty());
    }
}
