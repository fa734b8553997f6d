// All LLM prompt constants for the analysis module.
// Templates use `{placeholder}` markers replaced before sending.

/// Role half of the match-analysis system prompt.
pub const MATCH_SYSTEM_ROLE: &str = "You are an expert ATS (applicant tracking system) analyzer. \
    Assess the alignment between the skills in a resume and a job description. \
    When a skill does not directly match a requirement, judge its relevance by whether it \
    falls under a broader related field that still serves the role's core competencies \
    (for example, machine learning experience counts toward a general computer science role). \
    Give related skills partial credit, but always rank direct matches highest.";

/// Match-analysis prompt. Replace `{jd_text}` and `{resume_text}` before sending.
pub const MATCH_PROMPT_TEMPLATE: &str = r#"Analyze the match between this resume and job description.

JOB DESCRIPTION:
{jd_text}

RESUME:
{resume_text}

Return a JSON object with this EXACT schema:
{
  "match_percentage": 0-100,
  "matching_skills": ["string"],
  "missing_requirements": ["string"],
  "job_title_match": true,
  "required_education": "string (education level the JD asks for)",
  "industry_alignment": "string",
  "role_summary": "string"
}"#;

/// Role half of the eligibility system prompt.
pub const ELIGIBILITY_SYSTEM_ROLE: &str = "You are an expert H1B visa analyst. \
    Consider both the candidate's qualifications and the job match when judging H1B eligibility. \
    A strong job match (above 65%) significantly improves H1B chances. \
    Missing job requirements or a poor skill match increase the risk of denial. \
    A criminal history makes approval unlikely and needs far more supporting detail to assess. \
    Respond with ONLY a JSON object matching the requested structure.";

/// Eligibility prompt. Replace:
/// {match_percentage}, {matching_skills}, {missing_requirements},
/// {required_education}, {industry_alignment}, {visa_status}, {stem_degree},
/// {validity_window}, {hiring_deadline}, {timeline_json}, {criminal_history_json},
/// {transcript_text}
pub const ELIGIBILITY_PROMPT_TEMPLATE: &str = r#"Analyze H1B visa eligibility from the information below.
Consider both the candidate's qualifications and the job match analysis.

JOB MATCH ANALYSIS SUMMARY:
- Overall Match: {match_percentage}%
- Matching Skills: {matching_skills}
- Missing Requirements: {missing_requirements}
- Required Education: {required_education}
- Industry Alignment: {industry_alignment}

Factors to weigh:
1. A match percentage below 65% indicates higher risk for H1B approval
2. Missing requirements can undermine specialty occupation qualification
3. Education alignment is crucial for H1B qualification
4. Industry alignment affects the specialty occupation determination

Return a JSON object with this EXACT structure:
{
  "eligibility_factors": {
    "education_qualification": {
      "score": 0-100,
      "analysis": "string (education match against transcript and job requirements)",
      "risks": ["string"]
    },
    "job_match_assessment": {
      "score": {match_percentage},
      "critical_gaps": ["string"],
      "impact_on_h1b": "string"
    },
    "visa_timing": {
      "score": 0-100,
      "analysis": "string",
      "key_dates": {
        "h1b_window_start": "YYYY-MM-DD",
        "h1b_window_end": "YYYY-MM-DD"
      },
      "risks": ["string"]
    },
    "background_check": {
      "status": "string",
      "concerns": ["string"],
      "impact": "string"
    }
  },
  "specialty_occupation_assessment": {
    "qualifies": true,
    "supporting_factors": ["string"],
    "risk_factors": ["string"],
    "job_skill_alignment": "string"
  },
  "stem_qualification": {
    "eligible_for_stem_opt": true,
    "benefits": ["string"],
    "recommendations": ["string"]
  },
  "timeline_assessment": {
    "immediate_actions": ["string"],
    "upcoming_deadlines": {
      "next_h1b_filing": "YYYY-MM-DD",
      "current_status_expiry": "YYYY-MM-DD or null"
    },
    "contingency_plans": ["string"]
  },
  "overall_assessment": {
    "eligible": true,
    "confidence_score": 0-100 (weighted heavily by the job match percentage),
    "risk_level": "LOW" | "MEDIUM" | "HIGH",
    "key_concerns": ["string"],
    "recommendations": ["string"]
  }
}

CANDIDATE INFORMATION:
Current Visa Status: {visa_status}
STEM Degree: {stem_degree}
Validity Window: {validity_window}
Effective Hiring Deadline: {hiring_deadline}
Visa Timeline: {timeline_json}
Criminal History: {criminal_history_json}

TRANSCRIPT:
{transcript_text}"#;

/// Low temperature keeps the eligibility report stable across reruns.
pub const ELIGIBILITY_TEMPERATURE: f32 = 0.1;
