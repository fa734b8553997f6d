//! Report rendering: arranges analysis results into metrics, item lists and
//! tabs for the client. Pure data shaping; no model calls.

use serde::Serialize;

use crate::analysis::eligibility::{EligibilityOutcome, EligibilityReport};
use crate::analysis::matching::MatchAnalysis;
use crate::visa::timeline::{RiskLevel, VisaTimeline};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

impl Metric {
    fn percent(label: &str, value: f64) -> Self {
        Self {
            label: label.to_string(),
            value: format!("{value:.0}%"),
        }
    }
}

/// How the client should style the items of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTone {
    Positive,
    Negative,
    Warning,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSection {
    pub title: String,
    pub tone: ItemTone,
    pub items: Vec<String>,
}

impl ItemSection {
    fn new(title: &str, tone: ItemTone, items: &[String]) -> Self {
        Self {
            title: title.to_string(),
            tone,
            items: items.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTab {
    pub title: String,
    pub metrics: Vec<Metric>,
    pub notes: Vec<String>,
    pub sections: Vec<ItemSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskBadge {
    pub level: String,
    pub color: &'static str,
}

/// LOW green, MEDIUM yellow, HIGH red, anything else gray.
pub fn risk_badge(level: &str) -> RiskBadge {
    let color = match level.parse::<RiskLevel>() {
        Ok(RiskLevel::Low) => "green",
        Ok(RiskLevel::Medium) => "yellow",
        Ok(RiskLevel::High) => "red",
        Err(_) => "gray",
    };
    RiskBadge {
        level: level.to_string(),
        color,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Match summary
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub overall_match: Metric,
    pub matching_skills: ItemSection,
    pub missing_requirements: ItemSection,
    pub required_education: String,
    pub industry_alignment: String,
    pub role_summary: String,
    pub can_proceed: bool,
    pub message: String,
}

pub fn summarize_match(analysis: &MatchAnalysis, min_match: f64) -> MatchSummary {
    let can_proceed = analysis.meets_threshold(min_match);
    let message = if can_proceed {
        "Match analysis complete. You can proceed to the H1B eligibility assessment.".to_string()
    } else {
        format!(
            "The resume-job match is below {min_match:.0}%. \
             Consider improving the match before proceeding with the H1B assessment."
        )
    };

    MatchSummary {
        overall_match: Metric::percent("Overall Match", analysis.clamped_percentage()),
        matching_skills: ItemSection::new(
            "Matching Skills",
            ItemTone::Positive,
            &analysis.matching_skills,
        ),
        missing_requirements: ItemSection::new(
            "Missing Requirements",
            ItemTone::Negative,
            &analysis.missing_requirements,
        ),
        required_education: analysis.required_education.clone(),
        industry_alignment: analysis.industry_alignment.clone(),
        role_summary: analysis.role_summary.clone(),
        can_proceed,
        message,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Eligibility tabs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityView {
    pub eligible: bool,
    pub verdict: String,
    pub risk: RiskBadge,
    pub timeline: VisaTimeline,
    pub tabs: Vec<ReportTab>,
}

pub fn render_eligibility(outcome: &EligibilityOutcome) -> EligibilityView {
    let report = &outcome.report;
    let overall = &report.overall_assessment;

    let verdict = if overall.eligible {
        "Candidate appears eligible for H1B visa"
    } else {
        "Candidate may not meet H1B requirements"
    };

    EligibilityView {
        eligible: overall.eligible,
        verdict: verdict.to_string(),
        risk: risk_badge(&overall.risk_level),
        timeline: outcome.timeline.clone(),
        tabs: vec![
            overall_tab(report),
            timeline_tab(report),
            education_tab(report),
            action_items_tab(report),
        ],
    }
}

fn overall_tab(report: &EligibilityReport) -> ReportTab {
    let overall = &report.overall_assessment;
    ReportTab {
        title: "Overall Assessment".to_string(),
        metrics: vec![
            Metric::percent("H1B Eligibility Confidence", overall.confidence_score),
            Metric {
                label: "Risk Level".to_string(),
                value: overall.risk_level.clone(),
            },
        ],
        notes: vec![],
        sections: vec![ItemSection::new(
            "Key Concerns",
            ItemTone::Warning,
            &overall.key_concerns,
        )],
    }
}

fn timeline_tab(report: &EligibilityReport) -> ReportTab {
    let timeline = &report.timeline_assessment;
    let deadlines = &timeline.upcoming_deadlines;

    let metrics = [
        ("Next H1B Filing", &deadlines.next_h1b_filing),
        ("Current Status Expiry", &deadlines.current_status_expiry),
    ]
    .into_iter()
    .filter_map(|(label, date)| {
        date.as_ref().map(|d| Metric {
            label: label.to_string(),
            value: d.clone(),
        })
    })
    .collect();

    ReportTab {
        title: "Timeline Analysis".to_string(),
        metrics,
        notes: vec![],
        sections: vec![
            ItemSection::new(
                "Immediate Actions Required",
                ItemTone::Neutral,
                &timeline.immediate_actions,
            ),
            ItemSection::new(
                "Contingency Plans",
                ItemTone::Neutral,
                &timeline.contingency_plans,
            ),
        ],
    }
}

fn education_tab(report: &EligibilityReport) -> ReportTab {
    let education = &report.eligibility_factors.education_qualification;
    let stem = &report.stem_qualification;

    let stem_note = if stem.eligible_for_stem_opt {
        "Eligible for STEM OPT"
    } else {
        "Not eligible for STEM OPT"
    };

    ReportTab {
        title: "Education & Background".to_string(),
        metrics: vec![Metric::percent("Education Match Score", education.score)],
        notes: vec![education.analysis.clone(), stem_note.to_string()],
        sections: vec![ItemSection::new(
            "Benefits",
            ItemTone::Positive,
            &stem.benefits,
        )],
    }
}

fn action_items_tab(report: &EligibilityReport) -> ReportTab {
    let mut sections = vec![ItemSection::new(
        "Recommendations",
        ItemTone::Neutral,
        &report.overall_assessment.recommendations,
    )];

    let timing_risks = &report.eligibility_factors.visa_timing.risks;
    if !timing_risks.is_empty() {
        sections.push(ItemSection::new(
            "Timeline Risks",
            ItemTone::Negative,
            timing_risks,
        ));
    }

    ReportTab {
        title: "Action Items".to_string(),
        metrics: vec![],
        notes: vec![],
        sections,
    }
}
