//! Visa Timeline: derives filing-window dates and a risk assessment from a
//! visa status and the end of its validity window.
//!
//! Pure and total: the same (reference date, status, end date) always yields
//! the same `VisaTimeline`. The caller supplies the reference date so the
//! function never reads the clock itself.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::visa::models::VisaStatus;

/// Lead time an employer typically needs before the status end date.
/// Used only for narrative context; never subtracted from `days_remaining`.
pub const HIRING_LEAD_TIME_DAYS: i64 = 30;

const OPT_HIGH_RISK_DAYS: i64 = 90;
const STEM_OPT_MEDIUM_RISK_DAYS: i64 = 180;
const H1B_MEDIUM_RISK_DAYS: i64 = 365;

/// Registration opens in the spring; from April onward the next cycle is next year's.
const REGISTRATION_ROLLOVER_MONTH: u32 = 4;

pub const OPT_EXPIRING_ACTION: &str = "Immediate action required - OPT expiring soon";
pub const STEM_OPT_ACTION: &str = "Start preparing for H1B application";
pub const H1B_EXTENSION_ACTION: &str = "Consider H1B extension preparation";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            _ => Err(format!("Unknown risk level '{s}'")),
        }
    }
}

/// Result of the timeline calculation. Created fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaTimeline {
    pub current_status: VisaStatus,
    /// Signed: negative once the status has already expired.
    pub days_remaining: Option<i64>,
    pub needs_immediate_action: bool,
    pub next_h1b_window: NaiveDate,
    pub results_date: NaiveDate,
    /// Empty when no threshold was crossed.
    pub recommended_action: String,
    pub risk_level: RiskLevel,
}

/// Computes the visa timeline relative to `today`.
pub fn calculate_visa_timeline(
    today: NaiveDate,
    status: VisaStatus,
    end_date: Option<NaiveDate>,
) -> VisaTimeline {
    let next_h1b_window = next_h1b_window(today);
    let results_date = h1b_results_date(next_h1b_window);

    let days_remaining = end_date.map(|end| (end - today).num_days());

    let (risk_level, needs_immediate_action, recommended_action) = match days_remaining {
        Some(days) => assess_risk(status, days),
        None => (RiskLevel::Low, false, ""),
    };

    VisaTimeline {
        current_status: status,
        days_remaining,
        needs_immediate_action,
        next_h1b_window,
        results_date,
        recommended_action: recommended_action.to_string(),
        risk_level,
    }
}

/// Status-specific thresholds. Each status has at most one rule; plain F1 has none.
fn assess_risk(status: VisaStatus, days_remaining: i64) -> (RiskLevel, bool, &'static str) {
    match status {
        VisaStatus::F1Opt if days_remaining < OPT_HIGH_RISK_DAYS => {
            (RiskLevel::High, true, OPT_EXPIRING_ACTION)
        }
        VisaStatus::StemOpt if days_remaining < STEM_OPT_MEDIUM_RISK_DAYS => {
            (RiskLevel::Medium, false, STEM_OPT_ACTION)
        }
        VisaStatus::H1b if days_remaining < H1B_MEDIUM_RISK_DAYS => {
            (RiskLevel::Medium, false, H1B_EXTENSION_ACTION)
        }
        _ => (RiskLevel::Low, false, ""),
    }
}

/// January 15 of the upcoming registration cycle.
pub fn next_h1b_window(today: NaiveDate) -> NaiveDate {
    let year = if today.month() >= REGISTRATION_ROLLOVER_MONTH {
        today.year() + 1
    } else {
        today.year()
    };
    // Only unrepresentable at the very end of chrono's date range.
    NaiveDate::from_ymd_opt(year, 1, 15).unwrap_or(NaiveDate::MAX)
}

/// April 15 of the window's year.
pub fn h1b_results_date(window: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(window.year(), 4, 15).unwrap_or(NaiveDate::MAX)
}

/// End date minus the hiring lead time. Narrative context only.
pub fn effective_hiring_deadline(end_date: NaiveDate) -> NaiveDate {
    end_date - Duration::days(HIRING_LEAD_TIME_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn days_from_reference(days: i64) -> Option<NaiveDate> {
        Some(reference() + Duration::days(days))
    }

    #[test]
    fn test_f1_without_end_date_is_low_risk() {
        let timeline = calculate_visa_timeline(reference(), VisaStatus::F1, None);
        assert_eq!(timeline.risk_level, RiskLevel::Low);
        assert_eq!(timeline.days_remaining, None);
        assert!(!timeline.needs_immediate_action);
        assert!(timeline.recommended_action.is_empty());
    }

    #[test]
    fn test_opt_expiring_in_30_days_is_high_risk() {
        let timeline =
            calculate_visa_timeline(reference(), VisaStatus::F1Opt, days_from_reference(30));
        assert_eq!(timeline.days_remaining, Some(30));
        assert_eq!(timeline.risk_level, RiskLevel::High);
        assert!(timeline.needs_immediate_action);
        assert_eq!(timeline.recommended_action, OPT_EXPIRING_ACTION);
    }

    #[test]
    fn test_opt_threshold_is_exclusive() {
        let at_89 = calculate_visa_timeline(reference(), VisaStatus::F1Opt, days_from_reference(89));
        assert_eq!(at_89.risk_level, RiskLevel::High);

        let at_90 = calculate_visa_timeline(reference(), VisaStatus::F1Opt, days_from_reference(90));
        assert_eq!(at_90.risk_level, RiskLevel::Low);

        let at_91 = calculate_visa_timeline(reference(), VisaStatus::F1Opt, days_from_reference(91));
        assert_eq!(at_91.risk_level, RiskLevel::Low);
        assert!(!at_91.needs_immediate_action);
    }

    #[test]
    fn test_stem_opt_boundaries() {
        let at_179 =
            calculate_visa_timeline(reference(), VisaStatus::StemOpt, days_from_reference(179));
        assert_eq!(at_179.risk_level, RiskLevel::Medium);
        assert_eq!(at_179.recommended_action, STEM_OPT_ACTION);
        assert!(!at_179.needs_immediate_action);

        let at_180 =
            calculate_visa_timeline(reference(), VisaStatus::StemOpt, days_from_reference(180));
        assert_eq!(at_180.risk_level, RiskLevel::Low);
        assert!(at_180.recommended_action.is_empty());

        let at_181 =
            calculate_visa_timeline(reference(), VisaStatus::StemOpt, days_from_reference(181));
        assert_eq!(at_181.risk_level, RiskLevel::Low);
        assert!(at_181.recommended_action.is_empty());
    }

    #[test]
    fn test_h1b_boundaries() {
        let at_364 = calculate_visa_timeline(reference(), VisaStatus::H1b, days_from_reference(364));
        assert_eq!(at_364.risk_level, RiskLevel::Medium);
        assert_eq!(at_364.recommended_action, H1B_EXTENSION_ACTION);

        let at_365 = calculate_visa_timeline(reference(), VisaStatus::H1b, days_from_reference(365));
        assert_eq!(at_365.risk_level, RiskLevel::Low);
        assert!(at_365.recommended_action.is_empty());

        let at_366 = calculate_visa_timeline(reference(), VisaStatus::H1b, days_from_reference(366));
        assert_eq!(at_366.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_expired_status_keeps_negative_days() {
        let timeline =
            calculate_visa_timeline(reference(), VisaStatus::F1Opt, days_from_reference(-12));
        assert_eq!(timeline.days_remaining, Some(-12));
        assert_eq!(timeline.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_f1_with_end_date_has_no_threshold() {
        let timeline = calculate_visa_timeline(reference(), VisaStatus::F1, days_from_reference(5));
        assert_eq!(timeline.days_remaining, Some(5));
        assert_eq!(timeline.risk_level, RiskLevel::Low);
        assert!(!timeline.needs_immediate_action);
    }

    #[test]
    fn test_window_rolls_over_from_april() {
        let march = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(
            next_h1b_window(march),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );

        let april = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(
            next_h1b_window(april),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_window_and_results_month_day_are_fixed() {
        let mut day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        while day <= last {
            for status in VisaStatus::ALL {
                let timeline = calculate_visa_timeline(day, status, Some(day));
                assert_eq!((timeline.next_h1b_window.month(), timeline.next_h1b_window.day()), (1, 15));
                assert_eq!((timeline.results_date.month(), timeline.results_date.day()), (4, 15));
                assert_eq!(timeline.results_date.year(), timeline.next_h1b_window.year());
            }
            day += Duration::days(1);
        }
    }

    #[test]
    fn test_calculation_is_idempotent() {
        for status in VisaStatus::ALL {
            let first = calculate_visa_timeline(reference(), status, days_from_reference(100));
            let second = calculate_visa_timeline(reference(), status, days_from_reference(100));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_hiring_deadline_is_not_applied_to_days_remaining() {
        let end = reference() + Duration::days(100);
        let timeline = calculate_visa_timeline(reference(), VisaStatus::F1Opt, Some(end));
        assert_eq!(timeline.days_remaining, Some(100));
        assert_eq!(timeline.risk_level, RiskLevel::Low);
        assert_eq!(effective_hiring_deadline(end), reference() + Duration::days(70));
    }

    #[test]
    fn test_risk_level_parses_case_insensitively() {
        assert_eq!(" medium ".parse::<RiskLevel>().unwrap(), RiskLevel::Medium);
        assert_eq!("HIGH".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_timeline_serializes_dates_and_risk_as_strings() {
        let timeline =
            calculate_visa_timeline(reference(), VisaStatus::StemOpt, days_from_reference(10));
        let json = serde_json::to_value(&timeline).unwrap();
        assert_eq!(json["current_status"], "STEM-OPT");
        assert_eq!(json["next_h1b_window"], "2026-01-15");
        assert_eq!(json["results_date"], "2026-04-15");
        assert_eq!(json["risk_level"], "MEDIUM");
        assert_eq!(json["days_remaining"], 10);
    }
}
