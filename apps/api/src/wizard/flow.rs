//! Wizard state machine.
//!
//! ```text
//! CollectInputs ──MatchAnalyzed──▶ ShowMatch ──Proceed──▶ CollectVisaInfo
//!                                   ▲    │                   │    ▲
//!                       MatchAnalyzed└────┘   EligibilityAssessed  ReviseVisaInfo
//!                                                             ▼    │
//!                                                       ShowEligibility
//! any ──BackToInputs──▶ CollectInputs
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    CollectInputs,
    ShowMatch,
    CollectVisaInfo,
    ShowEligibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardEvent {
    MatchAnalyzed,
    Proceed,
    EligibilityAssessed,
    ReviseVisaInfo,
    BackToInputs,
}

impl WizardEvent {
    pub const ALL: [WizardEvent; 5] = [
        WizardEvent::MatchAnalyzed,
        WizardEvent::Proceed,
        WizardEvent::EligibilityAssessed,
        WizardEvent::ReviseVisaInfo,
        WizardEvent::BackToInputs,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {event} while in step {from}")]
pub struct TransitionError {
    pub from: WizardStep,
    pub event: WizardEvent,
}

impl WizardStep {
    /// Returns the step reached by applying `event`, or an error when the
    /// event is not valid from this step. Guards (match threshold, required
    /// uploads) are enforced by the session, not here.
    pub fn next(self, event: WizardEvent) -> Result<WizardStep, TransitionError> {
        use WizardEvent as E;
        use WizardStep as S;

        match (self, event) {
            (S::CollectInputs | S::ShowMatch, E::MatchAnalyzed) => Ok(S::ShowMatch),
            (S::ShowMatch, E::Proceed) => Ok(S::CollectVisaInfo),
            (S::CollectVisaInfo | S::ShowEligibility, E::EligibilityAssessed) => {
                Ok(S::ShowEligibility)
            }
            (S::ShowEligibility, E::ReviseVisaInfo) => Ok(S::CollectVisaInfo),
            (_, E::BackToInputs) => Ok(S::CollectInputs),
            (from, event) => Err(TransitionError { from, event }),
        }
    }

    pub fn accepts(self, event: WizardEvent) -> bool {
        self.next(event).is_ok()
    }

    /// Events the client may trigger from this step.
    pub fn available_events(self) -> Vec<WizardEvent> {
        WizardEvent::ALL
            .into_iter()
            .filter(|e| self.accepts(*e))
            .collect()
    }

    /// Uploading documents is only meaningful before the visa step.
    pub fn accepts_documents(self) -> bool {
        matches!(self, WizardStep::CollectInputs | WizardStep::ShowMatch)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WizardStep::CollectInputs => "collect_inputs",
            WizardStep::ShowMatch => "show_match",
            WizardStep::CollectVisaInfo => "collect_visa_info",
            WizardStep::ShowEligibility => "show_eligibility",
        })
    }
}

impl fmt::Display for WizardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WizardEvent::MatchAnalyzed => "match_analyzed",
            WizardEvent::Proceed => "proceed",
            WizardEvent::EligibilityAssessed => "eligibility_assessed",
            WizardEvent::ReviseVisaInfo => "revise_visa_info",
            WizardEvent::BackToInputs => "back_to_inputs",
        })
    }
}
