//! Per-user wizard context. Replaces ambient framework session state: every
//! step reads and writes this object explicitly, and a step that fails leaves
//! it untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::eligibility::EligibilityOutcome;
use crate::analysis::matching::MatchAnalysis;
use crate::errors::AppError;
use crate::visa::models::VisaDetails;
use crate::wizard::flow::{TransitionError, WizardEvent, WizardStep};

#[derive(Debug, Clone, Serialize)]
pub struct WizardSession {
    pub id: Uuid,
    pub step: WizardStep,
    pub resume_text: Option<String>,
    pub jd_text: Option<String>,
    pub match_analysis: Option<MatchAnalysis>,
    pub visa_details: Option<VisaDetails>,
    pub eligibility: Option<EligibilityOutcome>,
    /// Bumped on every change; lets the store detect writes that raced a model call.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            step: WizardStep::CollectInputs,
            resume_text: None,
            jd_text: None,
            match_analysis: None,
            visa_details: None,
            eligibility: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    fn apply(&mut self, event: WizardEvent) -> Result<(), TransitionError> {
        self.step = self.step.next(event)?;
        self.touch();
        Ok(())
    }

    /// Stores freshly extracted document text. Replacing a document after a
    /// match was shown invalidates that match and returns to input collection.
    pub fn set_documents(
        &mut self,
        resume_text: Option<String>,
        jd_text: Option<String>,
    ) -> Result<(), AppError> {
        if !self.step.accepts_documents() {
            return Err(AppError::UnprocessableEntity(format!(
                "Documents cannot be changed in step {}; go back to the inputs first",
                self.step
            )));
        }
        if resume_text.is_none() && jd_text.is_none() {
            return Err(AppError::Validation(
                "Upload a resume, a job description, or both".to_string(),
            ));
        }

        if self.step == WizardStep::ShowMatch {
            self.apply(WizardEvent::BackToInputs)?;
            self.match_analysis = None;
        }
        if resume_text.is_some() {
            self.resume_text = resume_text;
        }
        if jd_text.is_some() {
            self.jd_text = jd_text;
        }
        self.touch();
        Ok(())
    }

    /// Both documents, checked before spending a model call.
    pub fn match_inputs(&self) -> Result<(&str, &str), AppError> {
        self.step.next(WizardEvent::MatchAnalyzed)?;
        match (self.resume_text.as_deref(), self.jd_text.as_deref()) {
            (Some(resume), Some(jd)) => Ok((resume, jd)),
            (None, _) => Err(AppError::Validation("Upload a resume first".to_string())),
            (_, None) => Err(AppError::Validation(
                "Upload a job description first".to_string(),
            )),
        }
    }

    pub fn record_match(&mut self, analysis: MatchAnalysis) -> Result<(), AppError> {
        self.apply(WizardEvent::MatchAnalyzed)?;
        self.match_analysis = Some(analysis);
        self.eligibility = None;
        Ok(())
    }

    /// Moves on to the visa step when the match clears `min_match`.
    pub fn proceed(&mut self, min_match: f64) -> Result<(), AppError> {
        self.step.next(WizardEvent::Proceed)?;
        let analysis = self.match_analysis.as_ref().ok_or_else(|| {
            AppError::UnprocessableEntity("No match analysis to proceed from".to_string())
        })?;
        if !analysis.meets_threshold(min_match) {
            return Err(AppError::UnprocessableEntity(format!(
                "Resume-job match of {:.0}% is below the {min_match:.0}% needed to continue",
                analysis.clamped_percentage()
            )));
        }
        self.apply(WizardEvent::Proceed)?;
        Ok(())
    }

    /// The match analysis the eligibility step builds on.
    pub fn eligibility_inputs(&self) -> Result<&MatchAnalysis, AppError> {
        self.step.next(WizardEvent::EligibilityAssessed)?;
        self.match_analysis.as_ref().ok_or_else(|| {
            AppError::UnprocessableEntity("Run the match analysis first".to_string())
        })
    }

    pub fn record_eligibility(
        &mut self,
        visa: VisaDetails,
        outcome: EligibilityOutcome,
    ) -> Result<(), AppError> {
        self.apply(WizardEvent::EligibilityAssessed)?;
        self.visa_details = Some(visa);
        self.eligibility = Some(outcome);
        Ok(())
    }

    pub fn revise_visa_info(&mut self) -> Result<(), AppError> {
        self.apply(WizardEvent::ReviseVisaInfo)?;
        Ok(())
    }

    /// Returns to the first step, keeping the uploaded documents.
    pub fn back_to_inputs(&mut self) -> Result<(), AppError> {
        self.apply(WizardEvent::BackToInputs)?;
        self.match_analysis = None;
        self.visa_details = None;
        self.eligibility = None;
        Ok(())
    }
}
