//! Axum route handlers for the assessment wizard.
//!
//! Each handler takes a session snapshot, does the slow work (extraction,
//! model call) without holding the store lock, then commits through
//! `SessionStore::update_from` so a failed or raced step changes nothing.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::eligibility::assess_eligibility;
use crate::analysis::matching::analyze_match;
use crate::analysis::report::{render_eligibility, summarize_match, EligibilityView, MatchSummary};
use crate::errors::AppError;
use crate::extraction::{FileKind, TextExtractor};
use crate::state::AppState;
use crate::visa::models::{CriminalHistory, ValidityWindow, VisaDetails, VisaStatus};
use crate::wizard::flow::{WizardEvent, WizardStep};
use crate::wizard::session::WizardSession;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub step: WizardStep,
    pub available_events: Vec<WizardEvent>,
    pub has_resume: bool,
    pub has_job_description: bool,
    pub match_summary: Option<MatchSummary>,
    pub visa_details: Option<VisaDetails>,
    pub eligibility: Option<EligibilityView>,
}

impl SessionView {
    pub fn new(session: &WizardSession, min_match: f64) -> Self {
        Self {
            session_id: session.id,
            step: session.step,
            available_events: session.step.available_events(),
            has_resume: session.resume_text.is_some(),
            has_job_description: session.jd_text.is_some(),
            match_summary: session
                .match_analysis
                .as_ref()
                .map(|m| summarize_match(m, min_match)),
            visa_details: session.visa_details.clone(),
            eligibility: session.eligibility.as_ref().map(render_eligibility),
        }
    }
}

fn view(state: &AppState, session: &WizardSession) -> Json<SessionView> {
    Json(SessionView::new(session, state.config.min_match_to_proceed))
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let session = state.sessions.create().await;
    (StatusCode::CREATED, view(&state, &session))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id).await?;
    Ok(view(&state, &session))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Step 1: documents and match
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/documents
///
/// Multipart fields `resume` and/or `job_description`, each a pdf, docx or txt file.
pub async fn handle_upload_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let snapshot = state.sessions.get(id).await?;
    if !snapshot.step.accepts_documents() {
        return Err(AppError::UnprocessableEntity(format!(
            "Documents cannot be changed in step {}; go back to the inputs first",
            snapshot.step
        )));
    }

    let mut resume_text = None;
    let mut jd_text = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;

        match name.as_str() {
            "resume" => {
                resume_text = Some(extract_upload(&state.extractor, &file_name, bytes).await?);
            }
            "job_description" => {
                jd_text = Some(extract_upload(&state.extractor, &file_name, bytes).await?);
            }
            other => {
                return Err(AppError::Validation(format!(
                    "Unexpected upload field '{other}' (expected resume or job_description)"
                )));
            }
        }
    }

    let session = state
        .sessions
        .update_from(&snapshot, |s| {
            s.set_documents(resume_text, jd_text)?;
            Ok(s.clone())
        })
        .await?;

    Ok(view(&state, &session))
}

/// POST /api/v1/sessions/:id/match
pub async fn handle_analyze_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let snapshot = state.sessions.get(id).await?;
    let (resume_text, jd_text) = snapshot.match_inputs()?;

    let analysis = analyze_match(state.llm.as_ref(), resume_text, jd_text).await?;

    let session = state
        .sessions
        .update_from(&snapshot, |s| {
            s.record_match(analysis)?;
            Ok(s.clone())
        })
        .await?;

    Ok(view(&state, &session))
}

/// POST /api/v1/sessions/:id/proceed
pub async fn handle_proceed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let min_match = state.config.min_match_to_proceed;
    let session = state
        .sessions
        .update(id, |s| {
            s.proceed(min_match)?;
            Ok(s.clone())
        })
        .await?;
    Ok(view(&state, &session))
}

// ────────────────────────────────────────────────────────────────────────────
// Step 2: visa details and eligibility
// ────────────────────────────────────────────────────────────────────────────

/// Raw text fields of the eligibility form, before validation.
#[derive(Debug, Default)]
pub struct VisaForm {
    pub visa_status: Option<String>,
    pub is_stem_degree: Option<String>,
    pub visa_start_date: Option<String>,
    pub visa_end_date: Option<String>,
    pub has_criminal_history: Option<String>,
    pub criminal_details: Option<String>,
}

impl VisaForm {
    fn set(&mut self, name: &str, value: String) -> Result<(), AppError> {
        let slot = match name {
            "visa_status" => &mut self.visa_status,
            "is_stem_degree" => &mut self.is_stem_degree,
            "visa_start_date" => &mut self.visa_start_date,
            "visa_end_date" => &mut self.visa_end_date,
            "has_criminal_history" => &mut self.has_criminal_history,
            "criminal_details" => &mut self.criminal_details,
            other => {
                return Err(AppError::Validation(format!(
                    "Unexpected form field '{other}'"
                )))
            }
        };
        let value = value.trim();
        *slot = (!value.is_empty()).then(|| value.to_string());
        Ok(())
    }

    /// Validates the form. Dates are ignored for plain F1, required otherwise.
    pub fn into_details(self) -> Result<VisaDetails, AppError> {
        let status = self
            .visa_status
            .as_deref()
            .ok_or_else(|| AppError::Validation("visa_status is required".to_string()))?
            .parse::<VisaStatus>()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let window = if status.has_validity_window() {
            let start = parse_date("visa_start_date", self.visa_start_date.as_deref())?;
            let end = parse_date("visa_end_date", self.visa_end_date.as_deref())?;
            Some(ValidityWindow::new(start, end).ok_or_else(|| {
                AppError::Validation(
                    "visa_start_date must not be after visa_end_date".to_string(),
                )
            })?)
        } else {
            None
        };

        let is_stem_degree = parse_flag("is_stem_degree", self.is_stem_degree.as_deref())?;
        let has_history = match self.has_criminal_history.as_deref() {
            Some(raw) => parse_flag("has_criminal_history", Some(raw))?,
            None => false,
        };
        let criminal_history = CriminalHistory {
            has_history,
            details: if has_history {
                self.criminal_details
            } else {
                None
            },
        };

        Ok(VisaDetails {
            status,
            window,
            is_stem_degree,
            criminal_history,
        })
    }
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<NaiveDate, AppError> {
    let raw =
        raw.ok_or_else(|| AppError::Validation(format!("{field} is required for this status")))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{field} must be a YYYY-MM-DD date, got '{raw}'")))
}

fn parse_flag(field: &str, raw: Option<&str>) -> Result<bool, AppError> {
    let raw = raw.ok_or_else(|| AppError::Validation(format!("{field} is required")))?;
    match raw.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Ok(true),
        "no" | "false" | "0" | "off" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "{field} must be yes or no, got '{raw}'"
        ))),
    }
}

/// POST /api/v1/sessions/:id/eligibility
///
/// Multipart: `transcript` file plus the `VisaForm` text fields.
pub async fn handle_assess_eligibility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let snapshot = state.sessions.get(id).await?;
    let match_analysis = snapshot.eligibility_inputs()?;

    let mut form = VisaForm::default();
    let mut transcript = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "transcript" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            transcript = Some((file_name, bytes));
        } else {
            let value = field.text().await?;
            form.set(&name, value)?;
        }
    }

    let visa = form.into_details()?;
    let (file_name, bytes) = transcript
        .ok_or_else(|| AppError::Validation("A transcript upload is required".to_string()))?;
    let transcript_text = extract_upload(&state.extractor, &file_name, bytes).await?;

    let today = Utc::now().date_naive();
    let outcome = assess_eligibility(
        state.llm.as_ref(),
        today,
        &transcript_text,
        match_analysis,
        &visa,
    )
    .await?;

    let session = state
        .sessions
        .update_from(&snapshot, |s| {
            s.record_eligibility(visa, outcome)?;
            Ok(s.clone())
        })
        .await?;

    Ok(view(&state, &session))
}

/// POST /api/v1/sessions/:id/revise
pub async fn handle_revise_visa_info(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .update(id, |s| {
            s.revise_visa_info()?;
            Ok(s.clone())
        })
        .await?;
    Ok(view(&state, &session))
}

/// POST /api/v1/sessions/:id/back
pub async fn handle_back_to_inputs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .update(id, |s| {
            s.back_to_inputs()?;
            Ok(s.clone())
        })
        .await?;
    Ok(view(&state, &session))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Extracts text off the async runtime; PDF parsing is CPU-bound.
async fn extract_upload(
    extractor: &Arc<dyn TextExtractor>,
    file_name: &str,
    bytes: Bytes,
) -> Result<String, AppError> {
    let kind = FileKind::from_file_name(file_name)?;
    let extractor = Arc::clone(extractor);

    let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes, kind))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    info!("Extracted {} chars from '{}' ({})", text.len(), file_name, kind);
    Ok(text)
}
