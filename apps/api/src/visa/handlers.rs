//! Stateless visa timeline endpoint.

use axum::{extract::Query, Json};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::visa::models::VisaStatus;
use crate::visa::timeline::{calculate_visa_timeline, VisaTimeline};

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub status: String,
    pub end_date: Option<NaiveDate>,
    /// Overrides today's date; mainly for previews and tests.
    pub as_of: Option<NaiveDate>,
}

/// GET /api/v1/visa/timeline?status=F1-OPT&end_date=2025-08-01
pub async fn handle_visa_timeline(
    Query(query): Query<TimelineQuery>,
) -> Result<Json<VisaTimeline>, AppError> {
    let status = query
        .status
        .parse::<VisaStatus>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let today = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let end_date = if status.has_validity_window() {
        Some(query.end_date.ok_or_else(|| {
            AppError::Validation(format!("end_date is required for status {status}"))
        })?)
    } else {
        None
    };

    Ok(Json(calculate_visa_timeline(today, status, end_date)))
}
