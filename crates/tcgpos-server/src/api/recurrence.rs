//! Recurrence rule tools used by the sale registration form.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tcgpos_recurrence::{
    build_expression, format_label, option_label, validate, CampaignWindow, EvaluationQuery,
    ParseError, ParsedRecurrenceLabel, RecurrenceType,
};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

/// Longest occurrence length the check route scans; one scan step per 10 minutes.
pub(super) const MAX_CHECK_SPAN_DAYS: i64 = 366;

#[derive(Debug, Deserialize)]
pub(super) struct CheckRequest {
    pub expression: String,
    pub candidate: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckResponse {
    pub matches: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ValidateRequest {
    pub expression: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ValidateResponse {
    pub valid: bool,
    /// Canonical form of the accepted expression.
    pub expression: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LabelRequest {
    pub expression: String,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BuildRequest {
    pub recurrence_type: RecurrenceType,
    pub start: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct BuildResponse {
    pub expression: Option<String>,
    pub option_label: String,
}

fn parse_error(req_id: &str, error: &ParseError) -> ApiError {
    ApiError::new(req_id, "validation_error", error.to_string())
}

pub(super) async fn check_recurrence(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CheckRequest>,
) -> Result<Json<ApiResponse<CheckResponse>>, ApiError> {
    let window = CampaignWindow::new(body.start, body.end);
    if window
        .span()
        .is_some_and(|span| span > TimeDelta::days(MAX_CHECK_SPAN_DAYS))
    {
        return Err(ApiError::new(
            &req_id.0,
            "validation_error",
            format!("window may span at most {MAX_CHECK_SPAN_DAYS} days"),
        ));
    }

    let query = EvaluationQuery {
        expression: body.expression,
        candidate_instant: body.candidate,
        window,
    };
    let evaluator = state.evaluator.clone();
    let outcome = tokio::task::spawn_blocking(move || evaluator.check(&query))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "recurrence: window check failed");
            ApiError::new(&req_id.0, "internal_error", "window check failed")
        })?;
    let matches = outcome.map_err(|e| parse_error(&req_id.0, &e))?;
    Ok(ApiResponse::new(CheckResponse { matches }, req_id.0))
}

pub(super) async fn validate_recurrence(
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<ApiResponse<ValidateResponse>>, ApiError> {
    let expression = validate(&body.expression).map_err(|e| parse_error(&req_id.0, &e))?;
    Ok(ApiResponse::new(
        ValidateResponse {
            valid: true,
            expression: expression.to_string(),
        },
        req_id.0,
    ))
}

pub(super) async fn label_recurrence(
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LabelRequest>,
) -> Json<ApiResponse<ParsedRecurrenceLabel>> {
    let label = format_label(&body.expression, body.end.as_deref());
    ApiResponse::new(label, req_id.0)
}

pub(super) async fn build_recurrence(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BuildRequest>,
) -> Json<ApiResponse<BuildResponse>> {
    let zone = state.evaluator.zone();
    let data = BuildResponse {
        expression: build_expression(body.recurrence_type, body.start, zone)
            .map(|e| e.to_string()),
        option_label: option_label(body.recurrence_type, body.start, zone),
    };
    ApiResponse::new(data, req_id.0)
}
