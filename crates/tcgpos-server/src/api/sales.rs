use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tcgpos_core::Sale;
use tcgpos_recurrence::format_label;

use crate::board::{SoldError, SweepReport};
use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

/// A sale as shown in the dashboard list, with its schedule described.
#[derive(Debug, Serialize)]
pub(super) struct SaleItem {
    #[serde(flatten)]
    pub sale: Sale,
    pub recurrence_label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SoldRequest {
    pub product_id: i64,
    pub item_count: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct SweepQuery {
    pub at: Option<DateTime<Utc>>,
}

fn sale_item(sale: Sale, state: &AppState) -> SaleItem {
    let recurrence_label = sale.is_repeating().then(|| {
        let end = sale.sale_end_datetime.map(|end| {
            end.with_timezone(&state.evaluator.zone())
                .format("%Y/%m/%d %H:%M")
                .to_string()
        });
        format_label(sale.repeat_rule(), end.as_deref()).to_string()
    });
    SaleItem {
        sale,
        recurrence_label,
    }
}

fn sale_not_found(req_id: &str, id: i64) -> ApiError {
    ApiError::new(req_id, "not_found", format!("sale {id} not found"))
}

pub(super) async fn list_sales(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<SaleItem>>> {
    let items = state
        .board
        .list()
        .await
        .into_iter()
        .map(|sale| sale_item(sale, &state))
        .collect();
    ApiResponse::new(items, req_id.0)
}

pub(super) async fn get_sale(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SaleItem>>, ApiError> {
    let sale = state
        .board
        .get(id)
        .await
        .ok_or_else(|| sale_not_found(&req_id.0, id))?;
    Ok(ApiResponse::new(sale_item(sale, &state), req_id.0))
}

pub(super) async fn record_sold(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<SoldRequest>,
) -> Result<Json<ApiResponse<SaleItem>>, ApiError> {
    if body.item_count <= 0 {
        return Err(ApiError::new(
            &req_id.0,
            "validation_error",
            format!("item_count must be positive, got {}", body.item_count),
        ));
    }

    let sale = state
        .board
        .record_sold(id, body.product_id, body.item_count)
        .await
        .map_err(|e| match e {
            SoldError::NotFound => sale_not_found(&req_id.0, id),
            SoldError::NotRunning => ApiError::new(
                &req_id.0,
                "conflict",
                format!("sale {id} is not running"),
            ),
            SoldError::CountOverflow(e) => {
                ApiError::new(&req_id.0, "validation_error", e.to_string())
            }
        })?;

    tracing::info!(
        sale_id = id,
        product_id = body.product_id,
        item_count = body.item_count,
        "sales: recorded sold items"
    );
    Ok(ApiResponse::new(sale_item(sale, &state), req_id.0))
}

pub(super) async fn sweep_statuses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SweepQuery>,
) -> Result<Json<ApiResponse<SweepReport>>, ApiError> {
    let now = query.at.unwrap_or_else(Utc::now);
    let report = state
        .board
        .sweep(now, &state.evaluator)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "sales: status sweep failed");
            ApiError::new(&req_id.0, "internal_error", "status sweep failed")
        })?;
    Ok(ApiResponse::new(report, req_id.0))
}
