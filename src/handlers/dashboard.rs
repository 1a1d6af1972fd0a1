//! Dashboard summary endpoint.
//!
//! A single read-only aggregate the reporting integration can poll instead of
//! re-deriving counts from the full entity lists.

use std::collections::HashMap;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::{app::AppState, error::AppError};

/// Aggregate counts across the register.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_occurrences: i64,
    /// Occurrences not yet closed, keyed by severity
    pub open_occurrences_by_severity: HashMap<String, i64>,
    pub total_risks: i64,
    pub risks_by_status: HashMap<String, i64>,
    pub total_compliance_records: i64,
    pub compliance_by_status: HashMap<String, i64>,
}

/// Dashboard summary handler.
///
/// # Endpoint
///
/// `GET /api/v1/dashboard`
///
/// Open to both access tiers; purely aggregate, no record contents.
pub async fn summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    let total_occurrences =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM occurrences")
            .fetch_one(&state.pool)
            .await?;

    let open_occurrences_by_severity = sqlx::query_as::<_, (String, i64)>(
        "SELECT severity, COUNT(*) FROM occurrences WHERE status != 'closed' GROUP BY severity",
    )
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .collect();

    let total_risks = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM risks")
        .fetch_one(&state.pool)
        .await?;

    let risks_by_status =
        sqlx::query_as::<_, (String, i64)>("SELECT status, COUNT(*) FROM risks GROUP BY status")
            .fetch_all(&state.pool)
            .await?
            .into_iter()
            .collect();

    let total_compliance_records =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM compliance_records")
            .fetch_one(&state.pool)
            .await?;

    let compliance_by_status = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM compliance_records GROUP BY status",
    )
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .collect();

    Ok(Json(DashboardSummary {
        total_occurrences,
        open_occurrences_by_severity,
        total_risks,
        risks_by_status,
        total_compliance_records,
        compliance_by_status,
    }))
}
