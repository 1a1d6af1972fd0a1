//! Compliance record HTTP handlers.
//!
//! - POST /api/v1/compliance - Create a compliance record
//! - GET /api/v1/compliance - List compliance records
//! - GET /api/v1/compliance/{id} - Get record by ID
//! - PUT /api/v1/compliance/{id} - Update a record

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    models::compliance::{
        ComplianceRecord, ComplianceStatus, CreateComplianceRequest, UpdateComplianceRequest,
    },
};

/// Create a compliance record.
///
/// New records default to `in_progress` when no status is given.
pub async fn create_record(
    State(state): State<AppState>,
    Json(request): Json<CreateComplianceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let requirement = request.requirement.trim();
    if requirement.is_empty() {
        return Err(AppError::InvalidRequest(
            "Requirement must not be empty".to_string(),
        ));
    }

    let now = Utc::now();

    let record = sqlx::query_as::<_, ComplianceRecord>(
        r#"
        INSERT INTO compliance_records (id, requirement, framework, status, due_date, responsible, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, requirement, framework, status, due_date, responsible, notes, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(requirement)
    .bind(&request.framework)
    .bind(request.status.unwrap_or(ComplianceStatus::InProgress))
    .bind(request.due_date)
    .bind(&request.responsible)
    .bind(&request.notes)
    .bind(now)
    .bind(now)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// List all compliance records, soonest due date first.
pub async fn list_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<ComplianceRecord>>, AppError> {
    let records = sqlx::query_as::<_, ComplianceRecord>(
        r#"
        SELECT id, requirement, framework, status, due_date, responsible, notes, created_at, updated_at
        FROM compliance_records
        ORDER BY due_date IS NULL, due_date ASC, created_at DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(records))
}

/// Get a specific compliance record by ID.
pub async fn get_record(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
) -> Result<Json<ComplianceRecord>, AppError> {
    let record = sqlx::query_as::<_, ComplianceRecord>(
        r#"
        SELECT id, requirement, framework, status, due_date, responsible, notes, created_at, updated_at
        FROM compliance_records
        WHERE id = $1
        "#,
    )
    .bind(record_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::ComplianceRecordNotFound)?;

    Ok(Json(record))
}

/// Update a compliance record.
pub async fn update_record(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    Json(request): Json<UpdateComplianceRequest>,
) -> Result<Json<ComplianceRecord>, AppError> {
    let existing = sqlx::query_as::<_, ComplianceRecord>(
        r#"
        SELECT id, requirement, framework, status, due_date, responsible, notes, created_at, updated_at
        FROM compliance_records
        WHERE id = $1
        "#,
    )
    .bind(record_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::ComplianceRecordNotFound)?;

    let requirement = match request.requirement {
        Some(requirement) if requirement.trim().is_empty() => {
            return Err(AppError::InvalidRequest(
                "Requirement must not be empty".to_string(),
            ));
        }
        Some(requirement) => requirement.trim().to_string(),
        None => existing.requirement,
    };

    let record = sqlx::query_as::<_, ComplianceRecord>(
        r#"
        UPDATE compliance_records
        SET requirement = $1, framework = $2, status = $3, due_date = $4,
            responsible = $5, notes = $6, updated_at = $7
        WHERE id = $8
        RETURNING id, requirement, framework, status, due_date, responsible, notes, created_at, updated_at
        "#,
    )
    .bind(&requirement)
    .bind(request.framework.or(existing.framework))
    .bind(request.status.unwrap_or(existing.status))
    .bind(request.due_date.or(existing.due_date))
    .bind(request.responsible.or(existing.responsible))
    .bind(request.notes.or(existing.notes))
    .bind(Utc::now())
    .bind(record_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(record))
}
