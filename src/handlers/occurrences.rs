//! Occurrence (incident report) HTTP handlers.
//!
//! This module implements the occurrence-related API endpoints:
//! - POST /api/v1/occurrences - Report a new occurrence
//! - GET /api/v1/occurrences - List occurrences
//! - GET /api/v1/occurrences/{id} - Get occurrence by ID
//! - PUT /api/v1/occurrences/{id} - Update an occurrence

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::occurrence::{CreateOccurrenceRequest, Occurrence, UpdateOccurrenceRequest},
};

/// Report a new occurrence.
///
/// # Endpoint
///
/// `POST /api/v1/occurrences`
///
/// # Authentication
///
/// Requires a full-access key (the gate rejects limited keys before this
/// handler runs).
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Forklift near-miss in loading bay",
///   "severity": "high",
///   "location": "Plant 2 / Bay 4"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Returns the stored occurrence
/// - **Error (400)**: Empty title
///
/// `reported_by` defaults to the authenticated key's label when the body
/// doesn't name a reporter.
pub async fn create_occurrence(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Json(request): Json<CreateOccurrenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidRequest("Title must not be empty".to_string()));
    }

    let reported_by = request
        .reported_by
        .clone()
        .or_else(|| auth.as_ref().map(|Extension(a)| a.name.clone()))
        .unwrap_or_else(|| "unknown".to_string());

    let now = Utc::now();

    let occurrence = sqlx::query_as::<_, Occurrence>(
        r#"
        INSERT INTO occurrences (id, title, description, severity, status, location, reported_by, reported_date, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 'open', $5, $6, $7, $8, $9)
        RETURNING id, title, description, severity, status, location, reported_by, reported_date, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(&request.description)
    .bind(request.severity)
    .bind(&request.location)
    .bind(&reported_by)
    .bind(now)
    .bind(now)
    .bind(now)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(occurrence)))
}

/// List all occurrences, newest report first.
///
/// Open to both access tiers; this is the main feed the reporting
/// integration pulls.
pub async fn list_occurrences(
    State(state): State<AppState>,
) -> Result<Json<Vec<Occurrence>>, AppError> {
    let occurrences = sqlx::query_as::<_, Occurrence>(
        r#"
        SELECT id, title, description, severity, status, location, reported_by, reported_date, created_at, updated_at
        FROM occurrences
        ORDER BY reported_date DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(occurrences))
}

/// Get a specific occurrence by ID.
///
/// # Response
///
/// - **Success (200 OK)**: Returns occurrence details
/// - **Error (404)**: Occurrence not found
pub async fn get_occurrence(
    State(state): State<AppState>,
    Path(occurrence_id): Path<Uuid>,
) -> Result<Json<Occurrence>, AppError> {
    let occurrence = sqlx::query_as::<_, Occurrence>(
        r#"
        SELECT id, title, description, severity, status, location, reported_by, reported_date, created_at, updated_at
        FROM occurrences
        WHERE id = $1
        "#,
    )
    .bind(occurrence_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::OccurrenceNotFound)?;

    Ok(Json(occurrence))
}

/// Update an occurrence.
///
/// Only the fields present in the body change; `reported_by` and
/// `reported_date` are fixed at creation.
///
/// # Response
///
/// - **Success (200 OK)**: Returns the updated occurrence
/// - **Error (400)**: Empty title
/// - **Error (404)**: Occurrence not found
pub async fn update_occurrence(
    State(state): State<AppState>,
    Path(occurrence_id): Path<Uuid>,
    Json(request): Json<UpdateOccurrenceRequest>,
) -> Result<Json<Occurrence>, AppError> {
    // Fetch current state, then merge the provided fields over it
    let existing = sqlx::query_as::<_, Occurrence>(
        r#"
        SELECT id, title, description, severity, status, location, reported_by, reported_date, created_at, updated_at
        FROM occurrences
        WHERE id = $1
        "#,
    )
    .bind(occurrence_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::OccurrenceNotFound)?;

    let title = match request.title {
        Some(title) if title.trim().is_empty() => {
            return Err(AppError::InvalidRequest("Title must not be empty".to_string()));
        }
        Some(title) => title.trim().to_string(),
        None => existing.title,
    };

    let occurrence = sqlx::query_as::<_, Occurrence>(
        r#"
        UPDATE occurrences
        SET title = $1, description = $2, severity = $3, status = $4, location = $5, updated_at = $6
        WHERE id = $7
        RETURNING id, title, description, severity, status, location, reported_by, reported_date, created_at, updated_at
        "#,
    )
    .bind(&title)
    .bind(request.description.or(existing.description))
    .bind(request.severity.unwrap_or(existing.severity))
    .bind(request.status.unwrap_or(existing.status))
    .bind(request.location.or(existing.location))
    .bind(Utc::now())
    .bind(occurrence_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(occurrence))
}
