//! Risk register HTTP handlers.
//!
//! This module implements the risk-related API endpoints:
//! - POST /api/v1/risks - Register a new risk
//! - GET /api/v1/risks - List risks
//! - GET /api/v1/risks/{id} - Get risk by ID
//! - PUT /api/v1/risks/{id} - Update a risk

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
    models::risk::{CreateRiskRequest, Risk, UpdateRiskRequest},
};

/// Validate a 5x5 matrix score.
fn validate_score(name: &str, value: i64) -> Result<(), AppError> {
    if !(1..=5).contains(&value) {
        return Err(AppError::InvalidRequest(format!(
            "{name} must be between 1 and 5"
        )));
    }
    Ok(())
}

/// Register a new risk.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Single supplier for flange gaskets",
///   "likelihood": 3,
///   "impact": 4,
///   "owner": "procurement"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Returns the stored risk with its computed
///   rating (likelihood x impact)
/// - **Error (400)**: Empty title or score outside 1-5
pub async fn create_risk(
    State(state): State<AppState>,
    Json(request): Json<CreateRiskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidRequest("Title must not be empty".to_string()));
    }
    validate_score("likelihood", request.likelihood)?;
    validate_score("impact", request.impact)?;

    let now = Utc::now();

    let risk = sqlx::query_as::<_, Risk>(
        r#"
        INSERT INTO risks (id, title, description, likelihood, impact, rating, mitigation, owner, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'open', $9, $10)
        RETURNING id, title, description, likelihood, impact, rating, mitigation, owner, status, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(&request.description)
    .bind(request.likelihood)
    .bind(request.impact)
    // Rating is stored so the reporting integration can sort on it directly
    .bind(request.likelihood * request.impact)
    .bind(&request.mitigation)
    .bind(&request.owner)
    .bind(now)
    .bind(now)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(risk)))
}

/// List all risks, highest rating first.
pub async fn list_risks(State(state): State<AppState>) -> Result<Json<Vec<Risk>>, AppError> {
    let risks = sqlx::query_as::<_, Risk>(
        r#"
        SELECT id, title, description, likelihood, impact, rating, mitigation, owner, status, created_at, updated_at
        FROM risks
        ORDER BY rating DESC, created_at DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(risks))
}

/// Get a specific risk by ID.
pub async fn get_risk(
    State(state): State<AppState>,
    Path(risk_id): Path<Uuid>,
) -> Result<Json<Risk>, AppError> {
    let risk = sqlx::query_as::<_, Risk>(
        r#"
        SELECT id, title, description, likelihood, impact, rating, mitigation, owner, status, created_at, updated_at
        FROM risks
        WHERE id = $1
        "#,
    )
    .bind(risk_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::RiskNotFound)?;

    Ok(Json(risk))
}

/// Update a risk.
///
/// The rating is recomputed from the effective likelihood and impact on every
/// update, so it can never drift from its factors.
pub async fn update_risk(
    State(state): State<AppState>,
    Path(risk_id): Path<Uuid>,
    Json(request): Json<UpdateRiskRequest>,
) -> Result<Json<Risk>, AppError> {
    let existing = sqlx::query_as::<_, Risk>(
        r#"
        SELECT id, title, description, likelihood, impact, rating, mitigation, owner, status, created_at, updated_at
        FROM risks
        WHERE id = $1
        "#,
    )
    .bind(risk_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::RiskNotFound)?;

    let title = match request.title {
        Some(title) if title.trim().is_empty() => {
            return Err(AppError::InvalidRequest("Title must not be empty".to_string()));
        }
        Some(title) => title.trim().to_string(),
        None => existing.title,
    };

    let likelihood = request.likelihood.unwrap_or(existing.likelihood);
    let impact = request.impact.unwrap_or(existing.impact);
    validate_score("likelihood", likelihood)?;
    validate_score("impact", impact)?;

    let risk = sqlx::query_as::<_, Risk>(
        r#"
        UPDATE risks
        SET title = $1, description = $2, likelihood = $3, impact = $4, rating = $5,
            mitigation = $6, owner = $7, status = $8, updated_at = $9
        WHERE id = $10
        RETURNING id, title, description, likelihood, impact, rating, mitigation, owner, status, created_at, updated_at
        "#,
    )
    .bind(&title)
    .bind(request.description.or(existing.description))
    .bind(likelihood)
    .bind(impact)
    .bind(likelihood * impact)
    .bind(request.mitigation.or(existing.mitigation))
    .bind(request.owner.or(existing.owner))
    .bind(request.status.unwrap_or(existing.status))
    .bind(Utc::now())
    .bind(risk_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(risk))
}
