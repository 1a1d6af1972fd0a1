//! Risk register entry model.
//!
//! Risks are scored on a 5x5 matrix: likelihood and impact each range 1-5,
//! and the stored rating is their product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Workflow state of a risk register entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    Open,
    Mitigated,
    Accepted,
    Closed,
}

/// Represents a risk register entry from the database.
///
/// Maps to the `risks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Risk {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// 1 (rare) to 5 (almost certain)
    pub likelihood: i64,
    /// 1 (negligible) to 5 (severe)
    pub impact: i64,
    /// likelihood * impact, recomputed on every write
    pub rating: i64,
    pub mitigation: Option<String>,
    pub owner: Option<String>,
    pub status: RiskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to register a new risk.
///
/// # Example
///
/// ```json
/// {
///   "title": "Single supplier for flange gaskets",
///   "likelihood": 3,
///   "impact": 4,
///   "owner": "procurement"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateRiskRequest {
    pub title: String,
    pub description: Option<String>,
    pub likelihood: i64,
    pub impact: i64,
    pub mitigation: Option<String>,
    pub owner: Option<String>,
}

/// Request to update an existing risk.
#[derive(Debug, Deserialize)]
pub struct UpdateRiskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub likelihood: Option<i64>,
    pub impact: Option<i64>,
    pub mitigation: Option<String>,
    pub owner: Option<String>,
    pub status: Option<RiskStatus>,
}
