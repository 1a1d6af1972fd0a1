//! Occurrence (incident report) model.
//!
//! Occurrences are the incident reports at the heart of the register: what
//! happened, where, how severe, and what state the investigation is in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How severe an occurrence is, set when it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Workflow state of an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceStatus {
    Open,
    Investigating,
    Closed,
}

/// Represents an occurrence record from the database.
///
/// Maps to the `occurrences` table. The record type is explicit; an
/// occurrence is never inferred from which fields happen to be present.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Occurrence {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub status: OccurrenceStatus,
    /// Free-form location label (site, building, area)
    pub location: Option<String>,
    pub reported_by: String,
    pub reported_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to report a new occurrence.
///
/// # Example
///
/// ```json
/// {
///   "title": "Forklift near-miss in loading bay",
///   "severity": "high",
///   "location": "Plant 2 / Bay 4",
///   "reported_by": "j.smith"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateOccurrenceRequest {
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub location: Option<String>,
    pub reported_by: Option<String>,
}

/// Request to update an existing occurrence.
///
/// Only the provided fields change; identity and reporting fields are fixed.
#[derive(Debug, Deserialize)]
pub struct UpdateOccurrenceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<OccurrenceStatus>,
    pub location: Option<String>,
}
