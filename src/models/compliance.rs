//! Compliance record model.
//!
//! Tracks the state of individual requirements against external frameworks
//! (ISO standards, internal policies, regulatory obligations).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Compliance state of a tracked requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    InProgress,
}

/// Represents a compliance record from the database.
///
/// Maps to the `compliance_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComplianceRecord {
    pub id: Uuid,
    /// The requirement being tracked
    pub requirement: String,
    /// Framework or standard the requirement belongs to
    pub framework: Option<String>,
    pub status: ComplianceStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a compliance record.
#[derive(Debug, Deserialize)]
pub struct CreateComplianceRequest {
    pub requirement: String,
    pub framework: Option<String>,
    pub status: Option<ComplianceStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
}

/// Request to update a compliance record.
#[derive(Debug, Deserialize)]
pub struct UpdateComplianceRequest {
    pub requirement: Option<String>,
    pub framework: Option<String>,
    pub status: Option<ComplianceStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
}
