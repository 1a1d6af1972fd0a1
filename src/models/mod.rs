//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// API key authentication model
pub mod api_key;
/// Compliance record model
pub mod compliance;
/// Occurrence (incident report) model
pub mod occurrence;
/// Risk register entry model
pub mod risk;
