//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle credential generation, store operations, and validation.

pub mod key_service;
