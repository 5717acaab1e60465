//! API endpoint handlers.
//!
//! Each module corresponds to a front desk screen or feature.
//! Handlers stay thin: parse, open a connection, call the domain module.

pub mod appointments;
pub mod auth;
pub mod directory;
pub mod health;
pub mod patients;
pub mod templates;
