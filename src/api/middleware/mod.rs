//! API middleware stack.
//!
//! Execution order on protected routes (outermost → innermost):
//! 1. Auth validator: resolves the bearer token into `StaffContext`
//! 2. Audit logger: logs after auth, so it knows the staff user

pub mod audit;
pub mod auth;
