//! Shared types for the API layer.

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts};
use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::models::StaffUser;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    /// One connection per request.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        Ok(self.core.open_db()?)
    }
}

// ═══════════════════════════════════════════════════════════
// Staff context: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated staff member, injected into request extensions
/// by the auth middleware after the bearer token resolves.
#[derive(Debug, Clone)]
pub struct StaffContext {
    pub user: StaffUser,
    /// Raw bearer token of this request, kept so logout can revoke it.
    pub token: String,
}

// ═══════════════════════════════════════════════════════════
// Extractors that report rejections in the API error envelope
// ═══════════════════════════════════════════════════════════

/// `Json<T>` whose parse failures become `VALIDATION_ERROR`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query<T>` whose parse failures become `VALIDATION_ERROR`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path<T>` whose parse failures become `VALIDATION_ERROR`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
