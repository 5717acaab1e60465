//! Patient registry endpoints.
//!
//! - `POST /api/patients`: register
//! - `GET /api/patients`: search + paginate
//! - `GET /api/patients/:id`: fetch
//! - `PUT /api/patients/:id`: full edit
//! - `PATCH /api/patients/:id/medical-history`: history only

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiPath, ApiQuery};
use crate::intake::PatientPayload;
use crate::models::{PageRequest, Pagination, Patient};
use crate::patient;

#[derive(Serialize)]
pub struct PatientResponse {
    pub patient: Patient,
}

#[derive(Serialize)]
pub struct PatientListResponse {
    pub patients: Vec<Patient>,
    pub pagination: Pagination,
}

/// Values stay as text so `page=` reads as "use the default", like the
/// appointment listing.
#[derive(Deserialize)]
pub struct PatientListQuery {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistoryBody {
    pub medical_history: Option<String>,
}

/// `POST /api/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(payload): ApiJson<PatientPayload>,
) -> Result<(StatusCode, Json<PatientResponse>), ApiError> {
    let record = payload.normalize()?;
    let conn = ctx.open_db()?;
    let patient = patient::create_patient(&conn, &record)?;
    Ok((StatusCode::CREATED, Json(PatientResponse { patient })))
}

/// `GET /api/patients?search=&page=&limit=`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<PatientListQuery>,
) -> Result<Json<PatientListResponse>, ApiError> {
    let page = PageRequest::from_query(query.page.as_deref(), query.limit.as_deref())?;
    let conn = ctx.open_db()?;
    let (patients, pagination) = patient::search_patients(&conn, query.search.as_deref(), page)?;
    Ok(Json(PatientListResponse {
        patients,
        pagination,
    }))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PatientResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let patient = patient::get_patient(&conn, id)?;
    Ok(Json(PatientResponse { patient }))
}

/// `PUT /api/patients/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<PatientPayload>,
) -> Result<Json<PatientResponse>, ApiError> {
    let record = payload.normalize()?;
    let conn = ctx.open_db()?;
    let patient = patient::update_patient(&conn, id, &record)?;
    Ok(Json(PatientResponse { patient }))
}

/// `PATCH /api/patients/:id/medical-history`
pub async fn update_medical_history(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<MedicalHistoryBody>,
) -> Result<Json<PatientResponse>, ApiError> {
    let history = body
        .medical_history
        .ok_or_else(|| ApiError::Validation("Missing required field(s): medicalHistory".into()))?;
    let conn = ctx.open_db()?;
    let patient = patient::update_medical_history(&conn, id, &history)?;
    Ok(Json(PatientResponse { patient }))
}
