//! Specialty and doctor directory endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiQuery};
use crate::directory::{self, NewDoctor, NewSpecialty};
use crate::models::{Doctor, Specialty};

#[derive(Serialize)]
pub struct SpecialtiesResponse {
    pub specialties: Vec<Specialty>,
}

#[derive(Serialize)]
pub struct SpecialtyResponse {
    pub specialty: Specialty,
}

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<Doctor>,
}

#[derive(Serialize)]
pub struct DoctorResponse {
    pub doctor: Doctor,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorListQuery {
    pub specialty_id: Option<i64>,
    pub include_inactive: Option<bool>,
}

/// `GET /api/specialties`
pub async fn list_specialties(
    State(ctx): State<ApiContext>,
) -> Result<Json<SpecialtiesResponse>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(SpecialtiesResponse {
        specialties: directory::list_specialties(&conn)?,
    }))
}

/// `POST /api/specialties`
pub async fn create_specialty(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<NewSpecialty>,
) -> Result<(StatusCode, Json<SpecialtyResponse>), ApiError> {
    let conn = ctx.open_db()?;
    let specialty = directory::create_specialty(&conn, &body)?;
    Ok((StatusCode::CREATED, Json(SpecialtyResponse { specialty })))
}

/// `GET /api/doctors?specialtyId=&includeInactive=`
pub async fn list_doctors(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<DoctorListQuery>,
) -> Result<Json<DoctorsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let doctors = directory::list_doctors(
        &conn,
        query.specialty_id,
        query.include_inactive.unwrap_or(false),
    )?;
    Ok(Json(DoctorsResponse { doctors }))
}

/// `POST /api/doctors`
pub async fn create_doctor(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<NewDoctor>,
) -> Result<(StatusCode, Json<DoctorResponse>), ApiError> {
    let conn = ctx.open_db()?;
    let doctor = directory::create_doctor(&conn, &body)?;
    Ok((StatusCode::CREATED, Json(DoctorResponse { doctor })))
}
