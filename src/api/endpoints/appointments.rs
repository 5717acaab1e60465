//! Appointment endpoints.
//!
//! - `POST /api/appointments`: book
//! - `GET /api/appointments`: filter, sort, paginate
//! - `GET|PUT|DELETE /api/appointments/:id`
//! - `PATCH /api/appointments/:id/status`
//! - `PATCH /api/appointments/:id/doctor`

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiPath, ApiQuery};
use crate::appointment::{self, AppointmentQuery, AppointmentRequest};
use crate::intake::text_or_number;
use crate::models::{AppointmentView, Pagination};

#[derive(Serialize)]
pub struct AppointmentResponse {
    pub appointment: AppointmentView,
}

#[derive(Serialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<AppointmentView>,
    pub pagination: Pagination,
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorBody {
    #[serde(default, deserialize_with = "text_or_number")]
    pub doctor_id: Option<String>,
}

/// `POST /api/appointments`
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<AppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), ApiError> {
    let draft = body.validate()?;
    let conn = ctx.open_db()?;
    let created = appointment::create_appointment(&conn, &draft)?;
    let appointment = appointment::get_appointment_view(&conn, created.id)?;
    Ok((StatusCode::CREATED, Json(AppointmentResponse { appointment })))
}

/// `GET /api/appointments?date=&dateFrom=&dateTo=&doctorId=&patientId=&status=&type=&page=&limit=&sortBy=&sortOrder=`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<AppointmentQuery>,
) -> Result<Json<AppointmentListResponse>, ApiError> {
    let (filter, sort, page) = query.parse()?;
    let conn = ctx.open_db()?;
    let (appointments, pagination) = appointment::list_appointments(&conn, &filter, sort, page)?;
    Ok(Json(AppointmentListResponse {
        appointments,
        pagination,
    }))
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let appointment = appointment::get_appointment_view(&conn, id)?;
    Ok(Json(AppointmentResponse { appointment }))
}

/// `PUT /api/appointments/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<AppointmentRequest>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let draft = body.validate()?;
    let conn = ctx.open_db()?;
    appointment::update_appointment(&conn, id, &draft)?;
    let appointment = appointment::get_appointment_view(&conn, id)?;
    Ok(Json(AppointmentResponse { appointment }))
}

/// `PATCH /api/appointments/:id/status`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let conn = ctx.open_db()?;
    appointment::update_status(&conn, id, body.status.as_deref())?;
    let appointment = appointment::get_appointment_view(&conn, id)?;
    Ok(Json(AppointmentResponse { appointment }))
}

/// `PATCH /api/appointments/:id/doctor`
pub async fn reassign_doctor(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<DoctorBody>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let conn = ctx.open_db()?;
    appointment::reassign_doctor(&conn, id, body.doctor_id.as_deref())?;
    let appointment = appointment::get_appointment_view(&conn, id)?;
    Ok(Json(AppointmentResponse { appointment }))
}

/// `DELETE /api/appointments/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.open_db()?;
    appointment::delete_appointment(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
