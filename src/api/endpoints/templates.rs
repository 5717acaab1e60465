//! Template endpoints: per-specialty evolutions, prescriptions and custom
//! forms, plus the office-wide consent collection.
//!
//! Specialty scoped routes take `:type` ∈ `evolutions`, `prescriptions`,
//! `custom-forms`. Consents live under `/api/consents`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiPath, ApiQuery};
use crate::models::{Template, TemplateKind};
use crate::templates::{self, TemplateInput, TemplateScope};

#[derive(Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<Template>,
}

/// `template` is null when the scope has no default.
#[derive(Serialize)]
pub struct TemplateResponse {
    pub template: Option<Template>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateListQuery {
    pub default_only: Option<bool>,
}

fn specialty_scope(specialty_id: i64, segment: &str) -> Result<TemplateScope, ApiError> {
    let kind = TemplateKind::from_path_segment(segment)?;
    Ok(TemplateScope::specialty(specialty_id, kind)?)
}

fn list_in_scope(
    ctx: &ApiContext,
    scope: &TemplateScope,
    default_only: bool,
) -> Result<Json<TemplatesResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let templates = if default_only {
        templates::get_default_template(&conn, scope)?
            .into_iter()
            .collect()
    } else {
        templates::list_templates(&conn, scope)?
    };
    Ok(Json(TemplatesResponse { templates }))
}

fn default_in_scope(ctx: &ApiContext, scope: &TemplateScope) -> Result<Json<TemplateResponse>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(TemplateResponse {
        template: templates::get_default_template(&conn, scope)?,
    }))
}

fn create_in_scope(
    ctx: &ApiContext,
    scope: &TemplateScope,
    input: &TemplateInput,
) -> Result<(StatusCode, Json<TemplateResponse>), ApiError> {
    let conn = ctx.open_db()?;
    let template = templates::create_template(&conn, scope, input)?;
    Ok((
        StatusCode::CREATED,
        Json(TemplateResponse {
            template: Some(template),
        }),
    ))
}

fn update_in_scope(
    ctx: &ApiContext,
    scope: &TemplateScope,
    id: i64,
    input: &TemplateInput,
) -> Result<Json<TemplateResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let template = templates::update_template(&conn, scope, id, input)?;
    Ok(Json(TemplateResponse {
        template: Some(template),
    }))
}

fn delete_in_scope(ctx: &ApiContext, scope: &TemplateScope, id: i64) -> Result<StatusCode, ApiError> {
    let conn = ctx.open_db()?;
    templates::delete_template(&conn, scope, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Specialty scoped ─────────────────────────────────────

/// `GET /api/specialties/:id/templates/:type?defaultOnly=`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiPath((specialty_id, segment)): ApiPath<(i64, String)>,
    ApiQuery(query): ApiQuery<TemplateListQuery>,
) -> Result<Json<TemplatesResponse>, ApiError> {
    let scope = specialty_scope(specialty_id, &segment)?;
    list_in_scope(&ctx, &scope, query.default_only.unwrap_or(false))
}

/// `GET /api/specialties/:id/templates/:type/default`
pub async fn default(
    State(ctx): State<ApiContext>,
    ApiPath((specialty_id, segment)): ApiPath<(i64, String)>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let scope = specialty_scope(specialty_id, &segment)?;
    default_in_scope(&ctx, &scope)
}

/// `POST /api/specialties/:id/templates/:type`
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiPath((specialty_id, segment)): ApiPath<(i64, String)>,
    ApiJson(input): ApiJson<TemplateInput>,
) -> Result<(StatusCode, Json<TemplateResponse>), ApiError> {
    let scope = specialty_scope(specialty_id, &segment)?;
    create_in_scope(&ctx, &scope, &input)
}

/// `PUT /api/specialties/:id/templates/:type/:templateId`
pub async fn update(
    State(ctx): State<ApiContext>,
    ApiPath((specialty_id, segment, template_id)): ApiPath<(i64, String, i64)>,
    ApiJson(input): ApiJson<TemplateInput>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let scope = specialty_scope(specialty_id, &segment)?;
    update_in_scope(&ctx, &scope, template_id, &input)
}

/// `DELETE /api/specialties/:id/templates/:type/:templateId`
pub async fn delete(
    State(ctx): State<ApiContext>,
    ApiPath((specialty_id, segment, template_id)): ApiPath<(i64, String, i64)>,
) -> Result<StatusCode, ApiError> {
    let scope = specialty_scope(specialty_id, &segment)?;
    delete_in_scope(&ctx, &scope, template_id)
}

// ─── Consents ─────────────────────────────────────────────

/// `GET /api/consents?defaultOnly=`
pub async fn list_consents(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<TemplateListQuery>,
) -> Result<Json<TemplatesResponse>, ApiError> {
    list_in_scope(&ctx, &TemplateScope::consents(), query.default_only.unwrap_or(false))
}

/// `GET /api/consents/default`
pub async fn default_consent(
    State(ctx): State<ApiContext>,
) -> Result<Json<TemplateResponse>, ApiError> {
    default_in_scope(&ctx, &TemplateScope::consents())
}

/// `POST /api/consents`
pub async fn create_consent(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<TemplateInput>,
) -> Result<(StatusCode, Json<TemplateResponse>), ApiError> {
    create_in_scope(&ctx, &TemplateScope::consents(), &input)
}

/// `PUT /api/consents/:templateId`
pub async fn update_consent(
    State(ctx): State<ApiContext>,
    ApiPath(template_id): ApiPath<i64>,
    ApiJson(input): ApiJson<TemplateInput>,
) -> Result<Json<TemplateResponse>, ApiError> {
    update_in_scope(&ctx, &TemplateScope::consents(), template_id, &input)
}

/// `DELETE /api/consents/:templateId`
pub async fn delete_consent(
    State(ctx): State<ApiContext>,
    ApiPath(template_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    delete_in_scope(&ctx, &TemplateScope::consents(), template_id)
}
