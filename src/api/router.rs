//! Office API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack on protected routes (outermost → innermost):
//! Extension(ApiContext) → Auth validator → Audit logger → Handler

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the office API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let cors = cors_layer(core.settings.cors_origin.as_deref());
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/auth/me", get(endpoints::auth::me))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail).put(endpoints::patients::update),
        )
        .route(
            "/patients/:id/medical-history",
            patch(endpoints::patients::update_medical_history),
        )
        .route(
            "/specialties",
            get(endpoints::directory::list_specialties)
                .post(endpoints::directory::create_specialty),
        )
        .route(
            "/doctors",
            get(endpoints::directory::list_doctors).post(endpoints::directory::create_doctor),
        )
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route(
            "/appointments/:id",
            get(endpoints::appointments::detail)
                .put(endpoints::appointments::update)
                .delete(endpoints::appointments::delete),
        )
        .route(
            "/appointments/:id/status",
            patch(endpoints::appointments::update_status),
        )
        .route(
            "/appointments/:id/doctor",
            patch(endpoints::appointments::reassign_doctor),
        )
        .route(
            "/specialties/:id/templates/:kind",
            get(endpoints::templates::list).post(endpoints::templates::create),
        )
        .route(
            "/specialties/:id/templates/:kind/default",
            get(endpoints::templates::default),
        )
        .route(
            "/specialties/:id/templates/:kind/:template_id",
            put(endpoints::templates::update).delete(endpoints::templates::delete),
        )
        .route(
            "/consents",
            get(endpoints::templates::list_consents).post(endpoints::templates::create_consent),
        )
        .route("/consents/default", get(endpoints::templates::default_consent))
        .route(
            "/consents/:template_id",
            put(endpoints::templates::update_consent)
                .delete(endpoints::templates::delete_consent),
        )
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes (audit only, no auth required)
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected.merge(public))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
}

/// CORS for the SPA. A configured origin is matched exactly; without one
/// any origin is allowed.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => layer.allow_origin(AllowOrigin::exact(value)),
        Some(Err(_)) => {
            tracing::warn!(?origin, "invalid CORS origin, allowing any");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::core_state::tests::test_settings;

    /// Router over a fresh temp database with the bootstrap admin.
    /// The tempdir guard must be kept alive for the duration of the test.
    fn test_app() -> (Router, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let core = CoreState::initialize(test_settings(tmp.path())).unwrap();
        (api_router(Arc::new(core)), tmp)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn login(app: &Router) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "admin", "password": "admin-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    /// Specialty, doctor and patient ready for booking. Returns their ids.
    async fn seed_directory(app: &Router, token: &str) -> (i64, i64, i64) {
        let (_, body) = send(
            app,
            "POST",
            "/api/specialties",
            Some(token),
            Some(json!({"name": "Pediatría"})),
        )
        .await;
        let specialty_id = body["specialty"]["id"].as_i64().unwrap();

        let (_, body) = send(
            app,
            "POST",
            "/api/doctors",
            Some(token),
            Some(json!({"firstName": "Laura", "lastName": "Restrepo", "specialtyId": specialty_id})),
        )
        .await;
        let doctor_id = body["doctor"]["id"].as_i64().unwrap();

        let (_, body) = send(
            app,
            "POST",
            "/api/patients",
            Some(token),
            Some(json!({"firstName": "Ana", "lastName": "Gómez", "identificationNumber": "1001"})),
        )
        .await;
        let patient_id = body["patient"]["id"].as_i64().unwrap();

        (specialty_id, doctor_id, patient_id)
    }

    // ── Auth ─────────────────────────────────────────────────

    #[tokio::test]
    async fn health_is_public() {
        let (app, _tmp) = test_app();
        let (status, body) = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn protected_route_without_token_is_401() {
        let (app, _tmp) = test_app();
        let (status, body) = send(&app, "GET", "/api/patients", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

        let (status, _) = send(&app, "GET", "/api/patients", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let (app, _tmp) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "admin", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn login_without_fields_is_validation_error() {
        let (app, _tmp) = test_app();
        let (status, body) =
            send(&app, "POST", "/api/auth/login", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Missing required field(s): username, password"
        );
    }

    #[tokio::test]
    async fn me_and_logout() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;

        let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "admin");

        let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn responses_are_not_cacheable() {
        let (app, _tmp) = test_app();
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
        assert!(response.headers().contains_key("x-request-id"));
    }

    // ── Patients ─────────────────────────────────────────────

    #[tokio::test]
    async fn patient_registration_assembles_birth_date() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/patients",
            Some(&token),
            Some(json!({
                "firstName": "Ana",
                "lastName": "Gómez",
                "identificationNumber": 52123456,
                "birthDay": 5,
                "birthMonth": "marzo",
                "birthYear": "1985",
                "email": ""
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["patient"]["birthDate"], "1985-03-05");
        assert_eq!(body["patient"]["identificationNumber"], "52123456");
        assert_eq!(body["patient"]["email"], Value::Null);
    }

    #[tokio::test]
    async fn patient_missing_fields_are_listed() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/patients",
            Some(&token),
            Some(json!({"firstName": "Ana"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["error"]["message"],
            "Missing required field(s): lastName, identificationNumber"
        );
    }

    #[tokio::test]
    async fn patient_search_history_and_lookup() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        let (_, _, patient_id) = seed_directory(&app, &token).await;

        let (status, body) =
            send(&app, "GET", "/api/patients?search=G%C3%93M&limit=5", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patients"].as_array().unwrap().len(), 1);
        assert_eq!(body["pagination"]["limit"], 5);

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/patients/{patient_id}/medical-history"),
            Some(&token),
            Some(json!({"medicalHistory": "Asma"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patient"]["medicalHistory"], "Asma");

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/api/patients/{patient_id}/medical-history"),
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "GET", "/api/patients/999", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, body) = send(&app, "GET", "/api/patients/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn duplicate_identification_is_validation_error() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        seed_directory(&app, &token).await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/patients",
            Some(&token),
            Some(json!({"firstName": "Otra", "lastName": "Persona", "identificationNumber": "1001"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_validation_error() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/appointments")
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    // ── Directory ────────────────────────────────────────────

    #[tokio::test]
    async fn doctor_with_unknown_specialty_is_404() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/doctors",
            Some(&token),
            Some(json!({"firstName": "Jorge", "lastName": "Mejía", "specialtyId": 42})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn doctors_filter_by_specialty() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        let (specialty_id, _, _) = seed_directory(&app, &token).await;

        let (_, body) = send(
            &app,
            "GET",
            &format!("/api/doctors?specialtyId={specialty_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["doctors"][0]["specialtyName"], "Pediatría");

        let (_, body) = send(&app, "GET", "/api/doctors?specialtyId=999", Some(&token), None).await;
        assert!(body["doctors"].as_array().unwrap().is_empty());
    }

    // ── Appointments ─────────────────────────────────────────

    #[tokio::test]
    async fn appointment_lifecycle() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        let (specialty_id, doctor_id, patient_id) = seed_directory(&app, &token).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/appointments",
            Some(&token),
            Some(json!({
                "patientId": patient_id,
                "doctorId": doctor_id.to_string(),
                "specialtyId": specialty_id,
                "appointmentDate": "2026-03-10",
                "appointmentTime": "09:30"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let appointment = &body["appointment"];
        let id = appointment["id"].as_i64().unwrap();
        assert_eq!(appointment["duration"], 30);
        assert_eq!(appointment["type"], "CONSULTA");
        assert_eq!(appointment["status"], "PROGRAMADA");
        assert_eq!(appointment["patientName"], "Ana Gómez");
        assert_eq!(appointment["doctorName"], "Laura Restrepo");
        assert_eq!(appointment["specialtyName"], "Pediatría");

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/appointments/{id}/status"),
            Some(&token),
            Some(json!({"status": "CONFIRMADA"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appointment"]["status"], "CONFIRMADA");
        assert_eq!(body["appointment"]["appointmentTime"], "09:30");

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/api/appointments/{id}/status"),
            Some(&token),
            Some(json!({"status": "PERDIDA"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/api/appointments/{id}/doctor"),
            Some(&token),
            Some(json!({"doctorId": 999})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/api/appointments/{id}/doctor"),
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send(&app, "DELETE", &format!("/api/appointments/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) =
            send(&app, "GET", &format!("/api/appointments/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn appointment_validation_and_references() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        let (_, doctor_id, patient_id) = seed_directory(&app, &token).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/appointments",
            Some(&token),
            Some(json!({"patientId": patient_id})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Missing required field(s): doctorId, appointmentDate, appointmentTime"
        );

        let (status, body) = send(
            &app,
            "POST",
            "/api/appointments",
            Some(&token),
            Some(json!({
                "patientId": 999,
                "doctorId": doctor_id,
                "appointmentDate": "2026-03-10",
                "appointmentTime": "09:30"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Referenced patient 999 does not exist");

        let (status, _) = send(
            &app,
            "PUT",
            "/api/appointments/999",
            Some(&token),
            Some(json!({
                "patientId": patient_id,
                "doctorId": doctor_id,
                "appointmentDate": "2026-03-10",
                "appointmentTime": "09:30"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn appointment_listing_filters_sorts_and_paginates() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        let (_, doctor_id, patient_id) = seed_directory(&app, &token).await;

        for (date, time) in [
            ("2026-03-11", "08:00"),
            ("2026-03-10", "10:00"),
            ("2026-03-10", "09:00"),
        ] {
            let (status, _) = send(
                &app,
                "POST",
                "/api/appointments",
                Some(&token),
                Some(json!({
                    "patientId": patient_id,
                    "doctorId": doctor_id,
                    "appointmentDate": date,
                    "appointmentTime": time
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(&app, "GET", "/api/appointments", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let times: Vec<_> = body["appointments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["appointmentTime"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(times, vec!["09:00", "10:00", "08:00"]);
        assert_eq!(body["pagination"]["total"], 3);

        let (_, body) = send(
            &app,
            "GET",
            "/api/appointments?date=2026-03-10&sortOrder=desc",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["appointments"][0]["appointmentTime"], "10:00");
        assert_eq!(body["pagination"]["total"], 2);

        let (_, body) = send(
            &app,
            "GET",
            "/api/appointments?page=2&limit=2",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["appointments"].as_array().unwrap().len(), 1);
        assert_eq!(body["pagination"]["totalPages"], 2);

        let (status, _) = send(
            &app,
            "GET",
            "/api/appointments?sortBy=room",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn listings_reject_out_of_range_pages() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        seed_directory(&app, &token).await;

        for uri in [
            "/api/appointments?page=9223372036854775807&limit=2",
            "/api/patients?page=9223372036854775807&limit=2",
        ] {
            let (status, body) = send(&app, "GET", uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn listings_treat_empty_page_parameters_as_absent() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        seed_directory(&app, &token).await;

        for uri in ["/api/appointments?page=&limit=", "/api/patients?page=&limit=&search="] {
            let (status, body) = send(&app, "GET", uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["pagination"]["page"], 1);
            assert_eq!(body["pagination"]["limit"], 20);
        }

        let (status, _) = send(&app, "GET", "/api/patients?page=dos", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ── Templates ────────────────────────────────────────────

    #[tokio::test]
    async fn specialty_template_default_switching() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;
        let (specialty_id, _, _) = seed_directory(&app, &token).await;
        let base = format!("/api/specialties/{specialty_id}/templates/evolutions");

        let (status, body) = send(
            &app,
            "POST",
            &base,
            Some(&token),
            Some(json!({"name": "Nota inicial", "content": "...", "isDefault": true})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["template"]["kind"], "evolution");
        let first = body["template"]["id"].as_i64().unwrap();

        let (_, body) = send(
            &app,
            "POST",
            &base,
            Some(&token),
            Some(json!({"name": "Control", "isDefault": false})),
        )
        .await;
        let second = body["template"]["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            "PUT",
            &format!("{base}/{second}"),
            Some(&token),
            Some(json!({"isDefault": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", &format!("{base}/default"), Some(&token), None).await;
        assert_eq!(body["template"]["id"], second);

        let (_, body) = send(&app, "GET", &format!("{base}?defaultOnly=true"), Some(&token), None)
            .await;
        assert_eq!(body["templates"].as_array().unwrap().len(), 1);

        let (_, body) = send(&app, "GET", &base, Some(&token), None).await;
        let defaults: Vec<_> = body["templates"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|t| t["isDefault"] == true)
            .map(|t| t["id"].as_i64().unwrap())
            .collect();
        assert_eq!(defaults, vec![second]);

        // Same id, other collection of the same specialty.
        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/specialties/{specialty_id}/templates/prescriptions/{first}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(&app, "DELETE", &format!("{base}/{second}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&app, "GET", &format!("{base}/default"), Some(&token), None).await;
        assert_eq!(body["template"], Value::Null);
    }

    #[tokio::test]
    async fn template_routes_reject_bad_scope() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;

        let (status, _) = send(
            &app,
            "GET",
            "/api/specialties/77/templates/evolutions",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "GET",
            "/api/specialties/1/templates/recipes",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn consents_keep_a_single_default() {
        let (app, _tmp) = test_app();
        let token = login(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/consents",
            Some(&token),
            Some(json!({"name": "General", "content": "Autorizo...", "isDefault": true})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["template"]["specialtyId"], Value::Null);

        let (_, body) = send(
            &app,
            "POST",
            "/api/consents",
            Some(&token),
            Some(json!({"name": "Procedimiento", "isDefault": true})),
        )
        .await;
        let second = body["template"]["id"].as_i64().unwrap();

        let (_, body) = send(&app, "GET", "/api/consents/default", Some(&token), None).await;
        assert_eq!(body["template"]["id"], second);

        let (status, body) = send(
            &app,
            "POST",
            "/api/consents",
            Some(&token),
            Some(json!({"name": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
