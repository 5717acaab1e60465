//! Appointment scheduling: validation, persistence, filtering.
//!
//! Write path: `AppointmentRequest` (raw form) → `validate()` →
//! `AppointmentDraft` (typed, defaults filled) → insert/update.
//! Validation always runs before any write.
//!
//! Read path: `AppointmentQuery` (raw query string) → filter + sort + page
//! → rows joined with patient/doctor/specialty names for display.
//!
//! Two bookings for the same doctor and slot are accepted; no overlap check
//! is made here.

use chrono::{NaiveDate, NaiveTime, Timelike};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;

use crate::config::DEFAULT_APPOINTMENT_MINUTES;
use crate::db::{is_foreign_key_violation, DatabaseError};
use crate::intake::text_or_number;
use crate::models::{
    Appointment, AppointmentSortField, AppointmentStatus, AppointmentType, AppointmentView,
    PageRequest, Pagination, SortOrder,
};

/// Longest bookable slot, in minutes.
const MAX_DURATION_MINUTES: i64 = 24 * 60;

// ─── Write types ──────────────────────────────────────────────────────────────

/// Appointment form as posted by the scheduling screen. Every field is
/// optional at this layer so missing ones can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    #[serde(default, deserialize_with = "text_or_number")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub doctor_id: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub specialty_id: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub duration: Option<String>,
    #[serde(rename = "type")]
    pub appointment_type: Option<String>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Validated appointment, ready to store. Defaults: 30 minutes,
/// `CONSULTA`, `PROGRAMADA`, no reason, no notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDraft {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub specialty_id: Option<i64>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub duration: i64,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_id(field: &str, raw: &str) -> Result<i64, DatabaseError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(DatabaseError::invalid(field, format!("expected a positive id, got {raw:?}"))),
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| DatabaseError::invalid(field, format!("expected YYYY-MM-DD, got {raw:?}")))
}

fn parse_time(field: &str, raw: &str) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| DatabaseError::invalid(field, format!("expected HH:MM or HH:MM:SS, got {raw:?}")))
}

/// Stored form of a slot time: `HH:MM`, or `HH:MM:SS` when seconds were given.
fn stored_time(time: &NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}

fn parse_enum<T>(field: &str, raw: &str) -> Result<T, DatabaseError>
where
    T: std::str::FromStr<Err = DatabaseError>,
{
    raw.parse::<T>().map_err(|_| DatabaseError::InvalidEnum {
        field: field.into(),
        value: raw.into(),
    })
}

impl AppointmentRequest {
    /// Check required fields, then formats, and fill defaults.
    ///
    /// Required: `patientId`, `doctorId`, `appointmentDate`,
    /// `appointmentTime`. All missing ones are named in one error.
    pub fn validate(&self) -> Result<AppointmentDraft, DatabaseError> {
        let required = [
            ("patientId", present(&self.patient_id)),
            ("doctorId", present(&self.doctor_id)),
            ("appointmentDate", present(&self.appointment_date)),
            ("appointmentTime", present(&self.appointment_time)),
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name.to_string())
            .collect();

        let [(_, Some(patient_id)), (_, Some(doctor_id)), (_, Some(date)), (_, Some(time))] =
            required
        else {
            return Err(DatabaseError::MissingFields(missing));
        };

        let duration = match present(&self.duration) {
            None => DEFAULT_APPOINTMENT_MINUTES,
            Some(raw) => match raw.parse::<i64>() {
                Ok(minutes) if (1..=MAX_DURATION_MINUTES).contains(&minutes) => minutes,
                _ => {
                    return Err(DatabaseError::invalid(
                        "duration",
                        format!("expected minutes between 1 and {MAX_DURATION_MINUTES}"),
                    ))
                }
            },
        };

        Ok(AppointmentDraft {
            patient_id: parse_id("patientId", patient_id)?,
            doctor_id: parse_id("doctorId", doctor_id)?,
            specialty_id: present(&self.specialty_id)
                .map(|raw| parse_id("specialtyId", raw))
                .transpose()?,
            appointment_date: parse_date("appointmentDate", date)?,
            appointment_time: parse_time("appointmentTime", time)?,
            duration,
            appointment_type: present(&self.appointment_type)
                .map(|raw| parse_enum("type", raw))
                .transpose()?
                .unwrap_or(AppointmentType::Consulta),
            status: present(&self.status)
                .map(|raw| parse_enum("status", raw))
                .transpose()?
                .unwrap_or(AppointmentStatus::Programada),
            reason: present(&self.reason).map(str::to_string),
            notes: present(&self.notes).map(str::to_string),
        })
    }
}

// ─── Repository functions ─────────────────────────────────────────────────────

const APPOINTMENT_COLUMNS: &str = "a.id, a.patient_id, a.doctor_id, a.specialty_id,
     a.appointment_date, a.appointment_time, a.duration, a.type, a.status,
     a.reason, a.notes, a.created_at, a.updated_at";

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        specialty_id: row.get(3)?,
        appointment_date: row.get(4)?,
        appointment_time: row.get(5)?,
        duration: row.get(6)?,
        appointment_type: row.get(7)?,
        status: row.get(8)?,
        reason: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Name the first reference in a draft that points at nothing. A failure
/// while checking is a store error, not a missing row.
fn missing_reference(conn: &Connection, draft: &AppointmentDraft) -> DatabaseError {
    match first_missing_reference(conn, draft) {
        Ok(reference) => DatabaseError::MissingReference(reference),
        Err(e) => DatabaseError::Sqlite(e),
    }
}

fn first_missing_reference(conn: &Connection, draft: &AppointmentDraft) -> rusqlite::Result<String> {
    let exists = |table: &str, id: i64| -> rusqlite::Result<bool> {
        conn.query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            params![id],
            |_| Ok(()),
        )
        .optional()
        .map(|row| row.is_some())
    };

    if !exists("patients", draft.patient_id)? {
        return Ok(format!("patient {}", draft.patient_id));
    }
    if !exists("doctors", draft.doctor_id)? {
        return Ok(format!("doctor {}", draft.doctor_id));
    }
    match draft.specialty_id {
        Some(id) if !exists("specialties", id)? => Ok(format!("specialty {id}")),
        _ => Ok("patient, doctor or specialty".into()),
    }
}

fn classify_write(conn: &Connection, err: rusqlite::Error, draft: &AppointmentDraft) -> DatabaseError {
    if is_foreign_key_violation(&err) {
        missing_reference(conn, draft)
    } else {
        DatabaseError::Sqlite(err)
    }
}

/// Insert one appointment and return the stored row with its new id.
pub fn create_appointment(
    conn: &Connection,
    draft: &AppointmentDraft,
) -> Result<Appointment, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (patient_id, doctor_id, specialty_id, appointment_date,
         appointment_time, duration, type, status, reason, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            draft.patient_id,
            draft.doctor_id,
            draft.specialty_id,
            draft.appointment_date.format("%Y-%m-%d").to_string(),
            stored_time(&draft.appointment_time),
            draft.duration,
            draft.appointment_type,
            draft.status,
            draft.reason,
            draft.notes,
        ],
    )
    .map_err(|e| classify_write(conn, e, draft))?;

    let id = conn.last_insert_rowid();
    tracing::info!(
        appointment_id = id,
        patient_id = draft.patient_id,
        doctor_id = draft.doctor_id,
        date = %draft.appointment_date,
        "appointment scheduled"
    );
    get_appointment(conn, id)
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Appointment, DatabaseError> {
    conn.query_row(
        &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1"),
        params![id],
        appointment_from_row,
    )
    .optional()?
    .ok_or_else(|| DatabaseError::not_found("Appointment", id))
}

/// Replace every field of an existing appointment.
pub fn update_appointment(
    conn: &Connection,
    id: i64,
    draft: &AppointmentDraft,
) -> Result<Appointment, DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE appointments SET patient_id = ?1, doctor_id = ?2, specialty_id = ?3,
             appointment_date = ?4, appointment_time = ?5, duration = ?6, type = ?7,
             status = ?8, reason = ?9, notes = ?10, updated_at = datetime('now')
             WHERE id = ?11",
            params![
                draft.patient_id,
                draft.doctor_id,
                draft.specialty_id,
                draft.appointment_date.format("%Y-%m-%d").to_string(),
                stored_time(&draft.appointment_time),
                draft.duration,
                draft.appointment_type,
                draft.status,
                draft.reason,
                draft.notes,
                id,
            ],
        )
        .map_err(|e| classify_write(conn, e, draft))?;

    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    tracing::info!(appointment_id = id, "appointment updated");
    get_appointment(conn, id)
}

/// Move an appointment to another status. Any status may follow any other.
pub fn update_status(
    conn: &Connection,
    id: i64,
    status: Option<&str>,
) -> Result<Appointment, DatabaseError> {
    let raw = status
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DatabaseError::MissingFields(vec!["status".into()]))?;
    let status: AppointmentStatus = parse_enum("status", raw)?;

    let changed = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status, id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    tracing::info!(
        appointment_id = id,
        status = %status,
        closed = status.is_closed(),
        "appointment status changed"
    );
    get_appointment(conn, id)
}

/// Point an appointment at a different doctor. Nothing else changes.
pub fn reassign_doctor(
    conn: &Connection,
    id: i64,
    doctor_id: Option<&str>,
) -> Result<Appointment, DatabaseError> {
    let raw = doctor_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DatabaseError::MissingFields(vec!["doctorId".into()]))?;
    let doctor_id = parse_id("doctorId", raw)?;

    let changed = conn
        .execute(
            "UPDATE appointments SET doctor_id = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![doctor_id, id],
        )
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DatabaseError::MissingReference(format!("doctor {doctor_id}"))
            } else {
                DatabaseError::Sqlite(e)
            }
        })?;

    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    tracing::info!(appointment_id = id, doctor_id, "appointment reassigned");
    get_appointment(conn, id)
}

/// Hard delete. Prefer setting `CANCELADA` to keep the history.
pub fn delete_appointment(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    tracing::info!(appointment_id = id, "appointment deleted");
    Ok(())
}

// ─── Read path ────────────────────────────────────────────────────────────────

/// Query-string shape of `GET /appointments`. Values stay as text so an
/// empty parameter (`doctorId=`) reads as "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuery {
    pub date: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub appointment_type: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// AND-combined constraints. `None` means no constraint on that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub date: Option<NaiveDate>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
    pub appointment_type: Option<AppointmentType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentSort {
    pub field: AppointmentSortField,
    pub order: SortOrder,
}

impl Default for AppointmentSort {
    fn default() -> Self {
        Self {
            field: AppointmentSortField::AppointmentDate,
            order: SortOrder::Asc,
        }
    }
}

impl AppointmentQuery {
    /// Parse every parameter. Malformed values are rejected, not ignored.
    pub fn parse(&self) -> Result<(AppointmentFilter, AppointmentSort, PageRequest), DatabaseError> {
        let filter = AppointmentFilter {
            date: present(&self.date).map(|d| parse_date("date", d)).transpose()?,
            date_from: present(&self.date_from)
                .map(|d| parse_date("dateFrom", d))
                .transpose()?,
            date_to: present(&self.date_to)
                .map(|d| parse_date("dateTo", d))
                .transpose()?,
            doctor_id: present(&self.doctor_id)
                .map(|id| parse_id("doctorId", id))
                .transpose()?,
            patient_id: present(&self.patient_id)
                .map(|id| parse_id("patientId", id))
                .transpose()?,
            status: present(&self.status)
                .map(|s| parse_enum("status", s))
                .transpose()?,
            appointment_type: present(&self.appointment_type)
                .map(|t| parse_enum("type", t))
                .transpose()?,
        };

        let sort = AppointmentSort {
            field: present(&self.sort_by)
                .map(|f| parse_enum("sortBy", f))
                .transpose()?
                .unwrap_or(AppointmentSortField::AppointmentDate),
            order: present(&self.sort_order)
                .map(|o| parse_enum("sortOrder", &o.to_lowercase()))
                .transpose()?
                .unwrap_or(SortOrder::Asc),
        };

        let page = PageRequest::from_query(self.page.as_deref(), self.limit.as_deref())?;

        Ok((filter, sort, page))
    }
}

const VIEW_SELECT: &str = "FROM appointments a
     JOIN patients p ON a.patient_id = p.id
     JOIN doctors d ON a.doctor_id = d.id
     LEFT JOIN specialties sa ON a.specialty_id = sa.id
     LEFT JOIN specialties sd ON d.specialty_id = sd.id";

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<AppointmentView> {
    Ok(AppointmentView {
        appointment: appointment_from_row(row)?,
        patient_name: row.get(13)?,
        patient_identification: row.get(14)?,
        doctor_name: row.get(15)?,
        specialty_name: row.get(16)?,
    })
}

fn view_columns() -> String {
    format!(
        "{APPOINTMENT_COLUMNS},
         p.first_name || ' ' || p.last_name AS patient_name,
         p.identification_number,
         d.first_name || ' ' || d.last_name AS doctor_name,
         COALESCE(sa.name, sd.name) AS specialty_name"
    )
}

/// Builds the dynamic WHERE clause. Placeholders are positional, so params
/// must be pushed in the same order the clauses are.
struct FilterClause {
    sql: String,
    params: Vec<Box<dyn ToSql>>,
}

impl FilterClause {
    fn new(filter: &AppointmentFilter) -> Self {
        let mut sql = String::from(" WHERE 1=1");
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(date) = filter.date {
            sql.push_str(" AND a.appointment_date = ?");
            params.push(Box::new(date.format("%Y-%m-%d").to_string()));
        }
        if let Some(from) = filter.date_from {
            sql.push_str(" AND a.appointment_date >= ?");
            params.push(Box::new(from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = filter.date_to {
            sql.push_str(" AND a.appointment_date <= ?");
            params.push(Box::new(to.format("%Y-%m-%d").to_string()));
        }
        if let Some(doctor_id) = filter.doctor_id {
            sql.push_str(" AND a.doctor_id = ?");
            params.push(Box::new(doctor_id));
        }
        if let Some(patient_id) = filter.patient_id {
            sql.push_str(" AND a.patient_id = ?");
            params.push(Box::new(patient_id));
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND a.status = ?");
            params.push(Box::new(status));
        }
        if let Some(kind) = filter.appointment_type {
            sql.push_str(" AND a.type = ?");
            params.push(Box::new(kind));
        }

        Self { sql, params }
    }

    fn param_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Filtered, sorted, paginated listing with display names joined in.
pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
    sort: AppointmentSort,
    page: PageRequest,
) -> Result<(Vec<AppointmentView>, Pagination), DatabaseError> {
    let clause = FilterClause::new(filter);

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) {VIEW_SELECT}{}", clause.sql),
        clause.param_refs().as_slice(),
        |row| row.get(0),
    )?;

    let direction = sort.order.as_sql();
    let order_by = sort
        .field
        .sql_terms()
        .iter()
        .map(|term| format!("{term} {direction}"))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "SELECT {} {VIEW_SELECT}{} ORDER BY {order_by}, a.id ASC LIMIT ? OFFSET ?",
        view_columns(),
        clause.sql
    );

    let limit = page.limit;
    let offset = page.offset();
    let mut param_refs = clause.param_refs();
    param_refs.push(&limit);
    param_refs.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), view_from_row)?;
    let appointments = rows.collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(total, returned = appointments.len(), "appointments listed");
    Ok((appointments, page.describe(total)))
}

/// Single appointment with display names.
pub fn get_appointment_view(conn: &Connection, id: i64) -> Result<AppointmentView, DatabaseError> {
    conn.query_row(
        &format!("SELECT {} {VIEW_SELECT} WHERE a.id = ?1", view_columns()),
        params![id],
        view_from_row,
    )
    .optional()?
    .ok_or_else(|| DatabaseError::not_found("Appointment", id))
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn setup_db() -> Connection {
        let conn = open_memory_database().expect("open_memory_database");
        seed_test_data(&conn);
        conn
    }

    fn seed_test_data(conn: &Connection) {
        conn.execute_batch(
            "INSERT INTO specialties (id, name) VALUES (1, 'Medicina General'), (2, 'Cardiología');
             INSERT INTO doctors (id, first_name, last_name, specialty_id)
                 VALUES (2, 'Laura', 'Restrepo', 1), (3, 'Jorge', 'Mejía', 2);
             INSERT INTO patients (id, first_name, last_name, identification_number)
                 VALUES (1, 'Ana', 'Gómez', '100'), (2, 'Luis', 'Zapata', '200');",
        )
        .unwrap();
    }

    fn request(patient: &str, doctor: &str, date: &str, time: &str) -> AppointmentRequest {
        AppointmentRequest {
            patient_id: Some(patient.into()),
            doctor_id: Some(doctor.into()),
            appointment_date: Some(date.into()),
            appointment_time: Some(time.into()),
            ..Default::default()
        }
    }

    fn book(conn: &Connection, req: AppointmentRequest) -> Appointment {
        create_appointment(conn, &req.validate().unwrap()).unwrap()
    }

    // ── validation ──

    #[test]
    fn example_request_is_stored_verbatim() {
        let conn = setup_db();
        let req: AppointmentRequest = serde_json::from_value(serde_json::json!({
            "patientId": 1,
            "doctorId": 2,
            "appointmentDate": "2025-08-25",
            "appointmentTime": "10:00",
            "duration": 30,
            "type": "CONSULTA",
            "status": "PROGRAMADA",
        }))
        .unwrap();

        let created = create_appointment(&conn, &req.validate().unwrap()).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.patient_id, 1);
        assert_eq!(created.doctor_id, 2);
        assert_eq!(created.appointment_date, "2025-08-25");
        assert_eq!(created.appointment_time, "10:00");
        assert_eq!(created.duration, 30);
        assert_eq!(created.appointment_type, AppointmentType::Consulta);
        assert_eq!(created.status, AppointmentStatus::Programada);
    }

    #[test]
    fn each_missing_required_field_is_named() {
        let full = request("1", "2", "2025-08-25", "10:00");
        let cases: [(&str, fn(&mut AppointmentRequest)); 4] = [
            ("patientId", |r| r.patient_id = None),
            ("doctorId", |r| r.doctor_id = None),
            ("appointmentDate", |r| r.appointment_date = None),
            ("appointmentTime", |r| r.appointment_time = Some("  ".into())),
        ];
        for (field, strip) in cases {
            let mut req = full.clone();
            strip(&mut req);
            match req.validate() {
                Err(DatabaseError::MissingFields(fields)) => assert_eq!(fields, vec![field]),
                other => panic!("expected missing {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn all_missing_fields_reported_together() {
        let err = AppointmentRequest::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required field(s): patientId, doctorId, appointmentDate, appointmentTime"
        );
    }

    #[test]
    fn defaults_are_filled() {
        let draft = request("1", "2", "2025-08-25", "08:30").validate().unwrap();
        assert_eq!(draft.duration, 30);
        assert_eq!(draft.appointment_type, AppointmentType::Consulta);
        assert_eq!(draft.status, AppointmentStatus::Programada);
        assert_eq!(draft.reason, None);
    }

    #[test]
    fn malformed_values_are_validation_errors() {
        let mut req = request("1", "2", "25/08/2025", "10:00");
        assert!(req.validate().unwrap_err().is_validation());

        req = request("1", "2", "2025-08-25", "10h");
        assert!(req.validate().unwrap_err().is_validation());

        req = request("uno", "2", "2025-08-25", "10:00");
        assert!(req.validate().unwrap_err().is_validation());

        req = request("1", "2", "2025-08-25", "10:00");
        req.duration = Some("0".into());
        assert!(req.validate().unwrap_err().is_validation());

        req = request("1", "2", "2025-08-25", "10:00");
        req.appointment_type = Some("CIRUGIA".into());
        assert!(matches!(
            req.validate().unwrap_err(),
            DatabaseError::InvalidEnum { ref field, .. } if field == "type"
        ));
    }

    #[test]
    fn seconds_are_kept_when_given() {
        let conn = setup_db();
        let with_seconds = book(&conn, request("1", "2", "2025-08-25", "10:15:45"));
        assert_eq!(with_seconds.appointment_time, "10:15:45");

        let whole_minute = book(&conn, request("1", "2", "2025-08-25", "14:45:00"));
        assert_eq!(whole_minute.appointment_time, "14:45");

        let edit = request("1", "2", "2025-08-25", "09:05:30").validate().unwrap();
        let updated = update_appointment(&conn, whole_minute.id, &edit).unwrap();
        assert_eq!(updated.appointment_time, "09:05:30");
    }

    // ── writes ──

    #[test]
    fn unknown_patient_is_missing_reference() {
        let conn = setup_db();
        let draft = request("99", "2", "2025-08-25", "10:00").validate().unwrap();
        let err = create_appointment(&conn, &draft).unwrap_err();
        assert!(matches!(err, DatabaseError::MissingReference(ref r) if r == "patient 99"));
    }

    #[test]
    fn unknown_doctor_is_missing_reference() {
        let conn = setup_db();
        let draft = request("1", "42", "2025-08-25", "10:00").validate().unwrap();
        let err = create_appointment(&conn, &draft).unwrap_err();
        assert!(matches!(err, DatabaseError::MissingReference(ref r) if r == "doctor 42"));
    }

    #[test]
    fn reference_check_failure_is_a_store_error() {
        let conn = setup_db();
        conn.execute_batch("PRAGMA foreign_keys = OFF; DROP TABLE doctors;")
            .unwrap();
        let draft = request("1", "2", "2025-08-25", "10:00").validate().unwrap();
        assert!(matches!(
            missing_reference(&conn, &draft),
            DatabaseError::Sqlite(_)
        ));
    }

    #[test]
    fn same_slot_can_be_booked_twice() {
        let conn = setup_db();
        book(&conn, request("1", "2", "2025-08-25", "10:00"));
        book(&conn, request("2", "2", "2025-08-25", "10:00"));
        let (rows, _) = list_appointments(
            &conn,
            &AppointmentFilter::default(),
            AppointmentSort::default(),
            PageRequest::default(),
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn full_update_replaces_fields() {
        let conn = setup_db();
        let created = book(&conn, request("1", "2", "2025-08-25", "10:00"));
        let mut edit = request("1", "3", "2025-08-26", "11:30");
        edit.reason = Some("Dolor torácico".into());
        edit.appointment_type = Some("CONTROL".into());

        let updated = update_appointment(&conn, created.id, &edit.validate().unwrap()).unwrap();
        assert_eq!(updated.doctor_id, 3);
        assert_eq!(updated.appointment_date, "2025-08-26");
        assert_eq!(updated.appointment_type, AppointmentType::Control);
        assert_eq!(updated.reason.as_deref(), Some("Dolor torácico"));

        let missing = update_appointment(&conn, 999, &edit.validate().unwrap()).unwrap_err();
        assert!(matches!(missing, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn status_change_keeps_other_fields() {
        let conn = setup_db();
        let created = book(&conn, request("1", "2", "2025-08-25", "10:00"));
        let updated = update_status(&conn, created.id, Some("CANCELADA")).unwrap();
        assert_eq!(updated.status, AppointmentStatus::Cancelada);
        assert_eq!(updated.appointment_time, created.appointment_time);

        assert!(update_status(&conn, created.id, None).unwrap_err().is_validation());
        assert!(update_status(&conn, created.id, Some("BORRADA")).unwrap_err().is_validation());
        assert!(matches!(
            update_status(&conn, 999, Some("CONFIRMADA")).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }

    #[test]
    fn reassign_changes_only_doctor() {
        let conn = setup_db();
        let mut req = request("1", "2", "2025-08-25", "10:00");
        req.notes = Some("Traer exámenes".into());
        let created = book(&conn, req);

        let moved = reassign_doctor(&conn, created.id, Some("3")).unwrap();
        assert_eq!(moved.doctor_id, 3);
        assert_eq!(moved.patient_id, created.patient_id);
        assert_eq!(moved.appointment_date, created.appointment_date);
        assert_eq!(moved.notes, created.notes);
        assert_eq!(moved.status, created.status);
    }

    #[test]
    fn reassign_errors() {
        let conn = setup_db();
        let created = book(&conn, request("1", "2", "2025-08-25", "10:00"));

        assert!(matches!(
            reassign_doctor(&conn, created.id, None).unwrap_err(),
            DatabaseError::MissingFields(ref f) if f == &vec!["doctorId".to_string()]
        ));
        assert!(matches!(
            reassign_doctor(&conn, 999, Some("3")).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
        assert!(matches!(
            reassign_doctor(&conn, created.id, Some("77")).unwrap_err(),
            DatabaseError::MissingReference(_)
        ));
    }

    #[test]
    fn delete_then_missing() {
        let conn = setup_db();
        let created = book(&conn, request("1", "2", "2025-08-25", "10:00"));
        delete_appointment(&conn, created.id).unwrap();
        assert!(matches!(
            get_appointment(&conn, created.id).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
        assert!(delete_appointment(&conn, created.id).is_err());
    }

    // ── reads ──

    fn seed_week(conn: &Connection) {
        book(conn, request("1", "2", "2025-08-24", "09:00"));
        book(conn, request("1", "2", "2025-08-25", "10:00"));
        book(conn, request("2", "3", "2025-08-25", "08:00"));
        book(conn, request("2", "2", "2025-08-26", "11:00"));
        book(conn, request("1", "3", "2025-08-27", "12:00"));
        update_status(conn, 2, Some("CONFIRMADA")).unwrap();
        update_status(conn, 4, Some("CONFIRMADA")).unwrap();
    }

    fn query(pairs: &[(&str, &str)]) -> (AppointmentFilter, AppointmentSort, PageRequest) {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        let q: AppointmentQuery = serde_json::from_value(serde_json::Value::Object(map)).unwrap();
        q.parse().unwrap()
    }

    fn ids(conn: &Connection, pairs: &[(&str, &str)]) -> Vec<i64> {
        let (filter, sort, page) = query(pairs);
        let (rows, _) = list_appointments(conn, &filter, sort, page).unwrap();
        rows.into_iter().map(|v| v.appointment.id).collect()
    }

    #[test]
    fn date_range_is_inclusive() {
        let conn = setup_db();
        seed_week(&conn);
        let mut got = ids(&conn, &[("dateFrom", "2025-08-25"), ("dateTo", "2025-08-26")]);
        got.sort();
        assert_eq!(got, vec![2, 3, 4]);
    }

    #[test]
    fn filters_combine_with_and() {
        let conn = setup_db();
        seed_week(&conn);
        assert_eq!(ids(&conn, &[("doctorId", "2"), ("status", "CONFIRMADA")]), vec![2, 4]);
        assert_eq!(ids(&conn, &[("patientId", "2"), ("date", "2025-08-25")]), vec![3]);
        assert!(ids(&conn, &[("doctorId", "3"), ("status", "CONFIRMADA")]).is_empty());
    }

    #[test]
    fn empty_parameters_mean_no_filter() {
        let conn = setup_db();
        seed_week(&conn);
        assert_eq!(ids(&conn, &[("doctorId", ""), ("status", "")]).len(), 5);
    }

    #[test]
    fn default_sort_is_date_then_time_ascending() {
        let conn = setup_db();
        seed_week(&conn);
        assert_eq!(ids(&conn, &[]), vec![1, 3, 2, 4, 5]);
        assert_eq!(ids(&conn, &[("sortOrder", "DESC")]), vec![5, 4, 2, 3, 1]);
    }

    #[test]
    fn sort_by_patient_name() {
        let conn = setup_db();
        seed_week(&conn);
        let got = ids(&conn, &[("sortBy", "patientName")]);
        // Ana Gómez's three visits come first, then Luis Zapata's
        assert_eq!(got, vec![1, 2, 5, 3, 4]);
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let q = AppointmentQuery {
            sort_by: Some("salary".into()),
            ..Default::default()
        };
        assert!(q.parse().unwrap_err().is_validation());
    }

    #[test]
    fn pagination_window_and_totals() {
        let conn = setup_db();
        seed_week(&conn);
        let (filter, sort, page) = query(&[("page", "2"), ("limit", "2")]);
        let (rows, pagination) = list_appointments(&conn, &filter, sort, page).unwrap();
        let got: Vec<i64> = rows.iter().map(|v| v.appointment.id).collect();
        assert_eq!(got, vec![2, 4]);
        assert_eq!(pagination.total, 5);
        assert_eq!(pagination.total_pages, 3);
    }

    #[test]
    fn listing_is_enriched_with_names() {
        let conn = setup_db();
        let mut req = request("1", "3", "2025-08-25", "10:00");
        req.specialty_id = Some("1".into());
        book(&conn, req);
        book(&conn, request("2", "3", "2025-08-25", "11:00"));

        let (rows, _) = list_appointments(
            &conn,
            &AppointmentFilter::default(),
            AppointmentSort::default(),
            PageRequest::default(),
        )
        .unwrap();
        assert_eq!(rows[0].patient_name, "Ana Gómez");
        assert_eq!(rows[0].patient_identification, "100");
        assert_eq!(rows[0].doctor_name, "Jorge Mejía");
        // explicit specialty wins over the doctor's own
        assert_eq!(rows[0].specialty_name.as_deref(), Some("Medicina General"));
        assert_eq!(rows[1].specialty_name.as_deref(), Some("Cardiología"));
    }

    #[test]
    fn view_serializes_flat_camel_case() {
        let conn = setup_db();
        let created = book(&conn, request("1", "2", "2025-08-25", "10:00"));
        let view = get_appointment_view(&conn, created.id).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["patientId"], 1);
        assert_eq!(json["type"], "CONSULTA");
        assert_eq!(json["doctorName"], "Laura Restrepo");
    }
}
