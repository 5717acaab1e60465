//! Patient registry: create, fetch, edit, search.
//!
//! Payload normalization lives in `intake`; this module only moves
//! normalized records in and out of the `patients` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{is_unique_violation, DatabaseError};
use crate::intake::PatientRecord;
use crate::models::{PageRequest, Pagination, Patient};

const PATIENT_COLUMNS: &str = "id, first_name, last_name, identification_type, identification_number,
     gender, birth_date, blood_type, marital_status, education_level, occupation,
     address, city, department, phone, mobile_phone, email, eps, agreement,
     patient_type, observations, reference, medical_history, created_at, updated_at";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        identification_type: row.get(3)?,
        identification_number: row.get(4)?,
        gender: row.get(5)?,
        birth_date: row.get(6)?,
        blood_type: row.get(7)?,
        marital_status: row.get(8)?,
        education_level: row.get(9)?,
        occupation: row.get(10)?,
        address: row.get(11)?,
        city: row.get(12)?,
        department: row.get(13)?,
        phone: row.get(14)?,
        mobile_phone: row.get(15)?,
        email: row.get(16)?,
        eps: row.get(17)?,
        agreement: row.get(18)?,
        patient_type: row.get(19)?,
        observations: row.get(20)?,
        reference: row.get(21)?,
        medical_history: row.get(22)?,
        created_at: row.get(23)?,
        updated_at: row.get(24)?,
    })
}

fn duplicate_identification(err: rusqlite::Error, number: &str) -> DatabaseError {
    if is_unique_violation(&err) {
        DatabaseError::ConstraintViolation(format!(
            "identification number {number} is already registered"
        ))
    } else {
        DatabaseError::Sqlite(err)
    }
}

/// Insert a patient and return the stored row.
pub fn create_patient(conn: &Connection, record: &PatientRecord) -> Result<Patient, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (first_name, last_name, identification_type, identification_number,
         gender, birth_date, blood_type, marital_status, education_level, occupation,
         address, city, department, phone, mobile_phone, email, eps, agreement,
         patient_type, observations, reference, medical_history)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19, ?20, ?21, ?22)",
        params![
            record.first_name,
            record.last_name,
            record.identification_type,
            record.identification_number,
            record.gender,
            record.birth_date,
            record.blood_type,
            record.marital_status,
            record.education_level,
            record.occupation,
            record.address,
            record.city,
            record.department,
            record.phone,
            record.mobile_phone,
            record.email,
            record.eps,
            record.agreement,
            record.patient_type,
            record.observations,
            record.reference,
            record.medical_history,
        ],
    )
    .map_err(|e| duplicate_identification(e, &record.identification_number))?;

    let id = conn.last_insert_rowid();
    tracing::info!(patient_id = id, "patient registered");
    get_patient(conn, id)
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Patient, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
        params![id],
        patient_from_row,
    )
    .optional()?
    .ok_or_else(|| DatabaseError::not_found("Patient", id))
}

/// Replace every editable column. The birth date is re-derived from the
/// payload, so an edit without birth fields clears it.
pub fn update_patient(
    conn: &Connection,
    id: i64,
    record: &PatientRecord,
) -> Result<Patient, DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE patients SET first_name = ?1, last_name = ?2, identification_type = ?3,
             identification_number = ?4, gender = ?5, birth_date = ?6, blood_type = ?7,
             marital_status = ?8, education_level = ?9, occupation = ?10, address = ?11,
             city = ?12, department = ?13, phone = ?14, mobile_phone = ?15, email = ?16,
             eps = ?17, agreement = ?18, patient_type = ?19, observations = ?20,
             reference = ?21, medical_history = ?22, updated_at = datetime('now')
             WHERE id = ?23",
            params![
                record.first_name,
                record.last_name,
                record.identification_type,
                record.identification_number,
                record.gender,
                record.birth_date,
                record.blood_type,
                record.marital_status,
                record.education_level,
                record.occupation,
                record.address,
                record.city,
                record.department,
                record.phone,
                record.mobile_phone,
                record.email,
                record.eps,
                record.agreement,
                record.patient_type,
                record.observations,
                record.reference,
                record.medical_history,
                id,
            ],
        )
        .map_err(|e| duplicate_identification(e, &record.identification_number))?;

    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    get_patient(conn, id)
}

/// Overwrite only the medical history. An empty string clears it.
pub fn update_medical_history(
    conn: &Connection,
    id: i64,
    medical_history: &str,
) -> Result<Patient, DatabaseError> {
    let value = Some(medical_history.trim()).filter(|h| !h.is_empty());
    let changed = conn.execute(
        "UPDATE patients SET medical_history = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![value, id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    get_patient(conn, id)
}

/// Make `%`, `_` and `\` in user text match literally under `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring search over names, identification number
/// and email. A blank search lists everyone.
pub fn search_patients(
    conn: &Connection,
    search: Option<&str>,
    page: PageRequest,
) -> Result<(Vec<Patient>, Pagination), DatabaseError> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(&s.to_lowercase())));

    let filter = "WHERE ?1 IS NULL
           OR lower(first_name) LIKE ?1 ESCAPE '\\'
           OR lower(last_name) LIKE ?1 ESCAPE '\\'
           OR lower(first_name || ' ' || last_name) LIKE ?1 ESCAPE '\\'
           OR lower(identification_number) LIKE ?1 ESCAPE '\\'
           OR lower(COALESCE(email, '')) LIKE ?1 ESCAPE '\\'";

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM patients {filter}"),
        params![pattern],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients {filter}
         ORDER BY last_name, first_name, id
         LIMIT ?2 OFFSET ?3"
    ))?;
    let rows = stmt.query_map(params![pattern, page.limit, page.offset()], patient_from_row)?;
    let patients = rows.collect::<Result<Vec<_>, _>>()?;

    Ok((patients, page.describe(total)))
}
