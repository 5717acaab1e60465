//! Specialties and doctors: the directory appointments point into.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;

use crate::db::{is_unique_violation, DatabaseError};
use crate::models::{Doctor, Specialty};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpecialty {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub specialty_id: Option<i64>,
    pub license_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn list_specialties(conn: &Connection) -> Result<Vec<Specialty>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, description FROM specialties ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok(Specialty {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn get_specialty(conn: &Connection, id: i64) -> Result<Specialty, DatabaseError> {
    conn.query_row(
        "SELECT id, name, description FROM specialties WHERE id = ?1",
        params![id],
        |row| {
            Ok(Specialty {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| DatabaseError::not_found("Specialty", id))
}

pub fn create_specialty(conn: &Connection, new: &NewSpecialty) -> Result<Specialty, DatabaseError> {
    let name = non_empty(&new.name)
        .ok_or_else(|| DatabaseError::MissingFields(vec!["name".into()]))?;

    conn.execute(
        "INSERT INTO specialties (name, description) VALUES (?1, ?2)",
        params![name, non_empty(&new.description)],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            DatabaseError::ConstraintViolation(format!("specialty {name} already exists"))
        } else {
            DatabaseError::Sqlite(e)
        }
    })?;

    get_specialty(conn, conn.last_insert_rowid())
}

const DOCTOR_SELECT: &str = "SELECT d.id, d.first_name, d.last_name, d.specialty_id, s.name,
            d.license_number, d.phone, d.email, d.active
     FROM doctors d
     LEFT JOIN specialties s ON d.specialty_id = s.id";

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        specialty_id: row.get(3)?,
        specialty_name: row.get(4)?,
        license_number: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        active: row.get(8)?,
    })
}

/// Doctors ordered by name, optionally narrowed to one specialty.
pub fn list_doctors(
    conn: &Connection,
    specialty_id: Option<i64>,
    include_inactive: bool,
) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{DOCTOR_SELECT}
         WHERE (?1 IS NULL OR d.specialty_id = ?1)
           AND (?2 OR d.active = 1)
         ORDER BY d.last_name, d.first_name"
    ))?;
    let rows = stmt.query_map(params![specialty_id, include_inactive], doctor_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Doctor, DatabaseError> {
    conn.query_row(
        &format!("{DOCTOR_SELECT} WHERE d.id = ?1"),
        params![id],
        doctor_from_row,
    )
    .optional()?
    .ok_or_else(|| DatabaseError::not_found("Doctor", id))
}

pub fn create_doctor(conn: &Connection, new: &NewDoctor) -> Result<Doctor, DatabaseError> {
    let first_name = non_empty(&new.first_name);
    let last_name = non_empty(&new.last_name);
    let (Some(first_name), Some(last_name)) = (first_name, last_name) else {
        let mut missing = Vec::new();
        if first_name.is_none() {
            missing.push("firstName".to_string());
        }
        if last_name.is_none() {
            missing.push("lastName".to_string());
        }
        return Err(DatabaseError::MissingFields(missing));
    };

    conn.execute(
        "INSERT INTO doctors (first_name, last_name, specialty_id, license_number, phone, email)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            first_name,
            last_name,
            new.specialty_id,
            non_empty(&new.license_number),
            non_empty(&new.phone),
            non_empty(&new.email),
        ],
    )
    .map_err(|e| DatabaseError::from_write(e, "specialty"))?;

    let id = conn.last_insert_rowid();
    tracing::info!(doctor_id = id, "doctor added");
    get_doctor(conn, id)
}
