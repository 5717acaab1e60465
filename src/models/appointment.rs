use serde::{Deserialize, Serialize};

use super::enums::{AppointmentStatus, AppointmentType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub specialty_id: Option<i64>,
    pub appointment_date: String, // YYYY-MM-DD
    pub appointment_time: String, // HH:MM
    pub duration: i64,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Appointment plus display fields joined in at read time. Never written back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
    pub patient_identification: String,
    pub doctor_name: String,
    pub specialty_name: Option<String>,
}
