use serde::{Deserialize, Serialize};

/// Stored patient record. Every optional column is `None` when the intake
/// payload left it out or sent an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub identification_type: Option<String>,
    pub identification_number: String,
    pub gender: Option<String>,
    pub birth_date: Option<String>, // YYYY-MM-DD, not calendar-checked
    pub blood_type: Option<String>,
    pub marital_status: Option<String>,
    pub education_level: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub email: Option<String>,
    pub eps: Option<String>,
    pub agreement: Option<String>,
    pub patient_type: Option<String>,
    pub observations: Option<String>,
    pub reference: Option<String>,
    pub medical_history: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
