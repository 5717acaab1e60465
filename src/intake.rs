//! Patient intake normalization.
//!
//! Turns the loosely shaped registration form into the fixed column set
//! stored in `patients`. Two rules apply everywhere:
//! 1. An empty or whitespace-only value is the same as an absent one.
//! 2. The birth date is assembled from day / month name / year and is
//!    either complete or null.

use serde::{Deserialize, Deserializer};

use crate::db::DatabaseError;

/// Spanish month names, lowercased, to their two-digit number.
const MONTHS: [(&str, &str); 12] = [
    ("enero", "01"),
    ("febrero", "02"),
    ("marzo", "03"),
    ("abril", "04"),
    ("mayo", "05"),
    ("junio", "06"),
    ("julio", "07"),
    ("agosto", "08"),
    ("septiembre", "09"),
    ("octubre", "10"),
    ("noviembre", "11"),
    ("diciembre", "12"),
];

/// Month used when the name is not in the table.
pub const FALLBACK_MONTH: &str = "01";

/// Two-digit month for a Spanish month name. Matching ignores case and
/// surrounding whitespace; unknown names map to `"01"` instead of failing.
pub fn month_number(name: &str) -> &'static str {
    let wanted = name.trim().to_lowercase();
    MONTHS
        .iter()
        .find(|(month, _)| *month == wanted)
        .map(|(_, number)| *number)
        .unwrap_or_else(|| {
            tracing::debug!(month = name, "unrecognized month name, using {FALLBACK_MONTH}");
            FALLBACK_MONTH
        })
}

/// `YYYY-MM-DD` from separate fields, or `None` if any field is missing.
///
/// The day is zero-padded; the year is used as given. No calendar check is
/// made, so `31 Febrero` produces `YYYY-02-31`.
pub fn assemble_birth_date(
    day: Option<&str>,
    month: Option<&str>,
    year: Option<&str>,
) -> Option<String> {
    let day = present(day)?;
    let month = present(month)?;
    let year = present(year)?;
    Some(format!("{year}-{}-{day:0>2}", month_number(month)))
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accept a JSON string or number for a text field. Form libraries send
/// day/year and phone numbers either way.
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Int(n)) => Some(n.to_string()),
        Some(Raw::Float(f)) => Some(f.to_string()),
    })
}

/// Registration / edit form as sent by the front desk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientPayload {
    #[serde(default, deserialize_with = "text_or_number")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub identification_type: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub identification_number: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub birth_day: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub birth_month: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub birth_year: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub blood_type: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub marital_status: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub education_level: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub occupation: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub mobile_phone: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub eps: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub agreement: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub patient_type: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub observations: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub medical_history: Option<String>,
}

/// Normalized column values for one `patients` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientRecord {
    pub first_name: String,
    pub last_name: String,
    pub identification_type: Option<String>,
    pub identification_number: String,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
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
}

impl PatientPayload {
    /// Validate required fields and map the payload onto storage columns.
    pub fn normalize(self) -> Result<PatientRecord, DatabaseError> {
        let birth_date = assemble_birth_date(
            self.birth_day.as_deref(),
            self.birth_month.as_deref(),
            self.birth_year.as_deref(),
        );

        let first_name = clean(self.first_name);
        let last_name = clean(self.last_name);
        let identification_number = clean(self.identification_number);

        let mut missing = Vec::new();
        if first_name.is_none() {
            missing.push("firstName".to_string());
        }
        if last_name.is_none() {
            missing.push("lastName".to_string());
        }
        if identification_number.is_none() {
            missing.push("identificationNumber".to_string());
        }

        let (Some(first_name), Some(last_name), Some(identification_number)) =
            (first_name, last_name, identification_number)
        else {
            return Err(DatabaseError::MissingFields(missing));
        };

        Ok(PatientRecord {
            first_name,
            last_name,
            identification_type: clean(self.identification_type),
            identification_number,
            gender: clean(self.gender),
            birth_date,
            blood_type: clean(self.blood_type),
            marital_status: clean(self.marital_status),
            education_level: clean(self.education_level),
            occupation: clean(self.occupation),
            address: clean(self.address),
            city: clean(self.city),
            department: clean(self.department),
            phone: clean(self.phone),
            mobile_phone: clean(self.mobile_phone),
            email: clean(self.email),
            eps: clean(self.eps),
            agreement: clean(self.agreement),
            patient_type: clean(self.patient_type),
            observations: clean(self.observations),
            reference: clean(self.reference),
            medical_history: clean(self.medical_history),
        })
    }
}
