use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The wire and column representation is the literal string.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: DatabaseError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

str_enum!(AppointmentType {
    Consulta => "CONSULTA",
    Control => "CONTROL",
    PrimeraVez => "PRIMERA VEZ",
    Emergencia => "EMERGENCIA",
});

str_enum!(AppointmentStatus {
    Programada => "PROGRAMADA",
    Confirmada => "CONFIRMADA",
    EnProgreso => "EN_PROGRESO",
    Completada => "COMPLETADA",
    Cancelada => "CANCELADA",
    NoAsistio => "NO_ASISTIO",
});

str_enum!(TemplateKind {
    Consent => "consent",
    Evolution => "evolution",
    Prescription => "prescription",
    CustomForm => "custom_form",
});

str_enum!(AppointmentSortField {
    AppointmentDate => "appointmentDate",
    AppointmentTime => "appointmentTime",
    Status => "status",
    Type => "type",
    PatientName => "patientName",
    DoctorName => "doctorName",
    CreatedAt => "createdAt",
});

str_enum!(SortOrder {
    Asc => "asc",
    Desc => "desc",
});

impl AppointmentStatus {
    /// Statuses after which the visit is over, one way or another.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Completada | Self::Cancelada | Self::NoAsistio)
    }
}

impl TemplateKind {
    /// Consents are office-wide; every other kind belongs to a specialty.
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Consent)
    }

    /// Plural URL segment used under `/specialties/:id/templates/`.
    pub fn from_path_segment(segment: &str) -> Result<Self, DatabaseError> {
        match segment {
            "evolutions" => Ok(Self::Evolution),
            "prescriptions" => Ok(Self::Prescription),
            "custom-forms" => Ok(Self::CustomForm),
            _ => Err(DatabaseError::InvalidEnum {
                field: "templateType".into(),
                value: segment.into(),
            }),
        }
    }
}

impl AppointmentSortField {
    /// ORDER BY terms for this field; every term takes the same direction.
    pub fn sql_terms(&self) -> &'static [&'static str] {
        match self {
            Self::AppointmentDate => &["a.appointment_date", "a.appointment_time"],
            Self::AppointmentTime => &["a.appointment_time", "a.appointment_date"],
            Self::Status => &["a.status"],
            Self::Type => &["a.type"],
            Self::PatientName => &["patient_name"],
            Self::DoctorName => &["doctor_name"],
            Self::CreatedAt => &["a.created_at"],
        }
    }
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}
