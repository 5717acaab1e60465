use serde::Serialize;

/// Staff account as exposed to the API. Credentials never leave the `auth` module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffUser {
    pub id: i64,
    pub username: String,
    pub display_name: String,
}
