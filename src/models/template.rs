use serde::{Deserialize, Serialize};

use super::enums::TemplateKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i64,
    pub kind: TemplateKind,
    /// `None` only for consents.
    pub specialty_id: Option<i64>,
    pub name: String,
    pub content: String,
    pub is_default: bool,
    pub created_at: String,
    pub updated_at: String,
}
