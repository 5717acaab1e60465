//! Clinical document templates and their default selection.
//!
//! A scope is (kind, specialty). Consents have no specialty; evolutions,
//! prescriptions and custom forms always have one. At most one template per
//! scope is the default; switching the default happens in one transaction.
//! Deleting the default leaves the scope without one.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;

use crate::db::DatabaseError;
use crate::directory;
use crate::models::{Template, TemplateKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateScope {
    pub kind: TemplateKind,
    pub specialty_id: Option<i64>,
}

impl TemplateScope {
    pub fn consents() -> Self {
        Self {
            kind: TemplateKind::Consent,
            specialty_id: None,
        }
    }

    pub fn specialty(specialty_id: i64, kind: TemplateKind) -> Result<Self, DatabaseError> {
        if kind.is_global() {
            return Err(DatabaseError::invalid(
                "templateType",
                format!("{kind} templates are not scoped to a specialty"),
            ));
        }
        Ok(Self {
            kind,
            specialty_id: Some(specialty_id),
        })
    }

    /// Fail with NotFound when the scope names a specialty that does not exist.
    fn ensure_exists(&self, conn: &Connection) -> Result<(), DatabaseError> {
        if let Some(id) = self.specialty_id {
            directory::get_specialty(conn, id)?;
        }
        Ok(())
    }
}

/// Create / edit body. On edit, absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInput {
    pub name: Option<String>,
    pub content: Option<String>,
    pub is_default: Option<bool>,
}

const TEMPLATE_COLUMNS: &str =
    "id, kind, specialty_id, name, content, is_default, created_at, updated_at";

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get(0)?,
        kind: row.get(1)?,
        specialty_id: row.get(2)?,
        name: row.get(3)?,
        content: row.get(4)?,
        is_default: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn clean_name(name: &Option<String>) -> Option<&str> {
    name.as_deref().map(str::trim).filter(|n| !n.is_empty())
}

/// Clear the default flag on every template in the scope except `keep`.
fn clear_defaults(
    conn: &Connection,
    scope: &TemplateScope,
    keep: Option<i64>,
) -> Result<usize, DatabaseError> {
    let cleared = conn.execute(
        "UPDATE templates SET is_default = 0, updated_at = datetime('now')
         WHERE kind = ?1 AND specialty_id IS ?2 AND is_default = 1
           AND (?3 IS NULL OR id != ?3)",
        params![scope.kind, scope.specialty_id, keep],
    )?;
    Ok(cleared)
}

/// Templates in the scope, default first, then by name.
pub fn list_templates(
    conn: &Connection,
    scope: &TemplateScope,
) -> Result<Vec<Template>, DatabaseError> {
    scope.ensure_exists(conn)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {TEMPLATE_COLUMNS} FROM templates
         WHERE kind = ?1 AND specialty_id IS ?2
         ORDER BY is_default DESC, name, id"
    ))?;
    let rows = stmt.query_map(params![scope.kind, scope.specialty_id], template_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn get_template(
    conn: &Connection,
    scope: &TemplateScope,
    id: i64,
) -> Result<Template, DatabaseError> {
    conn.query_row(
        &format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates
             WHERE id = ?1 AND kind = ?2 AND specialty_id IS ?3"
        ),
        params![id, scope.kind, scope.specialty_id],
        template_from_row,
    )
    .optional()?
    .ok_or_else(|| DatabaseError::not_found("Template", id))
}

/// The scope's default template, if one is set.
pub fn get_default_template(
    conn: &Connection,
    scope: &TemplateScope,
) -> Result<Option<Template>, DatabaseError> {
    scope.ensure_exists(conn)?;
    conn.query_row(
        &format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates
             WHERE kind = ?1 AND specialty_id IS ?2 AND is_default = 1"
        ),
        params![scope.kind, scope.specialty_id],
        template_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn create_template(
    conn: &Connection,
    scope: &TemplateScope,
    input: &TemplateInput,
) -> Result<Template, DatabaseError> {
    let name = clean_name(&input.name)
        .ok_or_else(|| DatabaseError::MissingFields(vec!["name".into()]))?;
    scope.ensure_exists(conn)?;

    let is_default = input.is_default.unwrap_or(false);
    let tx = conn.unchecked_transaction()?;
    if is_default {
        clear_defaults(&tx, scope, None)?;
    }
    tx.execute(
        "INSERT INTO templates (kind, specialty_id, name, content, is_default)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            scope.kind,
            scope.specialty_id,
            name,
            input.content.as_deref().unwrap_or(""),
            is_default,
        ],
    )
    .map_err(|e| DatabaseError::from_write(e, "specialty"))?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    tracing::info!(template_id = id, kind = %scope.kind, is_default, "template created");
    get_template(conn, scope, id)
}

pub fn update_template(
    conn: &Connection,
    scope: &TemplateScope,
    id: i64,
    input: &TemplateInput,
) -> Result<Template, DatabaseError> {
    if input.name.is_some() && clean_name(&input.name).is_none() {
        return Err(DatabaseError::invalid("name", "must not be empty"));
    }
    let current = get_template(conn, scope, id)?;

    let tx = conn.unchecked_transaction()?;
    if input.is_default == Some(true) {
        let cleared = clear_defaults(&tx, scope, Some(id))?;
        if cleared > 0 {
            tracing::debug!(template_id = id, cleared, "previous default cleared");
        }
    }
    tx.execute(
        "UPDATE templates SET name = ?1, content = ?2, is_default = ?3,
         updated_at = datetime('now')
         WHERE id = ?4",
        params![
            clean_name(&input.name).unwrap_or(&current.name),
            input.content.as_deref().unwrap_or(&current.content),
            input.is_default.unwrap_or(current.is_default),
            id,
        ],
    )?;
    tx.commit()?;

    tracing::info!(template_id = id, kind = %scope.kind, "template updated");
    get_template(conn, scope, id)
}

/// Delete one template. No other template is promoted to default.
pub fn delete_template(
    conn: &Connection,
    scope: &TemplateScope,
    id: i64,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM templates WHERE id = ?1 AND kind = ?2 AND specialty_id IS ?3",
        params![id, scope.kind, scope.specialty_id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Template", id));
    }
    tracing::info!(template_id = id, kind = %scope.kind, "template deleted");
    Ok(())
}
