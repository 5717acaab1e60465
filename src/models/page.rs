use serde::Serialize;

use crate::config::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::db::DatabaseError;

/// Resolved page window. `limit` is always within `1..=MAX_PAGE_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Apply defaults and the upper bound. Zero or negative values are
    /// rejected rather than silently corrected, as is a page whose row
    /// offset does not fit in an `i64`.
    pub fn resolve(page: Option<i64>, limit: Option<i64>) -> Result<Self, DatabaseError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(DatabaseError::invalid("page", "must be 1 or greater"));
        }
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit < 1 {
            return Err(DatabaseError::invalid("limit", "must be 1 or greater"));
        }
        let limit = limit.min(MAX_PAGE_LIMIT);
        if (page - 1).checked_mul(limit).is_none() {
            return Err(DatabaseError::invalid("page", "is too large"));
        }
        Ok(Self { page, limit })
    }

    /// Same as `resolve`, for raw query-string values. An empty parameter
    /// (`page=`) counts as absent.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Result<Self, DatabaseError> {
        fn number(field: &str, raw: Option<&str>) -> Result<Option<i64>, DatabaseError> {
            raw.map(str::trim)
                .filter(|r| !r.is_empty())
                .map(|r| {
                    r.parse::<i64>().map_err(|_| {
                        DatabaseError::invalid(field, format!("expected a number, got {r:?}"))
                    })
                })
                .transpose()
        }
        Self::resolve(number("page", page)?, number("limit", limit)?)
    }

    /// Rows to skip. Saturates for hand-built requests that skipped `resolve`.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn describe(&self, total: i64) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: (total + self.limit - 1) / self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}
