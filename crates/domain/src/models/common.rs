//! Query and response shapes shared by the admin listings.

use serde::{Deserialize, Serialize};
use shared::pagination::PageRequest;

/// Standard list query: `?page=&per_page=&search=&is_active=`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }

    /// Search term trimmed, `None` when empty.
    pub fn search_term(&self) -> Option<String> {
        normalize_search(self.search.as_deref())
    }
}

/// Trims a search term and turns blank input into `None`.
pub fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Result of flipping an `is_active` flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToggleStatusResponse {
    pub id: uuid::Uuid,
    pub is_active: bool,
}

/// Lightweight id/code/name triple used in dropdowns and joined views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LookupItem {
    pub id: uuid::Uuid,
    pub code: String,
    pub name: String,
}
