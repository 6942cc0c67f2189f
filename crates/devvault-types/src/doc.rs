// ABOUTME: Offline documentation data types
// ABOUTME: Documentation set identifiers and single documentation pages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an installed documentation set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(pub i64);

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single documentation page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocEntry {
    pub id: i64,
    pub doc_id: DocId,
    pub path: String,
    pub title: String,
    pub content: String,
    pub entry_type: Option<String>,
    pub parent_path: Option<String>,
    pub created_at: i64,
}
