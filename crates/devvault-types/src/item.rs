// ABOUTME: Content item data types shared between the editor and the item repository
// ABOUTME: Request payloads for create/update plus tag text parsing helpers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a persisted item
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of content an item holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ItemType {
    #[default]
    Snippet,
    Config,
    Note,
    Link,
    Documentation,
}

impl ItemType {
    /// Types a user can pick when creating content
    pub const EDITABLE: [ItemType; 4] = [
        ItemType::Snippet,
        ItemType::Note,
        ItemType::Config,
        ItemType::Link,
    ];

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ItemType::Snippet => "Snippet",
            ItemType::Config => "Config",
            ItemType::Note => "Note",
            ItemType::Link => "Link",
            ItemType::Documentation => "Documentation",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Snippet => "snippet",
            ItemType::Config => "config",
            ItemType::Note => "note",
            ItemType::Link => "link",
            ItemType::Documentation => "documentation",
        }
    }

    /// Imported documentation is shown but never written back
    pub fn is_read_only(&self) -> bool {
        matches!(self, ItemType::Documentation)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A persisted content item with its tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Item {
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    /// Tags rendered the way the editor shows them: `a, b, c`
    pub fn tags_text(&self) -> String {
        self.tags
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Payload for creating an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub tag_names: Vec<String>,
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub item_type: Option<ItemType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub tag_names: Option<Vec<String>>,
}

impl UpdateItemRequest {
    /// An update touching nothing but the id
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// Split comma separated tag text into trimmed, non-empty names
pub fn parse_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_tags(names: &[&str]) -> Item {
        Item {
            id: ItemId(1),
            item_type: ItemType::Note,
            title: "Title".to_string(),
            description: None,
            content: String::new(),
            tags: names
                .iter()
                .enumerate()
                .map(|(i, name)| Tag {
                    id: i as i64,
                    name: name.to_string(),
                })
                .collect(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("rust, async ,,  tokio "), vec!["rust", "async", "tokio"]);
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ,").is_empty());
    }

    #[test]
    fn test_tags_text_round_trips_through_parse() {
        let item = item_with_tags(&["cli", "shell"]);
        assert_eq!(item.tags_text(), "cli, shell");
        assert_eq!(parse_tags(&item.tags_text()), item.tag_names());
    }

    #[test]
    fn test_item_type_serialization() {
        let json = serde_json::to_string(&ItemType::Documentation).unwrap();
        assert_eq!(json, "\"documentation\"");

        let parsed: ItemType = serde_json::from_str("\"link\"").unwrap();
        assert_eq!(parsed, ItemType::Link);
    }

    #[test]
    fn test_read_only_types() {
        assert!(ItemType::Documentation.is_read_only());
        for item_type in ItemType::EDITABLE {
            assert!(!item_type.is_read_only());
        }
    }

    #[test]
    fn test_item_wire_names() {
        let item = item_with_tags(&[]);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "note");
        assert!(value.get("createdAt").is_some());
    }
}
