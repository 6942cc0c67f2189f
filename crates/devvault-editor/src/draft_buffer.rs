// ABOUTME: Editable item fields plus the snapshot they were last saved as
// ABOUTME: Dirtiness, title validation and request building for the repository

use devvault_types::{
    CreateItemRequest, Item, ItemId, ItemType, UpdateItemRequest, parse_tags,
};

use crate::error::ValidationError;

/// The fields a user edits
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraftFields {
    pub title: String,
    pub description: String,
    pub content: String,
    /// Comma separated tag text as typed
    pub tags: String,
    pub item_type: ItemType,
}

impl DraftFields {
    pub fn empty(item_type: ItemType) -> Self {
        Self {
            item_type,
            ..Default::default()
        }
    }

    pub fn from_item(item: &Item) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone().unwrap_or_default(),
            content: item.content.clone(),
            tags: item.tags_text(),
            item_type: item.item_type,
        }
    }

    /// Copy with the title trimmed, the form snapshots are stored in
    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            ..self.clone()
        }
    }

    pub fn tag_names(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            Err(ValidationError::EmptyTitle)
        } else {
            Ok(())
        }
    }

    pub fn to_create_request(&self) -> CreateItemRequest {
        let description = self.description.trim();
        CreateItemRequest {
            item_type: self.item_type,
            title: self.title.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            content: self.content.clone(),
            tag_names: self.tag_names(),
        }
    }

    /// Full update of the editable fields; the type is only sent when it changed
    pub fn to_update_request(&self, id: ItemId, saved: &DraftFields) -> UpdateItemRequest {
        UpdateItemRequest {
            id,
            item_type: (self.item_type != saved.item_type).then_some(self.item_type),
            title: Some(self.title.trim().to_string()),
            description: Some(self.description.clone()),
            content: Some(self.content.clone()),
            tag_names: Some(self.tag_names()),
        }
    }
}

/// Working copy of an item's fields and the last persisted snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftBuffer {
    current: DraftFields,
    last_saved: DraftFields,
    title_error: Option<ValidationError>,
    title_before_edit: Option<String>,
}

impl DraftBuffer {
    pub fn for_item(item: &Item) -> Self {
        let fields = DraftFields::from_item(item);
        Self {
            current: fields.clone(),
            last_saved: fields.normalized(),
            title_error: None,
            title_before_edit: None,
        }
    }

    pub fn for_draft(item_type: ItemType) -> Self {
        let fields = DraftFields::empty(item_type);
        Self {
            current: fields.clone(),
            last_saved: fields,
            title_error: None,
            title_before_edit: None,
        }
    }

    pub fn fields(&self) -> &DraftFields {
        &self.current
    }

    pub fn last_saved(&self) -> &DraftFields {
        &self.last_saved
    }

    pub fn title_error(&self) -> Option<&ValidationError> {
        self.title_error.as_ref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.current.title = title.into();
        self.title_error = self.current.validate().err();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.current.description = description.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.current.content = content.into();
    }

    pub fn set_tags(&mut self, tags: impl Into<String>) {
        self.current.tags = tags.into();
    }

    pub fn set_item_type(&mut self, item_type: ItemType) {
        self.current.item_type = item_type;
    }

    /// Check the fields before a write, recording the title error on failure
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        let result = self.current.validate();
        self.title_error = result.clone().err();
        result
    }

    /// Buffer (with trimmed title) differs from the snapshot
    pub fn has_changes(&self) -> bool {
        self.current.normalized() != self.last_saved
    }

    /// Fields may be written: a non-blank title and no outstanding title error
    pub fn can_save(&self) -> bool {
        self.title_error.is_none() && self.current.validate().is_ok()
    }

    /// Record `sent` as what storage now holds
    pub fn mark_saved(&mut self, sent: &DraftFields) {
        self.last_saved = sent.normalized();
    }

    pub fn focus_title(&mut self) {
        self.title_before_edit = Some(self.current.title.clone());
    }

    /// Leave the title field.
    ///
    /// A bound item cannot keep a blank title: it reverts to the value it had
    /// when the field gained focus and the error clears. Returns true on revert.
    pub fn blur_title(&mut self, is_bound: bool) -> bool {
        let before = self.title_before_edit.take();
        if !is_bound || !self.current.title.trim().is_empty() {
            return false;
        }

        self.current.title = before.unwrap_or_else(|| self.last_saved.title.clone());
        self.title_error = None;
        true
    }
}
