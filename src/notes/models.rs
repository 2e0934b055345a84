//! Note data models.
//!
//! A [`NoteRecord`] is one item of content handed over by a note source. A
//! batch of records is paired with its [`IdTitleMap`] in a [`NoteBatch`], the
//! unit every graph builder is constructed from.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// NoteRecord
// ============================================================================

/// A single note with its explicit child links.
///
/// `children` holds note ids in source order. They may reference notes that
/// are not part of the batch; builders tolerate such dangling links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub children: Vec<String>,
}

impl NoteRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Text handed to the embedding model: title and summary, no separator.
    pub fn embedding_text(&self) -> String {
        format!("{}{}", self.title, self.summary)
    }
}

// ============================================================================
// IdTitleMap
// ============================================================================

/// Lookup from note id to title, used to translate graphs from id-space into
/// human-readable label-space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdTitleMap(HashMap<String, String>);

impl IdTitleMap {
    /// Build the lookup from a batch. A repeated id keeps the last title seen.
    pub fn from_notes(notes: &[NoteRecord]) -> Self {
        Self(
            notes
                .iter()
                .map(|n| (n.id.clone(), n.title.clone()))
                .collect(),
        )
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for IdTitleMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ============================================================================
// NoteBatch
// ============================================================================

/// A batch of notes together with its id → title lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteBatch {
    pub notes: Vec<NoteRecord>,
    pub id_to_title: IdTitleMap,
}

impl NoteBatch {
    /// Wrap a list of notes, deriving the id → title lookup once.
    pub fn new(notes: Vec<NoteRecord>) -> Self {
        let id_to_title = IdTitleMap::from_notes(&notes);
        Self { notes, id_to_title }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
