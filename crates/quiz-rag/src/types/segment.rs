//! Segment and collection types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{Error, Result};

/// A chunk of source text prepared for embedding and retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of the segment within its source document
    pub index: usize,
    /// Segment text, verbatim from the extracted document
    pub text: String,
    /// Character offset of the first character in the source text
    pub char_start: usize,
    /// Character offset one past the last character
    pub char_end: usize,
}

impl Segment {
    /// Create a new segment
    pub fn new(index: usize, text: impl Into<String>, char_start: usize, char_end: usize) -> Self {
        Self {
            index,
            text: text.into(),
            char_start,
            char_end,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// A retrieved segment with its similarity to the query
#[derive(Debug, Clone, Serialize)]
pub struct ScoredSegment {
    /// The matched segment
    pub segment: Segment,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

/// Identifier of a persisted collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionId(String);

impl CollectionId {
    const MAX_LEN: usize = 128;

    /// Validate and wrap a caller-supplied identifier
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > Self::MAX_LEN {
            return Err(Error::invalid_input(format!(
                "collection id must be 1..={} characters",
                Self::MAX_LEN
            )));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::invalid_input(format!(
                "collection id '{}' may only contain letters, digits, '-' and '_'",
                id
            )));
        }
        Ok(Self(id))
    }

    /// Derive the collection id of an uploaded file from its bytes
    pub fn from_content(data: &[u8]) -> Self {
        let digest = hex::encode(Sha256::digest(data));
        Self(format!("pdf-{}", &digest[..16]))
    }

    /// Borrow as str
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CollectionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CollectionId> for String {
    fn from(id: CollectionId) -> Self {
        id.0
    }
}

/// Summary of an indexed collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionHandle {
    /// Collection id
    pub id: CollectionId,
    /// Embedding vector length
    pub dimensions: usize,
    /// Number of stored segments
    pub segment_count: usize,
    /// Original filename, when known
    pub source_name: Option<String>,
    /// When the collection was (re)built
    pub indexed_at: DateTime<Utc>,
}
