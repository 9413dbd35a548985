//! Structure record model.
//!
//! # Responsibility
//! - Define the record shape exposed to request layers.
//! - Define the typed field set accepted by create/update paths.
//!
//! # Invariants
//! - `id` is assigned by the store, never by callers, and never reused.
//! - `notation` is unique across the store (exact string equality).
//! - Updates replace every mutable field; there is no partial patch.

use serde::{Deserialize, Serialize};

/// Store-issued record identifier.
pub type StructureId = i64;

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Persisted structure record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub id: StructureId,
    /// Structural line notation (SMILES).
    pub notation: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Mutable fields of a structure record.
///
/// Used for both inserts and full-replacement updates, so no field outside
/// this list can leak into storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureFields {
    pub notation: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl StructureFields {
    /// Creates fields with only a notation set.
    pub fn new(notation: impl Into<String>) -> Self {
        Self {
            notation: notation.into(),
            name: None,
            description: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Zero-indexed page of an id-ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Number of rows skipped before this page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
