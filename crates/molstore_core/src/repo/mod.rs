//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record-store contract used by the structure service.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Absence is `Ok(None)` / `Ok(false)`, never an error.
//! - Store-level uniqueness failures surface as `RepoError::UniqueViolation`.

pub mod structure_repo;
