//! Domain model for stored chemical structures.
//!
//! # Invariants
//! - Every record is identified by a store-issued `StructureId`.
//! - Records are flat: no relationships, no cascading deletes.

pub mod structure;
