//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and structural matching into use-case
//!   level APIs.
//! - Keep request layers decoupled from storage details.

pub mod import;
pub mod structure_service;
