//! Core domain logic for the molstore structure registry.
//! This crate is the single source of truth for business invariants.

pub mod chem;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use chem::{
    Molecule, NotationError, NotationErrorReason, SmilesParser, StructuralHandle, StructureParser,
};
pub use config::{ConfigError, CoreConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::structure::{
    PageRequest, StructureFields, StructureId, StructureRecord, DEFAULT_PAGE_SIZE,
};
pub use repo::structure_repo::{
    RepoError, RepoResult, SqliteStructureRepository, StructureFilter, StructureRepository,
};
pub use service::import::{ImportReport, ImportedRow, RowOutcome, SkipReason, REQUIRED_COLUMNS};
pub use service::structure_service::{
    ErrorClass, ServiceResult, StructureService, StructureServiceError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
