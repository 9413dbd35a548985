//! Structure use-case service.
//!
//! # Responsibility
//! - Enforce notation validity and uniqueness before persistence.
//! - Compose full-store scans with the structural matcher for
//!   substructure and container searches.
//!
//! # Invariants
//! - Every operation runs inside exactly one repository unit of work.
//! - Notation syntax is validated here, so an invalid notation never
//!   reaches the store whichever caller submits it.
//! - Uniqueness is exact string equality, not structural equivalence.
//! - Search results follow store order (ascending id); containment is a
//!   boolean filter with no ranking.

use crate::chem::{NotationError, SmilesParser, StructuralHandle, StructureParser};
use crate::model::structure::{PageRequest, StructureFields, StructureId, StructureRecord};
use crate::repo::structure_repo::{RepoError, StructureFilter, StructureRepository};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, StructureServiceError>;

/// Service error for structure use-cases.
#[derive(Debug)]
pub enum StructureServiceError {
    /// Notation rejected by the structural parser.
    InvalidNotation {
        notation: String,
        source: NotationError,
    },
    /// Another record already carries this exact notation.
    DuplicateNotation(String),
    /// No record has this id.
    UnknownIdentifier(StructureId),
    /// Import header lacks required columns (sorted, as listed).
    InvalidHeaderColumns(Vec<String>),
    /// Import bytes are not UTF-8.
    InvalidEncoding(String),
    /// Import input could not be read as delimited text.
    MalformedCsv(String),
    /// A stored notation no longer parses.
    CorruptRecord {
        id: StructureId,
        notation: String,
        source: NotationError,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

/// Coarse failure class for request-layer status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Conflict,
    InvalidInput,
    Internal,
}

impl StructureServiceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownIdentifier(_) => ErrorClass::NotFound,
            Self::DuplicateNotation(_) => ErrorClass::Conflict,
            Self::InvalidNotation { .. }
            | Self::InvalidHeaderColumns(_)
            | Self::InvalidEncoding(_)
            | Self::MalformedCsv(_) => ErrorClass::InvalidInput,
            Self::CorruptRecord { .. } | Self::Repo(_) => ErrorClass::Internal,
        }
    }
}

impl Display for StructureServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNotation { notation, source } => {
                write!(f, "invalid notation `{notation}`: {source}")
            }
            Self::DuplicateNotation(notation) => {
                write!(f, "structure with notation `{notation}` already exists")
            }
            Self::UnknownIdentifier(id) => write!(f, "structure not found: {id}"),
            Self::InvalidHeaderColumns(missing) => {
                write!(f, "missing required columns: {}", missing.join(", "))
            }
            Self::InvalidEncoding(message) => write!(f, "import is not valid UTF-8: {message}"),
            Self::MalformedCsv(message) => write!(f, "malformed CSV input: {message}"),
            Self::CorruptRecord {
                id,
                notation,
                source,
            } => write!(f, "stored structure {id} has unparsable notation `{notation}`: {source}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StructureServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidNotation { source, .. } | Self::CorruptRecord { source, .. } => {
                Some(source)
            }
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StructureServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UniqueViolation(notation) => Self::DuplicateNotation(notation),
            other => Self::Repo(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchDirection {
    /// Stored structures contained in the query.
    Substructures,
    /// Stored structures containing the query.
    Containers,
}

impl MatchDirection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Substructures => "substructures",
            Self::Containers => "containers",
        }
    }
}

/// Structure service facade over a repository and a structural parser.
pub struct StructureService<R: StructureRepository, P: StructureParser = SmilesParser> {
    repo: R,
    parser: P,
}

impl<R: StructureRepository> StructureService<R> {
    /// Creates a service that reads SMILES notation.
    pub fn new(repo: R) -> Self {
        Self::with_parser(repo, SmilesParser)
    }
}

impl<R: StructureRepository, P: StructureParser> StructureService<R, P> {
    pub fn with_parser(repo: R, parser: P) -> Self {
        Self { repo, parser }
    }

    /// Gets one record by id.
    pub fn find_by_id(&self, id: StructureId) -> ServiceResult<StructureRecord> {
        self.repo.unit_of_work(|repo| {
            repo.find_by_id(id)?
                .ok_or(StructureServiceError::UnknownIdentifier(id))
        })
    }

    /// Creates a record after syntax and uniqueness checks.
    pub fn create(&self, fields: StructureFields) -> ServiceResult<StructureRecord> {
        self.parse_notation(&fields.notation)?;

        self.repo.unit_of_work(|repo| {
            let same_notation = repo.filter(&StructureFilter::by_notation(fields.notation.as_str()))?;
            if !same_notation.is_empty() {
                return Err(StructureServiceError::DuplicateNotation(fields.notation.clone()));
            }
            Ok(repo.insert(&fields)?)
        })
    }

    /// Replaces all mutable fields of an existing record.
    ///
    /// An unknown id is reported before an invalid or duplicate notation.
    pub fn update(
        &self,
        id: StructureId,
        fields: StructureFields,
    ) -> ServiceResult<StructureRecord> {
        self.repo.unit_of_work(|repo| {
            if repo.find_by_id(id)?.is_none() {
                return Err(StructureServiceError::UnknownIdentifier(id));
            }
            self.parse_notation(&fields.notation)?;

            let same_notation = repo.filter(&StructureFilter::by_notation(fields.notation.as_str()))?;
            if same_notation.iter().any(|record| record.id != id) {
                return Err(StructureServiceError::DuplicateNotation(fields.notation.clone()));
            }

            repo.update(id, &fields)?
                .ok_or(StructureServiceError::UnknownIdentifier(id))
        })
    }

    /// Lists one page of records in insertion order.
    pub fn find_all(&self, page: PageRequest) -> ServiceResult<Vec<StructureRecord>> {
        Ok(self.repo.unit_of_work(|repo| repo.find_all(Some(page)))?)
    }

    /// Returns the number of stored records.
    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo.unit_of_work(|repo| repo.count())?)
    }

    /// Deletes a record by id.
    pub fn delete(&self, id: StructureId) -> ServiceResult<()> {
        self.repo.unit_of_work(|repo| {
            if repo.delete(id)? {
                Ok(())
            } else {
                Err(StructureServiceError::UnknownIdentifier(id))
            }
        })
    }

    /// Returns every stored record whose structure is contained in `notation`.
    pub fn find_substructure_matches(&self, notation: &str) -> ServiceResult<Vec<StructureRecord>> {
        self.scan_matches(notation, MatchDirection::Substructures)
    }

    /// Returns every stored record whose structure contains `notation`.
    pub fn find_container_matches(&self, notation: &str) -> ServiceResult<Vec<StructureRecord>> {
        self.scan_matches(notation, MatchDirection::Containers)
    }

    fn scan_matches(
        &self,
        notation: &str,
        direction: MatchDirection,
    ) -> ServiceResult<Vec<StructureRecord>> {
        let query = self.parse_notation(notation)?;
        let started_at = Instant::now();

        let records = self.repo.unit_of_work(|repo| repo.find_all(None))?;
        let scanned = records.len();
        let mut matches = Vec::new();
        for record in records {
            let stored = self.parser.parse(&record.notation).map_err(|source| {
                StructureServiceError::CorruptRecord {
                    id: record.id,
                    notation: record.notation.clone(),
                    source,
                }
            })?;
            let is_match = match direction {
                MatchDirection::Substructures => query.contains(&stored),
                MatchDirection::Containers => stored.contains(&query),
            };
            if is_match {
                matches.push(record);
            }
        }

        info!(
            "event=structure_search module=service status=ok direction={} scanned={} matched={} duration_ms={}",
            direction.as_str(),
            scanned,
            matches.len(),
            started_at.elapsed().as_millis()
        );
        Ok(matches)
    }

    fn parse_notation(&self, notation: &str) -> ServiceResult<P::Handle> {
        self.parser
            .parse(notation)
            .map_err(|source| StructureServiceError::InvalidNotation {
                notation: notation.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorClass, StructureServiceError};
    use crate::repo::structure_repo::RepoError;

    #[test]
    fn unique_violation_maps_to_duplicate_notation() {
        let err = StructureServiceError::from(RepoError::UniqueViolation("CCO".to_string()));
        assert!(matches!(err, StructureServiceError::DuplicateNotation(ref n) if n == "CCO"));
        assert_eq!(err.class(), ErrorClass::Conflict);
    }

    #[test]
    fn error_classes_separate_not_found_from_conflict() {
        assert_eq!(
            StructureServiceError::UnknownIdentifier(4).class(),
            ErrorClass::NotFound
        );
        assert_eq!(
            StructureServiceError::InvalidHeaderColumns(vec!["name".to_string()]).class(),
            ErrorClass::InvalidInput
        );
        assert_eq!(
            StructureServiceError::Repo(RepoError::InvalidData("x".to_string())).class(),
            ErrorClass::Internal
        );
    }
}
