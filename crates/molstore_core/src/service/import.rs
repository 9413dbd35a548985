//! CSV batch ingestion.
//!
//! # Responsibility
//! - Validate the header shape before touching any row.
//! - Feed each data row through `StructureService::create` in isolation.
//!
//! # Invariants
//! - Header problems abort the whole import; row problems never do.
//! - Every row runs in its own unit of work, so a failed row never rolls
//!   back an earlier one.
//! - Rows are processed strictly in file order.

use crate::chem::StructureParser;
use crate::model::structure::{StructureFields, StructureRecord};
use crate::repo::structure_repo::StructureRepository;
use crate::service::structure_service::{ServiceResult, StructureService, StructureServiceError};
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use serde::Serialize;
use std::time::Instant;

/// Columns every import header must carry (case-sensitive).
pub const REQUIRED_COLUMNS: &[&str] = &["notation", "name"];
/// Column read when present.
pub const DESCRIPTION_COLUMN: &str = "description";

/// Why a data row was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidNotation(String),
    DuplicateNotation(String),
    MalformedRow(String),
    Store(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Imported { record: StructureRecord },
    Skipped { skip: SkipReason },
}

/// Outcome of one data row. `line` is 1-based and excludes the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedRow {
    pub line: usize,
    pub outcome: RowOutcome,
}

/// Per-row report of one import call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub rows: Vec<ImportedRow>,
}

impl ImportReport {
    pub fn imported_count(&self) -> usize {
        self.imported().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.rows.len() - self.imported_count()
    }

    /// Records created by this import, in file order.
    pub fn imported(&self) -> impl Iterator<Item = &StructureRecord> {
        self.rows.iter().filter_map(|row| match &row.outcome {
            RowOutcome::Imported { record } => Some(record),
            RowOutcome::Skipped { .. } => None,
        })
    }
}

struct ColumnIndex {
    notation: usize,
    name: usize,
    description: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> ServiceResult<Self> {
        let position = |column: &str| headers.iter().position(|header| header == column);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| position(**column).is_none())
            .map(|column| column.to_string())
            .collect();

        match (position("notation"), position("name")) {
            (Some(notation), Some(name)) if missing.is_empty() => Ok(Self {
                notation,
                name,
                description: position(DESCRIPTION_COLUMN),
            }),
            _ => Err(StructureServiceError::InvalidHeaderColumns(missing)),
        }
    }

    fn fields(&self, record: &StringRecord) -> Result<StructureFields, SkipReason> {
        let notation = record
            .get(self.notation)
            .ok_or_else(|| SkipReason::MalformedRow("missing notation cell".to_string()))?;
        Ok(StructureFields {
            notation: notation.to_string(),
            name: non_empty_cell(record, Some(self.name)),
            description: non_empty_cell(record, self.description),
        })
    }
}

impl<R: StructureRepository, P: StructureParser> StructureService<R, P> {
    /// Imports CSV bytes and returns how many rows were created.
    ///
    /// # Errors
    /// - `InvalidEncoding` when `bytes` are not UTF-8.
    /// - `InvalidHeaderColumns` when a required column is missing.
    pub fn import_csv(&self, bytes: &[u8]) -> ServiceResult<usize> {
        Ok(self.import_csv_report(bytes)?.imported_count())
    }

    /// Imports CSV bytes and returns the outcome of every data row.
    pub fn import_csv_report(&self, bytes: &[u8]) -> ServiceResult<ImportReport> {
        let started_at = Instant::now();
        let text = std::str::from_utf8(bytes)
            .map_err(|err| StructureServiceError::InvalidEncoding(err.to_string()))?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = reader
            .headers()
            .map_err(|err| StructureServiceError::MalformedCsv(err.to_string()))?
            .clone();
        let columns = ColumnIndex::from_headers(&headers)?;

        let mut report = ImportReport::default();
        for (index, result) in reader.records().enumerate() {
            let line = index + 1;
            let outcome = match result {
                Ok(record) => self.import_row(&columns, &record),
                Err(err) => RowOutcome::Skipped {
                    skip: SkipReason::MalformedRow(err.to_string()),
                },
            };
            if let RowOutcome::Skipped { skip } = &outcome {
                warn!(
                    "event=structure_import_row module=service status=skipped line={} reason={}",
                    line,
                    skip_code(skip)
                );
            }
            report.rows.push(ImportedRow { line, outcome });
        }

        info!(
            "event=structure_import module=service status=ok rows={} imported={} skipped={} duration_ms={}",
            report.rows.len(),
            report.imported_count(),
            report.skipped_count(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn import_row(&self, columns: &ColumnIndex, record: &StringRecord) -> RowOutcome {
        let fields = match columns.fields(record) {
            Ok(fields) => fields,
            Err(skip) => return RowOutcome::Skipped { skip },
        };

        match self.create(fields) {
            Ok(record) => RowOutcome::Imported { record },
            Err(err) => {
                let skip = match err {
                    StructureServiceError::InvalidNotation { .. } => {
                        SkipReason::InvalidNotation(err.to_string())
                    }
                    StructureServiceError::DuplicateNotation(notation) => {
                        SkipReason::DuplicateNotation(notation)
                    }
                    other => SkipReason::Store(other.to_string()),
                };
                RowOutcome::Skipped { skip }
            }
        }
    }
}

fn non_empty_cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|index| record.get(index))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn skip_code(skip: &SkipReason) -> &'static str {
    match skip {
        SkipReason::InvalidNotation(_) => "invalid_notation",
        SkipReason::DuplicateNotation(_) => "duplicate_notation",
        SkipReason::MalformedRow(_) => "malformed_row",
        SkipReason::Store(_) => "store",
    }
}
