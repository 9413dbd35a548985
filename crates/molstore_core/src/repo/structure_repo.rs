//! Structure repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed CRUD, exact-field filtering and id-ordered scans over
//!   the `structures` table.
//! - Provide a scoped unit of work for check-then-mutate sequences.
//!
//! # Invariants
//! - Ids come from `AUTOINCREMENT` and are never reused.
//! - Scans are ordered by `id ASC`, which is insertion order.
//! - A unit of work commits only when its closure returns `Ok`.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::structure::{PageRequest, StructureFields, StructureId, StructureRecord};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const STRUCTURE_SELECT_SQL: &str = "SELECT
    id,
    notation,
    name,
    description
FROM structures";

const REQUIRED_COLUMNS: &[&str] = &["id", "notation", "name", "description", "updated_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for structure persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Store-level unique constraint rejected the given notation.
    UniqueViolation(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UniqueViolation(notation) => {
                write!(f, "notation `{notation}` violates the unique constraint")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted structure data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Exact-match filter over record fields. Unset fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureFilter {
    pub notation: Option<String>,
    pub name: Option<String>,
}

impl StructureFilter {
    pub fn by_notation(notation: impl Into<String>) -> Self {
        Self {
            notation: Some(notation.into()),
            ..Self::default()
        }
    }
}

/// Record-store contract for structure records.
pub trait StructureRepository {
    fn find_by_id(&self, id: StructureId) -> RepoResult<Option<StructureRecord>>;
    fn filter(&self, filter: &StructureFilter) -> RepoResult<Vec<StructureRecord>>;
    /// Returns one page, or every record when `page` is `None`.
    fn find_all(&self, page: Option<PageRequest>) -> RepoResult<Vec<StructureRecord>>;
    fn count(&self) -> RepoResult<u64>;
    fn insert(&self, fields: &StructureFields) -> RepoResult<StructureRecord>;
    /// Replaces all mutable fields. Returns `None` when `id` is absent.
    fn update(
        &self,
        id: StructureId,
        fields: &StructureFields,
    ) -> RepoResult<Option<StructureRecord>>;
    /// Returns whether a record existed and was removed.
    fn delete(&self, id: StructureId) -> RepoResult<bool>;

    /// Runs `work` as one unit of work against this store.
    ///
    /// Units of work do not nest.
    fn unit_of_work<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>;
}

/// SQLite-backed structure repository.
pub struct SqliteStructureRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStructureRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not carry the `structures` shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let columns = table_columns(conn, "structures")?;
        if columns.is_empty() {
            return Err(RepoError::MissingRequiredTable("structures"));
        }
        for column in REQUIRED_COLUMNS {
            if !columns.iter().any(|name| name == column) {
                return Err(RepoError::MissingRequiredColumn {
                    table: "structures",
                    column,
                });
            }
        }

        Ok(Self { conn })
    }

    fn query_records(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<StructureRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_structure_row(row)?);
        }
        Ok(records)
    }
}

impl StructureRepository for SqliteStructureRepository<'_> {
    fn find_by_id(&self, id: StructureId) -> RepoResult<Option<StructureRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STRUCTURE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_structure_row(row)?));
        }
        Ok(None)
    }

    fn filter(&self, filter: &StructureFilter) -> RepoResult<Vec<StructureRecord>> {
        let mut sql = format!("{STRUCTURE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(notation) = filter.notation.as_ref() {
            sql.push_str(" AND notation = ?");
            bind_values.push(Value::Text(notation.clone()));
        }
        if let Some(name) = filter.name.as_ref() {
            sql.push_str(" AND name = ?");
            bind_values.push(Value::Text(name.clone()));
        }
        sql.push_str(" ORDER BY id ASC");

        self.query_records(&sql, bind_values)
    }

    fn find_all(&self, page: Option<PageRequest>) -> RepoResult<Vec<StructureRecord>> {
        let mut sql = format!("{STRUCTURE_SELECT_SQL} ORDER BY id ASC");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(page) = page {
            sql.push_str(" LIMIT ? OFFSET ?");
            bind_values.push(Value::Integer(i64::from(page.page_size)));
            bind_values.push(Value::Integer(page.offset()));
        }

        self.query_records(&sql, bind_values)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM structures;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative structure count `{count}`")))
    }

    fn insert(&self, fields: &StructureFields) -> RepoResult<StructureRecord> {
        self.conn
            .execute(
                "INSERT INTO structures (notation, name, description, updated_at)
                 VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000));",
                params![
                    fields.notation.as_str(),
                    fields.name.as_deref(),
                    fields.description.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, fields))?;

        Ok(StructureRecord {
            id: self.conn.last_insert_rowid(),
            notation: fields.notation.clone(),
            name: fields.name.clone(),
            description: fields.description.clone(),
        })
    }

    fn update(
        &self,
        id: StructureId,
        fields: &StructureFields,
    ) -> RepoResult<Option<StructureRecord>> {
        let changed = self
            .conn
            .execute(
                "UPDATE structures
                 SET
                    notation = ?1,
                    name = ?2,
                    description = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?4;",
                params![
                    fields.notation.as_str(),
                    fields.name.as_deref(),
                    fields.description.as_deref(),
                    id,
                ],
            )
            .map_err(|err| map_write_error(err, fields))?;

        if changed == 0 {
            return Ok(None);
        }

        Ok(Some(StructureRecord {
            id,
            notation: fields.notation.clone(),
            name: fields.name.clone(),
            description: fields.description.clone(),
        }))
    }

    fn delete(&self, id: StructureId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM structures WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn unit_of_work<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        // Dropping `tx` on the error path rolls back.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| E::from(RepoError::from(err)))?;
        let output = work(self)?;
        tx.commit().map_err(|err| E::from(RepoError::from(err)))?;
        Ok(output)
    }
}

fn parse_structure_row(row: &Row<'_>) -> RepoResult<StructureRecord> {
    let notation: String = row.get("notation")?;
    if notation.is_empty() {
        let id: i64 = row.get("id")?;
        return Err(RepoError::InvalidData(format!(
            "empty notation in structures.notation for id `{id}`"
        )));
    }

    Ok(StructureRecord {
        id: row.get("id")?,
        notation,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

fn map_write_error(err: rusqlite::Error, fields: &StructureFields) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation
            && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        {
            return RepoError::UniqueViolation(fields.notation.clone());
        }
    }
    err.into()
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>("name")?);
    }
    Ok(columns)
}
