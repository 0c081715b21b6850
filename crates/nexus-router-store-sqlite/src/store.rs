// crates/nexus-router-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Event Store
// Description: Durable EventStore backed by SQLite with WAL support.
// Purpose: Persist runs and events with strict per-run sequencing.
// Dependencies: nexus-router-core, rusqlite, serde, serde_json, thiserror, uuid
// ============================================================================

//! ## Overview
//! One writer connection guarded by a mutex serves the whole store. Every
//! append runs in a transaction that allocates the next dense `seq` for its
//! run and inserts the event, so `(run_id, seq)` allocation is serialized
//! per run as the core contract requires. Payloads are stored as canonical
//! JSON text. All failures leave the database unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use nexus_router_core::EventId;
use nexus_router_core::EventRecord;
use nexus_router_core::EventStore;
use nexus_router_core::EventType;
use nexus_router_core::RunCounts;
use nexus_router_core::RunFilter;
use nexus_router_core::RunId;
use nexus_router_core::RunMode;
use nexus_router_core::RunRecord;
use nexus_router_core::RunStatus;
use nexus_router_core::StoreError;
use nexus_router_core::Timestamp;
use nexus_router_core::hashing::canonical_json_bytes;
use nexus_router_core::interfaces::MAX_LIST_LIMIT;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::ToSql;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Special path denoting an ephemeral in-process database.
const MEMORY_PATH: &str = ":memory:";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended for file-backed stores).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` event store.
///
/// # Invariants
/// - `path` resolves to a database file, or is `":memory:"` for an
///   ephemeral store.
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file or `":memory:"`.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a configuration for the given database path with defaults.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }

    /// Builds a configuration for an ephemeral in-process store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::for_path(MEMORY_PATH)
    }

    /// Returns true when the configuration denotes the ephemeral store.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw event payloads.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or unparseable stored data.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or arguments.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// The referenced run does not exist.
    #[error("sqlite store run not found: {0}")]
    RunNotFound(String),
    /// Attempted transition away from a terminal run status.
    #[error("sqlite store invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Current persisted status.
        from: RunStatus,
        /// Requested status.
        to: RunStatus,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) | SqliteStoreError::Invalid(message) => {
                Self::Invalid(message)
            }
            SqliteStoreError::RunNotFound(run_id) => Self::RunNotFound(run_id),
            SqliteStoreError::InvalidTransition {
                from,
                to,
            } => Self::InvalidTransition {
                from,
                to,
            },
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed event store.
///
/// # Invariants
/// - Connection access is serialized through a mutex; the mutex holder is
///   the sole writer, which serializes `(run_id, seq)` allocation.
/// - Run and event identifiers are generated here and are globally unique.
pub struct SqliteEventStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Mutex<Connection>,
}

impl SqliteEventStore {
    /// Opens or creates an event store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// its schema cannot be initialized.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        if !config.is_memory() {
            validate_store_path(&config.path)?;
        }
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Mutex::new(connection),
        })
    }

    /// Opens or creates an event store at the given path with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when opening fails.
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self, SqliteStoreError> {
        Self::open(SqliteStoreConfig::for_path(path))
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Closes the store, releasing the underlying connection.
    ///
    /// Dropping the store also closes the connection; this method exists to
    /// surface close-time errors instead of discarding them.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the connection fails to close.
    pub fn close(self) -> Result<(), SqliteStoreError> {
        let connection = self
            .connection
            .into_inner()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))?;
        connection.close().map_err(|(_, err)| SqliteStoreError::Db(err.to_string()))
    }

    /// Locks the connection, mapping poison into a store error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))
    }

    /// Creates a run row inside a transaction.
    fn create_run_impl(&self, mode: RunMode, goal: &str) -> Result<RunId, SqliteStoreError> {
        let run_id = RunId::new(format!("run-{}", Uuid::new_v4()));
        let created_at = now_timestamp()?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.execute(
            "INSERT INTO runs (run_id, mode, goal, status, created_at) VALUES (?1, ?2, ?3, ?4, \
             ?5)",
            params![
                run_id.as_str(),
                mode.as_str(),
                goal,
                RunStatus::Running.as_str(),
                created_at.as_str()
            ],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(run_id)
    }

    /// Appends one event, allocating the next dense `seq` transactionally.
    fn append_impl(
        &self,
        run_id: &RunId,
        event_type: EventType,
        payload: &Value,
    ) -> Result<EventId, SqliteStoreError> {
        let payload_json = canonical_payload_text(payload)?;
        let event_id = EventId::new(format!("evt-{}", Uuid::new_v4()));
        let created_at = now_timestamp()?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        ensure_run_exists(&tx, run_id)?;
        let seq: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq) + 1, 0) FROM events WHERE run_id = ?1",
                params![run_id.as_str()],
                |row| row.get(0),
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.execute(
            "INSERT INTO events (event_id, run_id, seq, type, payload_json, created_at) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event_id.as_str(),
                run_id.as_str(),
                seq,
                event_type.as_str(),
                payload_json,
                created_at.as_str()
            ],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(event_id)
    }

    /// Applies the single RUNNING-to-terminal status transition.
    fn set_run_status_impl(
        &self,
        run_id: &RunId,
        status: RunStatus,
    ) -> Result<(), SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let current: Option<String> = tx
            .query_row(
                "SELECT status FROM runs WHERE run_id = ?1",
                params![run_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let Some(current) = current else {
            return Err(SqliteStoreError::RunNotFound(run_id.as_str().to_string()));
        };
        let current = parse_status(&current, run_id)?;
        if current == status {
            tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            return Ok(());
        }
        if current.is_terminal() {
            return Err(SqliteStoreError::InvalidTransition {
                from: current,
                to: status,
            });
        }
        tx.execute(
            "UPDATE runs SET status = ?1 WHERE run_id = ?2",
            params![status.as_str(), run_id.as_str()],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Loads one run row.
    fn get_run_impl(&self, run_id: &RunId) -> Result<Option<RunRecord>, SqliteStoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT run_id, mode, goal, status, created_at FROM runs WHERE run_id = ?1",
                params![run_id.as_str()],
                read_run_row,
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        row.map(|raw| build_run_record(&raw)).transpose()
    }

    /// Lists runs under the filter, newest first.
    fn list_runs_impl(
        &self,
        filter: &RunFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<RunRecord>, SqliteStoreError> {
        if limit > MAX_LIST_LIMIT {
            return Err(SqliteStoreError::Invalid(format!(
                "limit out of range: {limit} (max {MAX_LIST_LIMIT})"
            )));
        }
        let (where_clause, mut bindings) = build_filter(filter);
        let sql = format!(
            "SELECT run_id, mode, goal, status, created_at FROM runs {where_clause} ORDER BY \
             created_at DESC, rowid DESC LIMIT ? OFFSET ?"
        );
        bindings.push(Box::new(to_i64(limit)?));
        bindings.push(Box::new(to_i64(offset)?));

        let guard = self.lock()?;
        let mut stmt =
            guard.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(bindings.iter().map(|binding| binding.as_ref())), read_run_row)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut records = Vec::new();
        for row in rows {
            let raw = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            records.push(build_run_record(&raw)?);
        }
        Ok(records)
    }

    /// Counts runs by status under the filter.
    fn count_runs_impl(&self, filter: &RunFilter) -> Result<RunCounts, SqliteStoreError> {
        let (where_clause, bindings) = build_filter(filter);
        let sql = format!(
            "SELECT COUNT(*), SUM(CASE WHEN status = 'COMPLETED' THEN 1 ELSE 0 END), SUM(CASE \
             WHEN status = 'FAILED' THEN 1 ELSE 0 END), SUM(CASE WHEN status = 'RUNNING' THEN 1 \
             ELSE 0 END) FROM runs {where_clause}"
        );
        let guard = self.lock()?;
        let (total, completed, failed, running): (i64, Option<i64>, Option<i64>, Option<i64>) =
            guard
                .query_row(&sql, params_from_iter(bindings.iter().map(|binding| binding.as_ref())), |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(RunCounts {
            runs_total: from_i64(total)?,
            completed: from_i64(completed.unwrap_or(0))?,
            failed: from_i64(failed.unwrap_or(0))?,
            running: from_i64(running.unwrap_or(0))?,
        })
    }

    /// Reads all events of one run ascending by `seq`.
    fn read_events_impl(&self, run_id: &RunId) -> Result<Vec<EventRecord>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT event_id, run_id, seq, type, payload_json, created_at FROM events WHERE \
                 run_id = ?1 ORDER BY seq ASC",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(params![run_id.as_str()], |row| {
                let event_id: String = row.get(0)?;
                let run_id: String = row.get(1)?;
                let seq: i64 = row.get(2)?;
                let event_type: String = row.get(3)?;
                let payload_json: String = row.get(4)?;
                let created_at: String = row.get(5)?;
                Ok((event_id, run_id, seq, event_type, payload_json, created_at))
            })
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut records = Vec::new();
        for row in rows {
            let (event_id, run_id, seq, event_type, payload_json, created_at) =
                row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let event_type = EventType::parse(&event_type).ok_or_else(|| {
                SqliteStoreError::Corrupt(format!("unknown event type: {event_type}"))
            })?;
            let payload: Value = serde_json::from_str(&payload_json).map_err(|err| {
                SqliteStoreError::Corrupt(format!("unparseable event payload: {err}"))
            })?;
            records.push(EventRecord {
                event_id: EventId::new(event_id),
                run_id: RunId::new(run_id),
                seq: from_i64(seq)?,
                event_type,
                payload,
                created_at: Timestamp::from_wire(created_at),
            });
        }
        Ok(records)
    }
}

impl EventStore for SqliteEventStore {
    fn create_run(&self, mode: RunMode, goal: &str) -> Result<RunId, StoreError> {
        self.create_run_impl(mode, goal).map_err(StoreError::from)
    }

    fn append(
        &self,
        run_id: &RunId,
        event_type: EventType,
        payload: &Value,
    ) -> Result<EventId, StoreError> {
        self.append_impl(run_id, event_type, payload).map_err(StoreError::from)
    }

    fn set_run_status(&self, run_id: &RunId, status: RunStatus) -> Result<(), StoreError> {
        self.set_run_status_impl(run_id, status).map_err(StoreError::from)
    }

    fn get_run(&self, run_id: &RunId) -> Result<Option<RunRecord>, StoreError> {
        self.get_run_impl(run_id).map_err(StoreError::from)
    }

    fn list_runs(
        &self,
        filter: &RunFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<RunRecord>, StoreError> {
        self.list_runs_impl(filter, limit, offset).map_err(StoreError::from)
    }

    fn count_runs(&self, filter: &RunFilter) -> Result<RunCounts, StoreError> {
        self.count_runs_impl(filter).map_err(StoreError::from)
    }

    fn read_events(&self, run_id: &RunId) -> Result<Vec<EventRecord>, StoreError> {
        self.read_events_impl(run_id).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Row Helpers
// ============================================================================

/// Raw run row as read from `SQLite`.
type RawRunRow = (String, String, String, String, String);

/// Reads the run columns out of a row.
fn read_run_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRunRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

/// Builds a typed run record from a raw row.
fn build_run_record(raw: &RawRunRow) -> Result<RunRecord, SqliteStoreError> {
    let (run_id, mode, goal, status, created_at) = raw;
    let parsed_mode = RunMode::parse(mode)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("unknown run mode: {mode}")))?;
    let run_id_typed = RunId::new(run_id.clone());
    let parsed_status = parse_status(status, &run_id_typed)?;
    Ok(RunRecord {
        run_id: run_id_typed,
        mode: parsed_mode,
        goal: goal.clone(),
        status: parsed_status,
        created_at: Timestamp::from_wire(created_at.clone()),
    })
}

/// Parses a stored status label, attributing corruption to the run.
fn parse_status(value: &str, run_id: &RunId) -> Result<RunStatus, SqliteStoreError> {
    RunStatus::parse(value).ok_or_else(|| {
        SqliteStoreError::Corrupt(format!("unknown status {value} for run {run_id}"))
    })
}

/// Verifies the run row exists inside the append transaction.
fn ensure_run_exists(tx: &Transaction<'_>, run_id: &RunId) -> Result<(), SqliteStoreError> {
    let exists: Option<i64> = tx
        .query_row("SELECT 1 FROM runs WHERE run_id = ?1", params![run_id.as_str()], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    if exists.is_none() {
        return Err(SqliteStoreError::RunNotFound(run_id.as_str().to_string()));
    }
    Ok(())
}

/// Builds the WHERE clause and bindings for a run filter.
fn build_filter(filter: &RunFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut bindings: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(run_id) = &filter.run_id {
        conditions.push("run_id = ?");
        bindings.push(Box::new(run_id.as_str().to_string()));
    }
    if let Some(status) = filter.status {
        conditions.push("status = ?");
        bindings.push(Box::new(status.as_str().to_string()));
    }
    if let Some(since) = &filter.since {
        conditions.push("created_at >= ?");
        bindings.push(Box::new(since.as_str().to_string()));
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (where_clause, bindings)
}

// ============================================================================
// SECTION: Connection Helpers
// ============================================================================

/// Validates file-backed store paths.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let connection = if config.is_memory() {
        Connection::open_in_memory().map_err(|err| SqliteStoreError::Db(err.to_string()))?
    } else {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        Connection::open_with_flags(&config.path, flags)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?
    };
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    if !config.is_memory() {
        connection
            .execute_batch(&format!(
                "PRAGMA journal_mode = {};",
                config.journal_mode.pragma_value()
            ))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        connection
            .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    }
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS runs (
                    run_id TEXT PRIMARY KEY,
                    mode TEXT NOT NULL,
                    goal TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS events (
                    event_id TEXT PRIMARY KEY,
                    run_id TEXT NOT NULL REFERENCES runs(run_id),
                    seq INTEGER NOT NULL,
                    type TEXT NOT NULL,
                    payload_json TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    UNIQUE (run_id, seq)
                );
                CREATE INDEX IF NOT EXISTS idx_events_run_seq
                    ON events (run_id, seq);
                CREATE INDEX IF NOT EXISTS idx_runs_created_at
                    ON runs (created_at);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Value Helpers
// ============================================================================

/// Renders a payload as canonical JSON text for storage.
fn canonical_payload_text(payload: &Value) -> Result<String, SqliteStoreError> {
    let bytes = canonical_json_bytes(payload)
        .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    String::from_utf8(bytes)
        .map_err(|err| SqliteStoreError::Invalid(format!("non-utf8 canonical json: {err}")))
}

/// Captures the current store timestamp.
fn now_timestamp() -> Result<Timestamp, SqliteStoreError> {
    Timestamp::now_utc().map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Converts an unsigned page bound into an `SQLite` integer.
fn to_i64(value: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(value)
        .map_err(|_| SqliteStoreError::Invalid(format!("value out of range: {value}")))
}

/// Converts an `SQLite` integer into an unsigned count.
fn from_i64(value: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(value)
        .map_err(|_| SqliteStoreError::Corrupt(format!("negative stored value: {value}")))
}
