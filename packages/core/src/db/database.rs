//! Database Connection Management
//!
//! Core database connection and schema initialization using libsql/Turso.
//!
//! # Architecture
//!
//! - **Path-agnostic**: accepts any valid PathBuf
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **Foreign keys**: enabled; parent deletes are RESTRICTed so a
//!   non-leaf row can never be removed out from under its children
//! - **Unique sibling names**: enforced by an expression index, the
//!   storage-level backstop behind the in-memory guard checks
//!
//! # Database Connection Patterns
//!
//! **Always use `connect_with_timeout()` in async functions** to avoid
//! SQLite thread-safety violations when the Tokio runtime moves futures
//! between threads. The 5-second busy timeout lets concurrent operations
//! wait and retry instead of failing immediately with `SQLITE_BUSY`.

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Fixed identity of the seeded root row.
///
/// Every other node gets a UUID; the root is created once per database by
/// schema initialization and is immutable thereafter.
pub(crate) const ROOT_ID: &str = "root";

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use arbor_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_service = DatabaseService::new(PathBuf::from("./data/arbor.db")).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

/// Parameters for node insertion (avoids too-many-arguments lint)
pub struct DbNodeParams<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub kind: &'a str,
    pub parent_id: Option<&'a str>,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS) and seed the root
    /// 4. Enable SQLite features (WAL mode, foreign keys)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created,
    /// the connection fails, or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        // Fresh databases get a WAL checkpoint after schema init; existing
        // ones skip it.
        let is_new_database = !db_path.exists();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema(is_new_database).await?;

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of
    /// execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Creates the `nodes` table and indexes with CREATE TABLE IF NOT
    /// EXISTS (idempotent, safe to call multiple times) and seeds the
    /// root row.
    ///
    /// # Schema
    ///
    /// - `nodes` table: flat adjacency list (id, name, kind, parent_id)
    /// - `idx_nodes_parent`: hierarchy queries
    /// - `idx_nodes_sibling_name`: UNIQUE on (parent, name); `COALESCE`
    ///   folds the root's NULL parent into the scope so direct children
    ///   of the root are covered too
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        // Must use connect_with_timeout() in async functions to prevent
        // SQLite thread-safety violations when Tokio moves futures
        // between threads.
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        // Wait up to 5s on a locked database instead of failing
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                parent_id TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                modified_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                -- a parent with children cannot be deleted (delete policy
                -- rejects non-leaf deletes; this backstops it)
                FOREIGN KEY (parent_id) REFERENCES nodes(id) ON DELETE RESTRICT
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create nodes table: {}", e))
        })?;

        // Index on parent_id (hierarchy queries)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_nodes_parent': {}",
                e
            ))
        })?;

        // Sibling names are unique within one parent. COALESCE folds the
        // root's NULL parent into a comparable scope key.
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_sibling_name
             ON nodes(COALESCE(parent_id, ''), name)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_nodes_sibling_name': {}",
                e
            ))
        })?;

        self.seed_root(&conn).await?;

        // Flush schema to disk for newly created databases. Prevents
        // "no such table" races when tests swap databases rapidly.
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Seed the root row
    ///
    /// The root is the single node with `parent_id = NULL`. Idempotent:
    /// INSERT OR IGNORE safely handles repeated initialization.
    async fn seed_root(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        conn.execute(
            "INSERT OR IGNORE INTO nodes (id, name, kind, parent_id, created_at, modified_at)
             VALUES (?, ?, ?, NULL, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
            (ROOT_ID, "/", "folder"),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to seed root node: {}", e)))?;

        Ok(())
    }

    /// Get a synchronous connection to the database
    ///
    /// Only use this in synchronous, single-threaded contexts. In async
    /// functions, use `connect_with_timeout()` instead to avoid SQLite
    /// thread-safety violations.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout and foreign keys
    /// configured
    ///
    /// The safe default for all async code: concurrent operations wait
    /// and retry instead of failing immediately when the database is
    /// locked. Foreign key enforcement is per-connection in SQLite, so
    /// every connection turns it on - otherwise the RESTRICT constraint
    /// on `parent_id` would silently not apply.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    //
    // NODE STORE OPERATIONS
    // Raw SQL operations wrapped by the NodeStore trait implementation.
    //

    /// Fetch every node row (the flat adjacency snapshot)
    ///
    /// Returns the raw rows iterator; the caller converts rows to models.
    pub async fn db_list_nodes(&self) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, name, kind, parent_id, created_at, modified_at
                 FROM nodes",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare list query: {}", e))
            })?;

        stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute list query: {}", e))
        })
    }

    /// Retrieve a single node row by id
    pub async fn db_get_node(&self, id: &str) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, name, kind, parent_id, created_at, modified_at
                 FROM nodes WHERE id = ?",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare get_node query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_node query: {}", e))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Whether a node row with this id exists
    pub async fn db_node_exists(&self, id: &str) -> Result<bool, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare("SELECT 1 FROM nodes WHERE id = ? LIMIT 1")
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare exists query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute exists query: {}", e))
        })?;

        Ok(rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
            .is_some())
    }

    /// Whether a sibling with this name exists under the given parent
    ///
    /// `IS ?` (not `=`) so a NULL parent - the root scope - compares
    /// equal to NULL.
    pub async fn db_is_name_taken(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare("SELECT 1 FROM nodes WHERE name = ? AND parent_id IS ? LIMIT 1")
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare name query: {}", e))
            })?;

        let mut rows = stmt.query((name, parent_id)).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute name query: {}", e))
        })?;

        Ok(rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
            .is_some())
    }

    /// Insert a node row
    ///
    /// Timestamps are set by the database. All validations happen before
    /// this call; the unique sibling index and foreign keys still reject
    /// races the in-memory guard missed.
    pub async fn db_insert_node(&self, params: DbNodeParams<'_>) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO nodes (id, name, kind, parent_id)
             VALUES (?, ?, ?, ?)",
            (params.id, params.name, params.kind, params.parent_id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert node: {}", e)))?;

        Ok(())
    }

    /// Batch insert node rows in a transaction
    ///
    /// Inserts atomically: any failure rolls the whole batch back, so a
    /// failed subtree duplication never leaves a partial subtree behind.
    ///
    /// # Returns
    ///
    /// Inserted ids in input order
    pub async fn db_batch_insert_nodes(
        &self,
        nodes: Vec<DbNodeParams<'_>>,
    ) -> Result<Vec<String>, DatabaseError> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        let mut inserted_ids = Vec::new();

        for params in nodes {
            let result = conn
                .execute(
                    "INSERT INTO nodes (id, name, kind, parent_id)
                     VALUES (?, ?, ?, ?)",
                    (params.id, params.name, params.kind, params.parent_id),
                )
                .await;

            if let Err(e) = result {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to insert node {}: {}",
                    params.id, e
                )));
            }

            inserted_ids.push(params.id.to_string());
        }

        conn.execute("COMMIT", ()).await.map_err(|e| {
            std::mem::drop(conn.execute("ROLLBACK", ()));
            DatabaseError::sql_execution(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(inserted_ids)
    }

    /// Rename a node row
    ///
    /// # Returns
    ///
    /// Number of rows affected (0 = node didn't exist)
    pub async fn db_rename_node(&self, id: &str, name: &str) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let rows_affected = conn
            .execute(
                "UPDATE nodes SET name = ?, modified_at = CURRENT_TIMESTAMP WHERE id = ?",
                (name, id),
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to rename node: {}", e)))?;

        Ok(rows_affected)
    }

    /// Reparent a node row
    ///
    /// # Returns
    ///
    /// Number of rows affected (0 = node didn't exist)
    pub async fn db_reparent_node(
        &self,
        id: &str,
        parent_id: &str,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let rows_affected = conn
            .execute(
                "UPDATE nodes SET parent_id = ?, modified_at = CURRENT_TIMESTAMP WHERE id = ?",
                (parent_id, id),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to reparent node: {}", e))
            })?;

        Ok(rows_affected)
    }

    /// Delete a single node row
    ///
    /// The RESTRICT foreign key makes this fail for rows that still have
    /// children; the service rejects those before calling.
    ///
    /// # Returns
    ///
    /// Number of rows affected (0 = node didn't exist)
    pub async fn db_delete_node(&self, id: &str) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let rows_affected = conn
            .execute("DELETE FROM nodes WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete node: {}", e)))?;

        Ok(rows_affected)
    }
}
