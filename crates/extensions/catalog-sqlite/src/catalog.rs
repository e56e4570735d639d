//! SQLite job catalog implementation.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use std::path::{Path, PathBuf};
use tokio_rusqlite::Connection;
use tracing::debug;

use cronfleet_protocols::{
    CatalogError, CatalogSession, Job, JobCatalog, OperationCall, OwnedJobIndex,
    PartitionDescriptor,
};

use crate::schema::{configure, init_schema};

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;

/// Raw `jobs` row: id, code, schedule expression, operation, parameters.
type JobRow = (i64, String, String, String, String);

const SELECT_BY_CODE: &str =
    "SELECT id, code, schedule_expression, operation, parameters FROM jobs WHERE code = ?1";

fn select_by_code(conn: &rusqlite::Connection, code: &str) -> rusqlite::Result<Option<JobRow>> {
    conn.query_row(SELECT_BY_CODE, [code], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    })
    .optional()
}

fn decode(row: JobRow) -> Result<Job, CatalogError> {
    let (id, code, schedule_expression, operation, parameters) = row;
    let id = u64::try_from(id)
        .map_err(|_| CatalogError::Decode(format!("job '{}' has negative id {}", code, id)))?;
    let parameters = serde_json::from_str(&parameters)
        .map_err(|e| CatalogError::Decode(format!("job '{}' parameters: {}", code, e)))?;

    Ok(Job {
        id,
        code,
        schedule_expression,
        target_operation_call: OperationCall {
            operation,
            parameters,
        },
    })
}

/// SQLite-backed job catalog.
///
/// Every read session runs on a connection of its own inside a deferred
/// transaction that is always rolled back. Administrative writes and the
/// bootstrap query share one long-lived connection.
pub struct SqliteJobCatalog {
    path: PathBuf,
    conn: Connection,
}

impl SqliteJobCatalog {
    /// Open (or create) a catalog database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(path.clone())
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))?;

        debug!("Opened job catalog at {}", path.display());
        Ok(Self { path, conn })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a job, or replace the definition of the job with the same code.
    ///
    /// IDs are assigned by the database on first insert and never change.
    pub async fn save(&self, job: &Job) -> Result<Job, CatalogError> {
        let code = job.code.clone();
        let expression = job.schedule_expression.clone();
        let operation = job.target_operation_call.operation.clone();
        let parameters = serde_json::to_string(&job.target_operation_call.parameters)
            .map_err(|e| CatalogError::Decode(e.to_string()))?;

        let row = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO jobs (code, schedule_expression, operation, parameters)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(code) DO UPDATE SET
                         schedule_expression = excluded.schedule_expression,
                         operation = excluded.operation,
                         parameters = excluded.parameters",
                    params![code, expression, operation, parameters],
                )?;
                Ok(select_by_code(conn, &code)?)
            })
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))?;

        match row {
            Some(row) => decode(row),
            None => Err(CatalogError::Query(format!(
                "job '{}' vanished after save",
                job.code
            ))),
        }
    }

    /// Delete a job. Returns whether it existed.
    pub async fn delete(&self, code: &str) -> Result<bool, CatalogError> {
        let code = code.to_string();
        self.conn
            .call(move |conn| Ok(conn.execute("DELETE FROM jobs WHERE code = ?1", [&code])? > 0))
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))
    }

    /// Number of jobs in the catalog.
    pub async fn count(&self) -> Result<u64, CatalogError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
                Ok(count.max(0) as u64)
            })
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))
    }
}

#[async_trait]
impl JobCatalog for SqliteJobCatalog {
    async fn begin_read(&self) -> Result<Box<dyn CatalogSession>, CatalogError> {
        let conn = Connection::open(self.path.clone())
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        conn.call(|conn| {
            configure(conn)?;
            conn.execute_batch("BEGIN DEFERRED")?;
            Ok(())
        })
        .await
        .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        Ok(Box::new(SqliteSession { conn }))
    }
}

#[async_trait]
impl OwnedJobIndex for SqliteJobCatalog {
    async fn owned_job_codes(
        &self,
        partition: PartitionDescriptor,
    ) -> Result<Vec<String>, CatalogError> {
        let total = i64::from(partition.total_instances());
        let number = i64::from(partition.instance_number());

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT code FROM jobs WHERE id > 0 AND (id % ?1) + 1 = ?2 ORDER BY id",
                )?;
                let codes = stmt
                    .query_map(params![total, number], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(codes)
            })
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))
    }
}

/// Read session on its own connection.
struct SqliteSession {
    conn: Connection,
}

#[async_trait]
impl CatalogSession for SqliteSession {
    async fn find_by_code(&mut self, code: &str) -> Result<Option<Job>, CatalogError> {
        let code = code.to_string();
        let row = self
            .conn
            .call(move |conn| Ok(select_by_code(conn, &code)?))
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))?;

        row.map(decode).transpose()
    }

    async fn rollback(self: Box<Self>) -> Result<(), CatalogError> {
        let SqliteSession { conn } = *self;
        let rolled_back = conn
            .call(|conn| {
                conn.execute_batch("ROLLBACK")?;
                Ok(())
            })
            .await
            .map_err(|e| CatalogError::Release(e.to_string()));

        let closed = conn
            .close()
            .await
            .map_err(|e| CatalogError::Release(e.to_string()));

        rolled_back.and(closed)
    }
}
