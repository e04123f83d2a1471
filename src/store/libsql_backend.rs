//! libSQL backend — async `StudentStore` implementation.
//!
//! Supports local file and in-memory databases. Email uniqueness is
//! enforced here; it is the source of the "Email already registered"
//! validation failure surfaced to the user.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;
use uuid::Uuid;

use crate::error::StorageError;
use crate::registration::model::{StoredStudent, Student, Transmission};
use crate::store::traits::StudentStore;

const STUDENT_COLUMNS: &str = "id, first_name, last_name, email, phone, date_of_birth, \
     address, has_license, license_number, preferred_transmission, created_at";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StorageError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Student database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StorageError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| StorageError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS students (
                    id TEXT PRIMARY KEY,
                    first_name TEXT NOT NULL DEFAULT '',
                    last_name TEXT NOT NULL DEFAULT '',
                    email TEXT NOT NULL DEFAULT '',
                    phone TEXT NOT NULL DEFAULT '',
                    date_of_birth TEXT NOT NULL DEFAULT '',
                    address TEXT NOT NULL DEFAULT '',
                    has_license INTEGER NOT NULL DEFAULT 0,
                    license_number TEXT NOT NULL DEFAULT '',
                    preferred_transmission TEXT NOT NULL DEFAULT 'automatic',
                    created_at TEXT NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| StorageError::Query(format!("Failed to create students table: {e}")))?;

        // Non-empty emails must be unique; records completed without a
        // structured email update stay storable.
        self.conn
            .execute(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_students_email
                 ON students(email) WHERE email != ''",
                (),
            )
            .await
            .map_err(|e| StorageError::Query(format!("Failed to create email index: {e}")))?;

        Ok(())
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 datetime string, falling back to the epoch floor.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Map a libsql row to a StoredStudent.
///
/// Column order matches STUDENT_COLUMNS.
fn row_to_student(row: &libsql::Row) -> Result<StoredStudent, libsql::Error> {
    let id_str: String = row.get(0)?;
    let created_str: String = row.get(10)?;
    let has_license: i64 = row.get(7)?;
    let transmission_str: String = row.get(9)?;

    Ok(StoredStudent {
        id: Uuid::parse_str(&id_str).unwrap_or(Uuid::nil()),
        created_at: parse_datetime(&created_str),
        student: Student {
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            date_of_birth: row.get(5)?,
            address: row.get(6)?,
            has_license: has_license != 0,
            license_number: row.get(8)?,
            preferred_transmission: Transmission::parse_or_default(&transmission_str),
        },
    })
}

#[async_trait]
impl StudentStore for LibSqlBackend {
    async fn save_student(&self, student: &Student) -> Result<StoredStudent, StorageError> {
        if !student.email.is_empty() && !student.email.contains('@') {
            return Err(StorageError::Validation(format!(
                "Invalid email address: {}",
                student.email
            )));
        }

        if !student.email.is_empty() {
            let mut rows = self
                .conn()
                .query(
                    "SELECT 1 FROM students WHERE email = ?1 LIMIT 1",
                    params![student.email.clone()],
                )
                .await
                .map_err(|e| StorageError::Query(format!("Email lookup failed: {e}")))?;
            if rows
                .next()
                .await
                .map_err(|e| StorageError::Query(format!("Email lookup failed: {e}")))?
                .is_some()
            {
                return Err(StorageError::Validation(
                    "Email already registered".to_string(),
                ));
            }
        }

        let stored = StoredStudent {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            student: student.clone(),
        };

        self.conn()
            .execute(
                "INSERT INTO students (id, first_name, last_name, email, phone,
                    date_of_birth, address, has_license, license_number,
                    preferred_transmission, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    stored.id.to_string(),
                    student.first_name.clone(),
                    student.last_name.clone(),
                    student.email.clone(),
                    student.phone.clone(),
                    student.date_of_birth.clone(),
                    student.address.clone(),
                    student.has_license as i64,
                    student.license_number.clone(),
                    student.preferred_transmission.to_string(),
                    stored.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| {
                // Lost race against a concurrent insert of the same email.
                if e.to_string().contains("UNIQUE") {
                    StorageError::Validation("Email already registered".to_string())
                } else {
                    StorageError::Query(format!("Failed to insert student: {e}"))
                }
            })?;

        info!(student_id = %stored.id, "Student registered");
        Ok(stored)
    }

    async fn get_student(&self, id: Uuid) -> Result<Option<StoredStudent>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| StorageError::Query(format!("Student lookup failed: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| StorageError::Query(format!("Student lookup failed: {e}")))?
        {
            Some(row) => {
                let student = row_to_student(&row)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(student))
            }
            None => Ok(None),
        }
    }

    async fn list_students(&self) -> Result<Vec<StoredStudent>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY created_at DESC"),
                (),
            )
            .await
            .map_err(|e| StorageError::Query(format!("Student list failed: {e}")))?;

        let mut students = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StorageError::Query(format!("Student list failed: {e}")))?
        {
            students.push(
                row_to_student(&row).map_err(|e| StorageError::Serialization(e.to_string()))?,
            );
        }
        Ok(students)
    }
}
