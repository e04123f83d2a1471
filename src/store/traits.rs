//! `StudentStore` trait — async interface for student persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StorageError;
use crate::registration::model::{StoredStudent, Student};

/// Backend-agnostic store for completed registration records.
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Persist a candidate record.
    ///
    /// Fails with [`StorageError::Validation`] when the record is invalid
    /// (duplicate or malformed email); the validation message is
    /// user-facing and relayed verbatim.
    async fn save_student(&self, student: &Student) -> Result<StoredStudent, StorageError>;

    /// Look up a stored student by id.
    async fn get_student(&self, id: Uuid) -> Result<Option<StoredStudent>, StorageError>;

    /// All stored students, most recent first.
    async fn list_students(&self) -> Result<Vec<StoredStudent>, StorageError>;
}
