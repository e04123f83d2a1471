//! Persistence layer — libSQL-backed storage for registered students.

mod libsql_backend;
mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::StudentStore;
