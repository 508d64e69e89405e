//! Document-store contract.
//!
//! # Responsibility
//! - Describe the hierarchical JSON document store the gateways persist to.
//! - Isolate store-specific details (SQL, JSON paths) behind `DocumentStore`.
//!
//! # Invariants
//! - Documents are JSON objects addressed by `(collection, id)`.
//! - `WriteMode::Merge` merges top-level and nested object keys; arrays and
//!   scalars are replaced.
//!
//! # See also
//! - `service::patient_data_service` for the collection layout.

pub mod sqlite_store;

use crate::db::DbError;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use sqlite_store::SqliteDocumentStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Collection holding patient root records.
pub const PATIENTS: &str = "patients";

/// Patient sub-collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcollection {
    AacBoards,
    VisualSchedules,
    Activities,
    Progress,
}

impl Subcollection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AacBoards => "aacBoards",
            Self::VisualSchedules => "visualSchedules",
            Self::Activities => "activities",
            Self::Progress => "progress",
        }
    }
}

/// Fully-qualified collection path, e.g. `patients/p1/activities`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn patients() -> Self {
        Self(PATIENTS.to_string())
    }

    pub fn patient_child(patient_id: &str, child: Subcollection) -> Self {
        Self(format!("{PATIENTS}/{patient_id}/{}", child.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc(&self, id: impl Into<String>) -> DocPath {
        DocPath {
            collection: self.clone(),
            id: id.into(),
        }
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    pub collection: CollectionPath,
    pub id: String,
}

impl DocPath {
    pub fn patient(patient_id: &str) -> Self {
        CollectionPath::patients().doc(patient_id)
    }
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// How `set` combines the new body with an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Merge,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Collection query: optional equality filter, ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocQuery {
    /// `(field, value)`; value must be a JSON scalar.
    pub filter: Option<(String, Value)>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<u32>,
}

impl DocQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A document body together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub body: Value,
}

/// Hierarchical JSON document store.
pub trait DocumentStore {
    fn set(&self, path: &DocPath, body: &Value, mode: WriteMode) -> StoreResult<()>;
    fn get(&self, path: &DocPath) -> StoreResult<Option<Value>>;
    /// Deleting a missing document is not an error.
    fn delete(&self, path: &DocPath) -> StoreResult<()>;
    fn query(&self, collection: &CollectionPath, query: &DocQuery) -> StoreResult<Vec<StoredDocument>>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn set(&self, path: &DocPath, body: &Value, mode: WriteMode) -> StoreResult<()> {
        (**self).set(path, body, mode)
    }

    fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        (**self).get(path)
    }

    fn delete(&self, path: &DocPath) -> StoreResult<()> {
        (**self).delete(path)
    }

    fn query(&self, collection: &CollectionPath, query: &DocQuery) -> StoreResult<Vec<StoredDocument>> {
        (**self).query(collection, query)
    }
}

/// Store-layer error.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Json(serde_json::Error),
    /// Caller-supplied body, field name or filter value is unusable.
    InvalidInput(String),
    PermissionDenied(String),
    /// Transient failure; safe to retry.
    Unavailable(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid document JSON: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid store request: {message}"),
            Self::PermissionDenied(message) => write!(f, "permission denied: {message}"),
            Self::Unavailable(message) => write!(f, "document store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::InvalidInput(_) | Self::PermissionDenied(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        let code = match &value {
            rusqlite::Error::SqliteFailure(failure, _) => Some(failure.code),
            _ => None,
        };
        match code {
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
                Self::Unavailable(value.to_string())
            }
            Some(rusqlite::ErrorCode::ReadOnly) => Self::PermissionDenied(value.to_string()),
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
