use std::{borrow::Cow, future::Future, pin::Pin};

use uuid::Uuid;

use crate::models::{Collection, Document, DocumentUpdate, Fields};

/// # Document store
///
/// Every collection is schemaless: documents are field maps addressed by a store-assigned ID.
/// Each method is a single round trip to the backend.
pub trait DatabaseClient: Send + Sync + 'static {
    /// Inserts a new document and returns it with its assigned ID.
    fn insert_document<'a>(
        &self,
        collection: Collection,
        fields: &'a Fields,
    ) -> Pin<Box<dyn Future<Output = Result<Document, DatabaseError>> + Send + 'a>>;

    /// Returns every document of a collection in insertion order.
    fn find_documents(
        &self,
        collection: Collection,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>, DatabaseError>> + Send + 'static>>;

    /// Returns the first document whose fields equal every entry of `filter`.
    ///
    /// Fails with [`DatabaseError::NotFound`] if no document matches.
    fn find_document<'a>(
        &self,
        collection: Collection,
        filter: &'a Fields,
    ) -> Pin<Box<dyn Future<Output = Result<Document, DatabaseError>> + Send + 'a>>;

    /// Applies an update to the document with the given ID.
    ///
    /// Fails with [`DatabaseError::NotFound`] if no document has that ID.
    fn update_document_by_id<'a>(
        &self,
        collection: Collection,
        id: &'a Uuid,
        update: &'a DocumentUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<(), DatabaseError>> + Send + 'a>>;

    /// Deletes the document with the given ID.
    ///
    /// Fails with [`DatabaseError::NotFound`] if no document has that ID.
    fn delete_document_by_id<'id>(
        &self,
        collection: Collection,
        id: &'id Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<(), DatabaseError>> + Send + 'id>>;

    fn count_documents(
        &self,
        collection: Collection,
    ) -> Pin<Box<dyn Future<Output = Result<u64, DatabaseError>> + Send + 'static>>;
}

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("document not found")]
    NotFound,

    #[error(
        "uniqueness violation {}{}",
        if field.is_some() { "on field " } else { "(field unknown)" },
        field.as_deref().unwrap_or("")
    )]
    UniquenessViolation {
        /// The field that caused the uniqueness violation, if known
        field: Option<Cow<'static, str>>,
    },

    #[error("database error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync + 'static>),
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(e) if e.is_unique_violation() => {
                Self::UniquenessViolation { field: None }
            }
            other => Self::Other(Box::new(other)),
        }
    }
}
