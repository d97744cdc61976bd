use uuid::Uuid;

mod collection;
mod document;

pub use collection::Collection;
pub use document::{Document, DocumentUpdate, Fields, ID_KEY, InsertOneResult};

/// Generates the ID of a new document.
#[must_use]
pub fn new_uuid() -> Uuid {
    Uuid::new_v4()
}
