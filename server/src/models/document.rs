use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Key under which a document's identifier is exposed in JSON.
pub const ID_KEY: &str = "_id";

/// Schemaless field set of a document.
pub type Fields = Map<String, Value>;

/// # Stored document
///
/// One record of a [`Collection`][super::Collection]. The identifier is assigned by the store on
/// insertion and never changes; everything else is an arbitrary field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    #[must_use]
    pub fn id(&self) -> &Uuid {
        &self.id
    }
}

/// Acknowledgement returned after a document is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

impl From<&Document> for InsertOneResult {
    fn from(document: &Document) -> Self {
        Self {
            acknowledged: true,
            inserted_id: document.id,
        }
    }
}

/// # Document update
///
/// Describes how an update rewrites a stored document's fields.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentUpdate {
    /// Overwrites the given fields and leaves all others untouched.
    Set(Fields),
    /// Replaces the whole field set. The identifier is kept.
    Replace(Fields),
}

impl DocumentUpdate {
    #[must_use]
    pub fn fields(&self) -> &Fields {
        match self {
            DocumentUpdate::Set(fields) | DocumentUpdate::Replace(fields) => fields,
        }
    }
}
