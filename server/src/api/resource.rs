//! # Resource collections
//!
//! Every content type of the site is served by the same four handlers, parameterised by a
//! [`Resource`] describing its collection, fields and status-code conventions.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{
    api::{ApiError, AppState, CreatedBody, MessageBody, extractors::Submission},
    db::interface::DatabaseError,
    models::{Collection, DocumentUpdate, Fields, ID_KEY, InsertOneResult},
    uploads::UploadedFile,
};

/// Where an uploaded image is recorded in a resource's documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageField {
    /// Document field receiving the stored path
    pub key: &'static str,
    /// Whether creating a document without an image is rejected
    pub required: bool,
}

/// How `PUT /<resource>/{id}` rewrites a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Sets those of the listed fields which the request sends, plus the image if a new one was
    /// uploaded. Everything else is left untouched.
    Set(&'static [&'static str]),
    /// Replaces the document's fields with the request body as sent.
    Replace,
}

pub trait Resource: Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Capitalised singular name used in response messages.
    const NAME: &'static str;

    /// Fields which must be present on creation.
    const REQUIRED: &'static [&'static str];

    /// Fields which are stored on creation when present.
    const OPTIONAL: &'static [&'static str] = &[];

    const IMAGE: Option<ImageField> = None;

    const UPDATE: UpdatePolicy;

    /// Field whose value must be unique within the collection.
    const UNIQUE_KEY: Option<&'static str> = None;

    /// Status returned when creating a document whose unique field is already taken.
    const CONFLICT_STATUS: StatusCode = StatusCode::CONFLICT;

    /// Status returned when updating a document which does not exist.
    const MISSING_ON_UPDATE_STATUS: StatusCode = StatusCode::NOT_FOUND;

    /// Key of the object wrapping the listed documents, or `None` to return a bare array.
    const LIST_ENVELOPE: Option<&'static str> = None;

    /// Field stamped with the creation time.
    const CREATED_AT_KEY: Option<&'static str> = None;
}

fn label<R: Resource>() -> String {
    R::NAME.to_lowercase()
}

/// Parses a document ID taken from the request path.
///
/// IDs are not validated up front, so a malformed one is reported as a server error.
fn parse_document_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::internal(format!("Invalid document ID {raw:?}"), e))
}

/// Stores an uploaded image and records its path under the resource's image field.
async fn attach_image<R: Resource>(
    state: &AppState,
    fields: &mut Fields,
    image: Option<&UploadedFile>,
) -> Result<(), ApiError> {
    let (Some(field), Some(file)) = (R::IMAGE, image) else {
        return Ok(());
    };
    let path = state
        .uploads
        .store(file)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store {} image", label::<R>()), e))?;
    fields.insert(field.key.to_owned(), Value::String(path));
    Ok(())
}

fn already_exists<R: Resource>(status: StatusCode) -> ApiError {
    ApiError::Conflict {
        message: format!("{} already exists", R::NAME).into(),
        status,
    }
}

pub async fn create_document<R: Resource>(
    State(state): State<AppState>,
    submission: Submission,
) -> Result<(StatusCode, Json<CreatedBody>), ApiError> {
    let mut fields = submission.require(R::REQUIRED)?;
    fields.extend(submission.present(R::OPTIONAL));
    if R::IMAGE.is_some_and(|image| image.required) && submission.image.is_none() {
        return Err(ApiError::InvalidFormat);
    }

    if let Some(key) = R::UNIQUE_KEY {
        let filter = submission.require(&[key])?;
        match state.db.find_document(R::COLLECTION, &filter).await {
            Ok(_) => return Err(already_exists::<R>(R::CONFLICT_STATUS)),
            Err(DatabaseError::NotFound) => (),
            Err(e) => {
                return Err(ApiError::internal(
                    format!("Failed to add {}", label::<R>()),
                    e,
                ));
            }
        }
    }

    attach_image::<R>(&state, &mut fields, submission.image.as_ref()).await?;
    if let Some(key) = R::CREATED_AT_KEY {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        fields.insert(key.to_owned(), Value::String(now));
    }

    let document = match state.db.insert_document(R::COLLECTION, &fields).await {
        Ok(document) => document,
        // Lost a race against a concurrent create with the same unique value
        Err(DatabaseError::UniquenessViolation { .. }) => {
            return Err(already_exists::<R>(R::CONFLICT_STATUS));
        }
        Err(e) => {
            return Err(ApiError::internal(
                format!("Failed to create {}", label::<R>()),
                e,
            ));
        }
    };
    info!("created {} {}", label::<R>(), document.id());

    Ok((
        StatusCode::CREATED,
        Json(CreatedBody {
            message: format!("{} created successfully", R::NAME),
            result: InsertOneResult::from(&document),
        }),
    ))
}

pub async fn list_documents<R: Resource>(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let documents = state
        .db
        .find_documents(R::COLLECTION)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to retrieve {}", R::COLLECTION), e))?;
    Ok(match R::LIST_ENVELOPE {
        Some(key) => Json(HashMap::from([(key, documents)])).into_response(),
        None => Json(documents).into_response(),
    })
}

/// Applies one update to a stored document, mapping store failures to API errors.
async fn apply_update<R: Resource>(
    state: &AppState,
    id: &Uuid,
    update: &DocumentUpdate,
) -> Result<(), ApiError> {
    match state.db.update_document_by_id(R::COLLECTION, id, update).await {
        Ok(()) => Ok(()),
        Err(DatabaseError::NotFound) => Err(ApiError::NotFound {
            what: R::NAME,
            status: R::MISSING_ON_UPDATE_STATUS,
        }),
        Err(DatabaseError::UniquenessViolation { .. }) => {
            Err(already_exists::<R>(StatusCode::CONFLICT))
        }
        Err(e) => Err(ApiError::internal(
            format!("Failed to update {}", label::<R>()),
            e,
        )),
    }
}

pub async fn update_document<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    submission: Submission,
) -> Result<Json<MessageBody>, ApiError> {
    let id = parse_document_id(&id)?;
    match R::UPDATE {
        UpdatePolicy::Replace => {
            // Only a parsed body may replace the stored fields
            if submission.format.is_none() {
                return Err(ApiError::UnsupportedContentType);
            }
            let mut fields = submission.fields;
            fields.remove(ID_KEY);
            apply_update::<R>(&state, &id, &DocumentUpdate::Replace(fields)).await?;
        }
        UpdatePolicy::Set(keys) => {
            // An unknown ID must be reported before any file is written
            apply_update::<R>(&state, &id, &DocumentUpdate::Set(submission.sent(keys))).await?;
            if submission.image.is_some() {
                let mut fields = Fields::new();
                attach_image::<R>(&state, &mut fields, submission.image.as_ref()).await?;
                apply_update::<R>(&state, &id, &DocumentUpdate::Set(fields)).await?;
            }
        }
    }
    info!("updated {} {id}", label::<R>());

    Ok(Json(MessageBody::new(format!(
        "{} updated successfully",
        R::NAME
    ))))
}

pub async fn delete_document<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let id = parse_document_id(&id)?;
    match state.db.delete_document_by_id(R::COLLECTION, &id).await {
        Ok(()) => {
            info!("deleted {} {id}", label::<R>());
            Ok(Json(MessageBody::new(format!(
                "{} deleted successfully",
                R::NAME
            ))))
        }
        Err(DatabaseError::NotFound) => Err(ApiError::NotFound {
            what: R::NAME,
            status: StatusCode::NOT_FOUND,
        }),
        Err(e) => Err(ApiError::internal(
            format!("Failed to delete {}", label::<R>()),
            e,
        )),
    }
}
