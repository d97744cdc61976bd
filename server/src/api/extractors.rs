use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::Value;

use crate::{api::ApiError, models::Fields, uploads::UploadedFile};

/// Name of the multipart part carrying an uploaded image.
const IMAGE_PART: &str = "image";

/// # Submitted fields
///
/// Extracts the fields of a request body sent as JSON, URL-encoded form data or multipart form
/// data, plus the uploaded image if the body is multipart. Bodies of any other content type are
/// treated as empty.
///
/// Form values are always strings; JSON values are kept as sent.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub fields: Fields,
    pub image: Option<UploadedFile>,
    /// Format the body was parsed from, or `None` if its content type is not supported
    pub format: Option<BodyFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    UrlEncoded,
    Multipart,
}

/// Returns whether a submitted value counts as provided.
///
/// Null, `false`, zero and the empty string count as missing.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_none_or(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Submission {
    /// Returns the given fields, failing if any of them is missing.
    pub fn require(&self, keys: &[&str]) -> Result<Fields, ApiError> {
        keys.iter()
            .map(|&key| match self.fields.get(key) {
                Some(value) if is_present(value) => Ok((key.to_owned(), value.clone())),
                _ => Err(ApiError::InvalidFormat),
            })
            .collect()
    }

    /// Returns those of the given fields which are present.
    pub fn present(&self, keys: &[&str]) -> Fields {
        keys.iter()
            .filter_map(|&key| {
                self.fields
                    .get(key)
                    .filter(|value| is_present(value))
                    .map(|value| (key.to_owned(), value.clone()))
            })
            .collect()
    }

    /// Returns those of the given fields which were sent at all, whatever their value.
    pub fn sent(&self, keys: &[&str]) -> Fields {
        keys.iter()
            .filter_map(|&key| {
                self.fields
                    .get(key)
                    .map(|value| (key.to_owned(), value.clone()))
            })
            .collect()
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut submission = Self {
            format: Some(BodyFormat::Multipart),
            ..Self::default()
        };
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if let Some(file_name) = field.file_name().map(str::to_owned) {
                // Only a single image part is accepted
                if name != IMAGE_PART || submission.image.is_some() {
                    return Err(ApiError::InvalidFormat);
                }
                let bytes = field.bytes().await?;
                // Browsers send an empty, unnamed part for a file input left blank
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                submission.image = Some(UploadedFile {
                    file_name: Some(file_name),
                    bytes,
                });
            } else {
                let text = field.text().await?;
                submission.fields.insert(name, Value::String(text));
            }
        }
        Ok(submission)
    }
}

impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<HashMap<String, String>>::from_request(req, state).await?;
            Ok(Self {
                fields: form
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect(),
                image: None,
                format: Some(BodyFormat::UrlEncoded),
            })
        } else if content_type.starts_with("application/json") {
            let Json(fields) = Json::<Fields>::from_request(req, state).await?;
            Ok(Self {
                fields,
                image: None,
                format: Some(BodyFormat::Json),
            })
        } else {
            Ok(Self::default())
        }
    }
}
