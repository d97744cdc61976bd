use std::{borrow::Cow, sync::Arc};

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit,
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::{
    db::interface::DatabaseClient,
    models::InsertOneResult,
    uploads::{UPLOADS_ROUTE, UploadStore},
};

mod account;
mod extractors;
mod middleware;
mod resource;
mod resources;

use middleware::CacheControlLayer;
use resource::{create_document, delete_document, list_documents, update_document};
use resources::{Blog, Competition, Education, Project, Skill};

/// How long clients may cache uploaded files. Upload names are never reused.
const UPLOAD_MAX_AGE: chrono::Duration = chrono::Duration::days(1);

struct AppStateInner {
    db: Arc<dyn DatabaseClient>,
    uploads: UploadStore,
}

type AppState = Arc<AppStateInner>;

/// Returns the router serving the whole API, including uploaded files.
///
/// Request bodies larger than `max_request_bytes` are rejected with `413 Payload Too Large`.
pub fn new_api_router(
    db: Arc<dyn DatabaseClient>,
    uploads: UploadStore,
    max_request_bytes: usize,
) -> Router<()> {
    let uploads_service = ServiceBuilder::new()
        .layer(
            CacheControlLayer::new()
                .public()
                .max_age(UPLOAD_MAX_AGE)
                .immutable(true)
                .finish(),
        )
        .service(uploads.service());

    let state = AppStateInner { db, uploads };
    Router::new()
        .route("/health", get(|| async {}))
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route(
            "/education",
            get(list_documents::<Education>).post(create_document::<Education>),
        )
        .route(
            "/education/{id}",
            put(update_document::<Education>).delete(delete_document::<Education>),
        )
        .route("/option/skills/new", post(create_document::<Skill>))
        .route("/skills", get(list_documents::<Skill>))
        .route(
            "/skills/{id}",
            put(update_document::<Skill>).delete(delete_document::<Skill>),
        )
        .route(
            "/projects",
            get(list_documents::<Project>).post(create_document::<Project>),
        )
        .route(
            "/projects/{id}",
            put(update_document::<Project>).delete(delete_document::<Project>),
        )
        .route(
            "/competitions",
            get(list_documents::<Competition>).post(create_document::<Competition>),
        )
        .route(
            "/competitions/{id}",
            put(update_document::<Competition>).delete(delete_document::<Competition>),
        )
        .route(
            "/blogs",
            get(list_documents::<Blog>).post(create_document::<Blog>),
        )
        .route(
            "/blogs/{id}",
            put(update_document::<Blog>).delete(delete_document::<Blog>),
        )
        .nest_service(UPLOADS_ROUTE, uploads_service)
        .layer(
            // order is top to bottom
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_request_bytes)),
        )
        .with_state(Arc::new(state))
}

/// Body of responses that only carry a human-readable message.
#[derive(Debug, Clone, Serialize)]
struct MessageBody {
    message: String,
}

impl MessageBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a successful create response.
#[derive(Debug, Clone, Serialize)]
struct CreatedBody {
    message: String,
    result: InsertOneResult,
}

/// Body of a server error response. The underlying cause is only logged.
#[derive(Debug, Clone, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid format")]
    InvalidFormat,

    #[error("{message}")]
    Conflict {
        message: Cow<'static, str>,
        status: StatusCode,
    },

    #[error("{what} not found")]
    NotFound {
        what: &'static str,
        status: StatusCode,
    },

    #[error("Invalid user")]
    InvalidCredentials,

    #[error("Unsupported content type")]
    UnsupportedContentType,

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{context}: {source}")]
    Internal {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApiError {
    fn internal(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ApiError::Internal {
            context: context.into(),
            source: source.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidFormat => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::UnsupportedContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Conflict { status, .. }
            | ApiError::NotFound { status, .. }
            | ApiError::Rejected { status, .. } => *status,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    ApiError::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )+
    };
}

impl_from_rejection!(
    JsonRejection,
    FormRejection,
    MultipartRejection,
    MultipartError,
);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Internal { context, source } => {
                error!("{context}: {source}");
                (status, Json(ErrorBody { error: context })).into_response()
            }
            other => (status, Json(MessageBody::new(other.to_string()))).into_response(),
        }
    }
}
