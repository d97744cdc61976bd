//! # Account gate
//!
//! Registration and login against the `login` collection. Passwords are stored and compared as
//! sent, and a successful login issues no session.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{debug, info};

use crate::{
    api::{ApiError, AppState, MessageBody, extractors::Submission},
    db::interface::DatabaseError,
    models::{Collection, InsertOneResult},
};

const CREDENTIAL_FIELDS: &[&str] = &["username", "password"];

fn user_exists() -> ApiError {
    ApiError::Conflict {
        message: "Already existing user".into(),
        status: StatusCode::CONFLICT,
    }
}

pub async fn register(
    State(state): State<AppState>,
    submission: Submission,
) -> Result<(StatusCode, Json<InsertOneResult>), ApiError> {
    let credentials = submission.require(CREDENTIAL_FIELDS)?;
    let by_username = submission.require(&["username"])?;

    match state.db.find_document(Collection::Login, &by_username).await {
        Ok(_) => return Err(user_exists()),
        Err(DatabaseError::NotFound) => (),
        Err(e) => return Err(ApiError::internal("Failed to register user", e)),
    }

    let account = match state.db.insert_document(Collection::Login, &credentials).await {
        Ok(account) => account,
        Err(DatabaseError::UniquenessViolation { .. }) => return Err(user_exists()),
        Err(e) => return Err(ApiError::internal("Failed to register user", e)),
    };
    info!("registered account {}", account.id());

    Ok((StatusCode::CREATED, Json(InsertOneResult::from(&account))))
}

pub async fn login(
    State(state): State<AppState>,
    submission: Submission,
) -> Result<Json<MessageBody>, ApiError> {
    let credentials = submission.require(CREDENTIAL_FIELDS)?;

    match state.db.find_document(Collection::Login, &credentials).await {
        Ok(account) => {
            debug!("account {} logged in", account.id());
            Ok(Json(MessageBody::new("login successful")))
        }
        Err(DatabaseError::NotFound) => Err(ApiError::InvalidCredentials),
        Err(e) => Err(ApiError::internal("Failed to log in", e)),
    }
}
