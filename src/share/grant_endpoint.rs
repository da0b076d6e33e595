//! Defines the endpoint for sharing a dashboard with another user.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    db::lock_connection,
    share::core::{Permission, grant_share},
    user::UserId,
};

/// The state needed to grant a share.
#[derive(Debug, Clone)]
pub struct GrantShareState {
    /// The database connection for managing shares.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GrantShareState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for granting a share.
#[derive(Debug, Deserialize)]
pub struct GrantShareBody {
    /// The user to share the caller's dashboard with.
    pub shared_with_user_id: i64,
    /// What the recipient may do.
    pub permission: Permission,
}

/// A route handler for sharing the caller's dashboard.
pub async fn grant_share_endpoint(
    State(state): State<GrantShareState>,
    Extension(user_id): Extension<UserId>,
    Json(body): Json<GrantShareBody>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match grant_share(
        user_id,
        UserId::new(body.shared_with_user_id),
        body.permission,
        &connection,
    ) {
        Ok(share) => (StatusCode::CREATED, Json(share)).into_response(),
        Err(error) => error.into_response(),
    }
}
