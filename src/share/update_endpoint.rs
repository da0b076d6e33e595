use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    database_id::ShareId,
    db::lock_connection,
    share::core::{Permission, update_share},
    user::UserId,
};

/// The state needed to update a share.
#[derive(Debug, Clone)]
pub struct UpdateShareState {
    /// The database connection for managing shares.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateShareState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for changing a share's permission.
#[derive(Debug, Deserialize)]
pub struct UpdateShareBody {
    /// The new permission level.
    pub permission: Permission,
}

/// A route handler for changing the permission on an existing share.
pub async fn update_share_endpoint(
    State(state): State<UpdateShareState>,
    Extension(user_id): Extension<UserId>,
    Path(share_id): Path<ShareId>,
    Json(body): Json<UpdateShareBody>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match update_share(share_id, user_id, body.permission, &connection) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}
