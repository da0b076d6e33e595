use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, database_id::ShareId, db::lock_connection, share::core::revoke_share, user::UserId,
};

/// The state needed to revoke a share.
#[derive(Debug, Clone)]
pub struct RevokeShareState {
    /// The database connection for managing shares.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RevokeShareState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for revoking a share the caller granted.
pub async fn revoke_share_endpoint(
    State(state): State<RevokeShareState>,
    Extension(user_id): Extension<UserId>,
    Path(share_id): Path<ShareId>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match revoke_share(share_id, user_id, &connection) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}
