use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, archive::core::list_closures, db::lock_connection, share::ensure_read_access,
    user::UserId,
};

/// The state needed to list closures.
#[derive(Debug, Clone)]
pub struct ListClosuresState {
    /// The database connection for managing closures.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListClosuresState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Optional query parameters for listing another user's closures.
#[derive(Debug, Deserialize)]
pub struct ListClosuresParams {
    /// A dashboard owner who has shared their data with the caller.
    pub owner_id: Option<i64>,
}

/// A route handler for listing month closures for downstream aggregation.
pub async fn list_closures_endpoint(
    State(state): State<ListClosuresState>,
    Extension(user_id): Extension<UserId>,
    Query(params): Query<ListClosuresParams>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    let owner = match params.owner_id {
        Some(owner_id) => {
            let owner = UserId::new(owner_id);
            if let Err(error) = ensure_read_access(owner, user_id, &connection) {
                return error.into_response();
            }
            owner
        }
        None => user_id,
    };

    match list_closures(owner, &connection) {
        Ok(closures) => Json(closures).into_response(),
        Err(error) => error.into_response(),
    }
}
