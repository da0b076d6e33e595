use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, credit::core::list_credits, db::lock_connection, share::ensure_read_access,
    user::UserId,
};

/// The state needed to list credits.
#[derive(Debug, Clone)]
pub struct ListCreditsState {
    /// The database connection for managing credits.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListCreditsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Optional query parameters for listing another user's credits.
#[derive(Debug, Deserialize)]
pub struct ListCreditsParams {
    /// A dashboard owner who has shared their data with the caller.
    pub owner_id: Option<i64>,
}

/// A route handler for listing credits, the caller's own or a sharing
/// owner's.
pub async fn list_credits_endpoint(
    State(state): State<ListCreditsState>,
    Extension(user_id): Extension<UserId>,
    Query(params): Query<ListCreditsParams>,
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

    match list_credits(owner, &connection) {
        Ok(credits) => Json(credits).into_response(),
        Err(error) => error.into_response(),
    }
}
