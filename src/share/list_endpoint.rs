use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState,
    db::lock_connection,
    share::core::{DashboardShare, shares_granted_by, shares_received_by},
    user::UserId,
};

/// The state needed to list shares.
#[derive(Debug, Clone)]
pub struct ListSharesState {
    /// The database connection for managing shares.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListSharesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Shares involving the caller, split by direction.
#[derive(Debug, Serialize)]
pub struct SharesResponse {
    /// Shares the caller granted to other users.
    pub granted: Vec<DashboardShare>,
    /// Shares other users granted to the caller.
    pub received: Vec<DashboardShare>,
}

/// A route handler for listing the caller's shares in both directions.
pub async fn list_shares_endpoint(
    State(state): State<ListSharesState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    let granted = match shares_granted_by(user_id, &connection) {
        Ok(granted) => granted,
        Err(error) => return error.into_response(),
    };
    let received = match shares_received_by(user_id, &connection) {
        Ok(received) => received,
        Err(error) => return error.into_response(),
    };

    Json(SharesResponse { granted, received }).into_response()
}
