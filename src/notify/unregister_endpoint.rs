use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, database_id::PushEndpointId, db::lock_connection,
    notify::core::unregister_push_endpoint, user::UserId,
};

/// The state needed to unregister a push endpoint.
#[derive(Debug, Clone)]
pub struct UnregisterPushEndpointState {
    /// The database connection for managing push endpoints.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UnregisterPushEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for removing a push delivery address.
pub async fn unregister_push_endpoint_endpoint(
    State(state): State<UnregisterPushEndpointState>,
    Extension(user_id): Extension<UserId>,
    Path(endpoint_id): Path<PushEndpointId>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match unregister_push_endpoint(endpoint_id, user_id, &connection) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}
