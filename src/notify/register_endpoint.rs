//! Defines the endpoint for registering a push delivery address.
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
    AppState, db::lock_connection, notify::core::register_push_endpoint, user::UserId,
};

/// The state needed to register a push endpoint.
#[derive(Debug, Clone)]
pub struct RegisterPushEndpointState {
    /// The database connection for managing push endpoints.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegisterPushEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for registering a push endpoint.
#[derive(Debug, Deserialize)]
pub struct RegisterPushEndpointBody {
    /// The opaque delivery address the push service understands.
    pub endpoint: String,
}

/// A route handler for registering a push delivery address.
pub async fn register_push_endpoint_endpoint(
    State(state): State<RegisterPushEndpointState>,
    Extension(user_id): Extension<UserId>,
    Json(body): Json<RegisterPushEndpointBody>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match register_push_endpoint(user_id, &body.endpoint, &connection) {
        Ok(endpoint) => (StatusCode::CREATED, Json(endpoint)).into_response(),
        Err(error) => error.into_response(),
    }
}
