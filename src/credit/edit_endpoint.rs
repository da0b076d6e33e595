use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState,
    credit::core::{CreditPatch, update_credit},
    database_id::CreditId,
    db::lock_connection,
    user::UserId,
};

/// The state needed to edit a credit.
#[derive(Debug, Clone)]
pub struct EditCreditState {
    /// The database connection for managing credits.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCreditState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating a credit.
pub async fn edit_credit_endpoint(
    State(state): State<EditCreditState>,
    Extension(user_id): Extension<UserId>,
    Path(credit_id): Path<CreditId>,
    Json(patch): Json<CreditPatch>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match update_credit(credit_id, user_id, &patch, &connection) {
        Ok(credit) => Json(credit).into_response(),
        Err(error) => error.into_response(),
    }
}
