use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, credit::core::delete_credit, database_id::CreditId, db::lock_connection,
    user::UserId,
};

/// The state needed to delete a credit.
#[derive(Debug, Clone)]
pub struct DeleteCreditState {
    /// The database connection for managing credits.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCreditState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a credit.
///
/// Repayment transactions keep existing; their credit link is cleared by the
/// schema's ON DELETE SET NULL.
pub async fn delete_credit_endpoint(
    State(state): State<DeleteCreditState>,
    Extension(user_id): Extension<UserId>,
    Path(credit_id): Path<CreditId>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match delete_credit(credit_id, user_id, &connection) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}
