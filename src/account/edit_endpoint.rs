use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState,
    account::core::{AccountPatch, update_account},
    database_id::AccountId,
    db::lock_connection,
    user::UserId,
};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating an account.
///
/// The balance is not patchable; it only moves through transaction
/// mutations.
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
    Json(patch): Json<AccountPatch>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match update_account(account_id, user_id, &patch, &connection) {
        Ok(account) => Json(account).into_response(),
        Err(error) => error.into_response(),
    }
}
