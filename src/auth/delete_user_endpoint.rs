//! Defines the endpoint that removes a user and everything they own.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::Serialize;

use crate::{
    AppState, Error,
    auth::provider::IdentityProvider,
    db::lock_connection,
    user::{UserId, purge_user_data},
};

/// The state needed to delete a user.
#[derive(Clone)]
pub struct DeleteUserState {
    /// The database connection holding the user's data.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The provider holding the user's identity record.
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl FromRef<AppState> for DeleteUserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            identity_provider: state.identity_provider.clone(),
        }
    }
}

/// What the deletion achieved.
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    /// The application's own data is gone.
    pub data_deleted: bool,
    /// Whether the identity provider also dropped its record. `false` means
    /// manual follow-up with the provider is needed; the data is gone either
    /// way.
    pub identity_provider_deleted: bool,
}

/// A route handler that deletes the caller's account.
///
/// The application's rows are purged first, in one SQL transaction; only then
/// is the identity provider asked to drop its record. Losing the provider
/// call leaves a provider record with no data behind it, which is accepted as
/// a degraded outcome and reported for manual follow-up.
pub async fn delete_user_endpoint(
    State(state): State<DeleteUserState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let purged = {
        let connection = match lock_connection(&state.db_connection) {
            Ok(connection) => connection,
            Err(error) => return error.into_response(),
        };

        (|| {
            let sql_transaction =
                SqlTransaction::new_unchecked(&*connection, TransactionBehavior::Immediate)?;
            purge_user_data(user_id, &sql_transaction)?;
            sql_transaction.commit()?;
            Ok::<(), Error>(())
        })()
        // The lock must be released before the provider call; the bundled
        // provider shares this connection.
    };
    if let Err(error) = purged {
        return error.into_response();
    }

    let identity_provider_deleted = match state.identity_provider.delete_user(user_id) {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(
                "User {user_id} data purged but the identity provider deletion failed: {error}"
            );
            false
        }
    };

    Json(DeleteUserResponse {
        data_deleted: true,
        identity_provider_deleted,
    })
    .into_response()
}
