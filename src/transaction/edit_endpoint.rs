use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    AppState, Error,
    database_id::TransactionId,
    db::lock_connection,
    share::ensure_edit_access,
    timezone::local_today,
    transaction::core::{Transaction, TransactionPatch, get_transaction, revise_transaction},
    user::UserId,
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for patching a transaction, keeping account balances and
/// credit outstanding amounts consistent with the change.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
    Json(patch): Json<TransactionPatch>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    let old = match get_transaction(transaction_id, &connection) {
        Ok(old) => old,
        Err(error) => return error.into_response(),
    };
    if let Err(error) = ensure_edit_access(old.user_id, user_id, &connection) {
        return error.into_response();
    }

    let updated = (|| {
        let sql_transaction =
            SqlTransaction::new_unchecked(&*connection, TransactionBehavior::Immediate)?;
        let updated = revise_transaction(&old, &patch, today, &sql_transaction)?;
        sql_transaction.commit()?;
        Ok::<Transaction, Error>(updated)
    })();

    match updated {
        Ok(updated) => Json(updated).into_response(),
        Err(error) => error.into_response(),
    }
}
