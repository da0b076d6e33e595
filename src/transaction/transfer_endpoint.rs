//! Defines the endpoints for moving money between two accounts and undoing
//! such a move.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    account::get_account,
    database_id::{AccountId, TransferId},
    db::lock_connection,
    share::ensure_edit_access,
    timezone::local_today,
    transaction::core::{Transaction, create_transfer, delete_transfer, transfer_owner},
    user::UserId,
};

/// The state needed to create or delete a transfer.
#[derive(Debug, Clone)]
pub struct TransferState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for creating a transfer.
#[derive(Debug, Deserialize)]
pub struct CreateTransferBody {
    /// The account to debit.
    pub from_account_id: AccountId,
    /// The account to credit.
    pub to_account_id: AccountId,
    /// The positive amount to move.
    pub amount: f64,
    /// When the money moves. Future dates take effect once due.
    pub date: Date,
    /// A text description of what the transfer was for.
    pub note: Option<String>,
}

/// The two legs of a created transfer.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// The ID shared by both legs.
    pub transfer_id: TransferId,
    /// The expense leg on the source account.
    pub expense: Transaction,
    /// The income leg on the destination account.
    pub income: Transaction,
}

/// A route handler for moving money between two accounts on the same
/// dashboard.
pub async fn create_transfer_endpoint(
    State(state): State<TransferState>,
    Extension(user_id): Extension<UserId>,
    Json(body): Json<CreateTransferBody>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    let from_account = match get_account(body.from_account_id, &connection) {
        Ok(account) => account,
        Err(error) => return error.into_response(),
    };
    let to_account = match get_account(body.to_account_id, &connection) {
        Ok(account) => account,
        Err(error) => return error.into_response(),
    };
    if from_account.user_id != to_account.user_id {
        return Error::Validation("both accounts must belong to the same dashboard".to_owned())
            .into_response();
    }
    if let Err(error) = ensure_edit_access(from_account.user_id, user_id, &connection) {
        return error.into_response();
    }

    let legs = (|| {
        let sql_transaction =
            SqlTransaction::new_unchecked(&*connection, TransactionBehavior::Immediate)?;
        let legs = create_transfer(
            from_account.user_id,
            body.from_account_id,
            body.to_account_id,
            body.amount,
            body.date,
            body.note.as_deref().unwrap_or(""),
            today,
            &sql_transaction,
        )?;
        sql_transaction.commit()?;
        Ok::<(Transaction, Transaction), Error>(legs)
    })();

    match legs {
        Ok((expense, income)) => {
            let transfer_id = expense.transfer_id.unwrap_or(expense.id);
            (
                StatusCode::CREATED,
                Json(TransferResponse {
                    transfer_id,
                    expense,
                    income,
                }),
            )
                .into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// A route handler for deleting both legs of a transfer, reversing each
/// side's balance effect under the usual date condition.
pub async fn delete_transfer_endpoint(
    State(state): State<TransferState>,
    Extension(user_id): Extension<UserId>,
    Path(transfer_id): Path<TransferId>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    let owner = match transfer_owner(transfer_id, &connection) {
        Ok(owner) => owner,
        Err(error) => return error.into_response(),
    };
    if let Err(error) = ensure_edit_access(owner, user_id, &connection) {
        return error.into_response();
    }

    let result = (|| {
        let sql_transaction =
            SqlTransaction::new_unchecked(&*connection, TransactionBehavior::Immediate)?;
        delete_transfer(owner, transfer_id, today, &sql_transaction)?;
        sql_transaction.commit()?;
        Ok::<(), Error>(())
    })();

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}
