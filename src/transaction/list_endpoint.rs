use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    database_id::AccountId,
    db::lock_connection,
    share::ensure_read_access,
    transaction::core::{TransactionFilter, list_transactions},
    user::UserId,
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsParams {
    /// A dashboard owner who has shared their data with the caller.
    pub owner_id: Option<i64>,
    /// Only transactions on this account.
    pub account_id: Option<AccountId>,
    /// Only archived (or only unarchived) transactions.
    pub archived: Option<bool>,
}

/// A route handler for listing transactions, the caller's own or a sharing
/// owner's, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserId>,
    Query(params): Query<ListTransactionsParams>,
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

    let filter = TransactionFilter {
        account_id: params.account_id,
        archived: params.archived,
    };

    match list_transactions(owner, filter, &connection) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_response(),
    }
}
