//! Defines the endpoint that closes out the current period.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    AppState, Error, archive::core::archive_transactions, db::lock_connection,
    timezone::local_today, user::UserId,
};

/// The state needed to run the month archiver.
#[derive(Debug, Clone)]
pub struct ChangeMonthState {
    /// The database connection for managing transactions and closures.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ChangeMonthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler that archives the caller's past transactions and records
/// the closure. The closure upsert and the batch update commit together.
pub async fn change_month_endpoint(
    State(state): State<ChangeMonthState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    let summary = (|| {
        let sql_transaction =
            SqlTransaction::new_unchecked(&*connection, TransactionBehavior::Immediate)?;
        let summary = archive_transactions(user_id, today, &sql_transaction)?;
        sql_transaction.commit()?;
        Ok::<_, Error>(summary)
    })();

    match summary {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => error.into_response(),
    }
}
