//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::get_account,
    database_id::{AccountId, CategoryId, CreditId},
    db::lock_connection,
    recurring::Frequency,
    share::ensure_edit_access,
    timezone::local_today,
    transaction::core::{Transaction, TransactionKind, post_transaction},
    user::UserId,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionBody {
    /// The account the money moves in or out of.
    pub account_id: AccountId,
    /// The positive amount of money moved.
    pub amount: f64,
    /// Whether money came in or went out. Defaults to expense.
    pub kind: Option<TransactionKind>,
    /// When the transaction happened, or for templates, when it is first due.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub note: Option<String>,
    /// The category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// The credit this transaction repays.
    pub credit_id: Option<CreditId>,
    /// Create a recurring template instead of a realized entry.
    #[serde(default)]
    pub is_recurring: bool,
    /// How often a template recurs. Required when `is_recurring` is set.
    pub recurrence_frequency: Option<Frequency>,
    /// The day of month a monthly template aims for.
    pub recurrence_day: Option<u8>,
}

/// A route handler for creating a new transaction on the caller's dashboard
/// or, with an edit share, on another user's.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserId>,
    Json(body): Json<CreateTransactionBody>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    // The row lands on the account owner's dashboard; the caller needs edit
    // access to it.
    let account = match get_account(body.account_id, &connection) {
        Ok(account) => account,
        Err(error) => return error.into_response(),
    };
    if let Err(error) = ensure_edit_access(account.user_id, user_id, &connection) {
        return error.into_response();
    }

    let mut builder = Transaction::build(account.user_id, body.account_id, body.amount, body.date)
        .kind(body.kind.unwrap_or(TransactionKind::Expense))
        .note(body.note.as_deref().unwrap_or(""))
        .category_id(body.category_id)
        .credit_id(body.credit_id);
    if body.is_recurring {
        builder.is_recurring = true;
        builder.recurrence_frequency = body.recurrence_frequency;
        builder.recurrence_day = body.recurrence_day;
    }

    let transaction = (|| {
        let sql_transaction =
            SqlTransaction::new_unchecked(&*connection, TransactionBehavior::Immediate)?;
        let transaction = post_transaction(builder, today, &sql_transaction)?;
        sql_transaction.commit()?;
        Ok::<Transaction, Error>(transaction)
    })();

    match transaction {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        account::{Account, create_account, get_account},
        db::initialize,
        share::{Permission, grant_share},
        user::UserId,
    };

    use super::{CreateTransactionBody, CreateTransactionState, create_transaction_endpoint};

    fn get_test_state() -> CreateTransactionState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn body(account_id: i64, amount: f64) -> CreateTransactionBody {
        CreateTransactionBody {
            account_id,
            amount,
            kind: None,
            date: OffsetDateTime::now_utc().date() - Duration::days(1),
            note: None,
            category_id: None,
            credit_id: None,
            is_recurring: false,
            recurrence_frequency: None,
            recurrence_day: None,
        }
    }

    #[tokio::test]
    async fn owner_can_create_and_the_balance_moves() {
        let state = get_test_state();
        let account = {
            let connection = state.db_connection.lock().unwrap();
            create_account(
                Account::build(UserId::new(1), "Checking").opening_balance(100.0),
                &connection,
            )
            .unwrap()
        };

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(UserId::new(1)),
            Json(body(account.id, 30.0)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_account(account.id, &connection).unwrap().balance, 70.0);
    }

    #[tokio::test]
    async fn view_only_share_cannot_create() {
        let state = get_test_state();
        let account = {
            let connection = state.db_connection.lock().unwrap();
            let account =
                create_account(Account::build(UserId::new(1), "Checking"), &connection).unwrap();
            grant_share(UserId::new(1), UserId::new(2), Permission::View, &connection).unwrap();
            account
        };

        let response = create_transaction_endpoint(
            State(state),
            Extension(UserId::new(2)),
            Json(body(account.id, 30.0)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn edit_share_can_create_on_the_owners_dashboard() {
        let state = get_test_state();
        let account = {
            let connection = state.db_connection.lock().unwrap();
            let account =
                create_account(Account::build(UserId::new(1), "Checking"), &connection).unwrap();
            grant_share(UserId::new(1), UserId::new(2), Permission::Edit, &connection).unwrap();
            account
        };

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(UserId::new(2)),
            Json(body(account.id, 30.0)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        // The row belongs to the owner's dashboard, not the editor's.
        let connection = state.db_connection.lock().unwrap();
        let transactions = crate::transaction::list_transactions(
            UserId::new(1),
            crate::transaction::TransactionFilter::default(),
            &connection,
        )
        .unwrap();
        assert_eq!(transactions.len(), 1);
    }
}
