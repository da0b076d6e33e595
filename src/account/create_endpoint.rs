//! Defines the endpoint for creating a new account.
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
    AppState,
    account::core::{Account, AccountKind, create_account},
    db::lock_connection,
    user::UserId,
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountBody {
    /// The display name of the new account.
    pub name: String,
    /// How the account participates in forecasting. Defaults to one-off.
    pub kind: Option<AccountKind>,
    /// The balance the account starts with. Defaults to zero.
    pub opening_balance: Option<f64>,
    /// Whether forecasting views skip this account.
    #[serde(default)]
    pub exclude_from_forecast: bool,
}

/// A route handler for creating a new account.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Extension(user_id): Extension<UserId>,
    Json(body): Json<CreateAccountBody>,
) -> Response {
    let mut builder = Account::build(user_id, &body.name)
        .opening_balance(body.opening_balance.unwrap_or(0.0))
        .exclude_from_forecast(body.exclude_from_forecast);
    if let Some(kind) = body.kind {
        builder = builder.kind(kind);
    }

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match create_account(builder, &connection) {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{account::list_accounts, db::initialize, user::UserId};

    use super::{CreateAccountBody, CreateAccountState, create_account_endpoint};

    #[tokio::test]
    async fn creates_account_with_defaults() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let state = CreateAccountState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = create_account_endpoint(
            State(state.clone()),
            Extension(UserId::new(3)),
            Json(CreateAccountBody {
                name: "Savings".to_owned(),
                kind: None,
                opening_balance: Some(250.0),
                exclude_from_forecast: false,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let connection = state.db_connection.lock().unwrap();
        let accounts = list_accounts(UserId::new(3), &connection).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, 250.0);
    }
}
