use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, account::core::list_accounts, db::lock_connection, share::ensure_read_access,
    user::UserId,
};

/// The state needed to list accounts.
#[derive(Debug, Clone)]
pub struct ListAccountsState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListAccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Optional query parameters for listing another user's accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsParams {
    /// A dashboard owner who has shared their data with the caller.
    pub owner_id: Option<i64>,
}

/// A route handler for listing accounts, the caller's own or a sharing
/// owner's.
pub async fn list_accounts_endpoint(
    State(state): State<ListAccountsState>,
    Extension(user_id): Extension<UserId>,
    Query(params): Query<ListAccountsParams>,
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

    match list_accounts(owner, &connection) {
        Ok(accounts) => Json(accounts).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        account::{Account, create_account},
        db::initialize,
        share::{Permission, grant_share},
        user::UserId,
    };

    use super::{ListAccountsParams, ListAccountsState, list_accounts_endpoint};

    fn get_test_state() -> ListAccountsState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        ListAccountsState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn viewer_without_share_gets_not_found() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_account(Account::build(UserId::new(1), "Checking"), &connection).unwrap();
        }

        let response = list_accounts_endpoint(
            State(state),
            Extension(UserId::new(2)),
            Query(ListAccountsParams { owner_id: Some(1) }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn viewer_with_share_can_list_owner_accounts() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_account(Account::build(UserId::new(1), "Checking"), &connection).unwrap();
            grant_share(UserId::new(1), UserId::new(2), Permission::View, &connection).unwrap();
        }

        let response = list_accounts_endpoint(
            State(state),
            Extension(UserId::new(2)),
            Query(ListAccountsParams { owner_id: Some(1) }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }
}
