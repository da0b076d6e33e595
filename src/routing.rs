//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        list_accounts_endpoint,
    },
    archive::{change_month_endpoint, list_closures_endpoint},
    auth::{auth_guard, delete_user_endpoint},
    category::{
        create_category_endpoint, delete_category_endpoint, edit_category_endpoint,
        list_categories_endpoint,
    },
    credit::{
        create_credit_endpoint, delete_credit_endpoint, edit_credit_endpoint,
        list_credits_endpoint,
    },
    endpoints,
    notify::{register_push_endpoint_endpoint, unregister_push_endpoint_endpoint},
    recurring::{preview_recurring_endpoint, process_recurring_endpoint},
    share::{
        grant_share_endpoint, list_shares_endpoint, revoke_share_endpoint, update_share_endpoint,
    },
    transaction::{
        create_transaction_endpoint, create_transfer_endpoint, delete_transaction_endpoint,
        delete_transfer_endpoint, edit_transaction_endpoint, list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route requires a resolvable identity; the auth guard rejects
/// anything else before a handler runs.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::ACCOUNTS,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT,
            put(edit_account_endpoint).delete(delete_account_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            put(edit_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::TRANSFERS, post(create_transfer_endpoint))
        .route(endpoints::TRANSFER, delete(delete_transfer_endpoint))
        .route(
            endpoints::CREDITS,
            get(list_credits_endpoint).post(create_credit_endpoint),
        )
        .route(
            endpoints::CREDIT,
            put(edit_credit_endpoint).delete(delete_credit_endpoint),
        )
        .route(
            endpoints::SHARES,
            get(list_shares_endpoint).post(grant_share_endpoint),
        )
        .route(
            endpoints::SHARE,
            put(update_share_endpoint).delete(revoke_share_endpoint),
        )
        .route(
            endpoints::PUSH_ENDPOINTS,
            post(register_push_endpoint_endpoint),
        )
        .route(
            endpoints::PUSH_ENDPOINT,
            delete(unregister_push_endpoint_endpoint),
        )
        .route(
            endpoints::PROCESS_RECURRING,
            get(preview_recurring_endpoint).post(process_recurring_endpoint),
        )
        .route(endpoints::CHANGE_MONTH, post(change_month_endpoint))
        .route(endpoints::CLOSURES, get(list_closures_endpoint))
        .route(endpoints::USER, delete(delete_user_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
        .into_response()
}

#[cfg(test)]
mod router_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, auth::create_session, endpoints, user::UserId};

    use super::build_router;

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(conn, "Etc/UTC").unwrap();
        {
            let connection = state.db_connection.lock().unwrap();
            create_session("hunter2", UserId::new(1), &connection).unwrap();
        }

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn routes_reject_anonymous_requests() {
        let server = get_test_server();

        let response = server.get(endpoints::ACCOUNTS).await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn authenticated_requests_reach_the_handlers() {
        let server = get_test_server();

        let response = server
            .get(endpoints::ACCOUNTS)
            .add_header("Authorization", "Bearer hunter2")
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_paths_return_404() {
        let server = get_test_server();

        let response = server.get("/api/nope").await;

        response.assert_status_not_found();
    }
}
