//! Fiscus is a web service for tracking personal finances across accounts,
//! recurring obligations, and loans.
//!
//! This library provides a JSON REST API backed by SQLite. Authentication is
//! delegated to an external identity provider; the service trusts the user
//! identifier the provider resolves for each request and scopes every query
//! by it.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod app_state;
mod archive;
mod auth;
mod category;
mod credit;
mod database_id;
mod db;
mod endpoints;
mod ledger;
mod logging;
mod notify;
mod recurring;
mod routing;
mod share;
mod timezone;
mod transaction;
mod user;

pub use app_state::AppState;
pub use auth::{IdentityProvider, SqliteIdentityProvider, create_session};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use notify::{LogPushSender, PushSender};
pub use routing::build_router;
pub use user::UserId;

use crate::database_id::CategoryId;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request carried no token, or a token the identity provider does
    /// not recognise.
    #[error("missing or invalid credentials")]
    Unauthorized,

    /// The request body failed a domain check before any write happened.
    #[error("{0}")]
    Validation(String),

    /// The category ID on a transaction did not match one of the owner's
    /// categories.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// A recurrence frequency string was not one of the supported values.
    #[error("{0} is not a valid recurrence frequency")]
    InvalidFrequency(String),

    /// The requested resource was not found.
    ///
    /// Ownership failures surface as this error too, so the response never
    /// reveals whether a row exists under another user.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The specified account name already exists for this user.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// A dashboard share for this owner and user already exists.
    #[error("a share for that user already exists")]
    DuplicateShare,

    /// The push endpoint is already registered for this user.
    #[error("the push endpoint is already registered")]
    DuplicatePushEndpoint,

    /// A month-change run found no transactions eligible for archiving.
    #[error("nothing to archive")]
    NothingToArchive,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// Tried to update a transaction that does not exist.
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update an account that does not exist.
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that does not exist.
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update a credit that does not exist.
    #[error("tried to update a credit that is not in the database")]
    UpdateMissingCredit,

    /// Tried to delete a credit that does not exist.
    #[error("tried to delete a credit that is not in the database")]
    DeleteMissingCredit,

    /// Tried to update a category that does not exist.
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist.
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a share that does not exist.
    #[error("tried to update a share that is not in the database")]
    UpdateMissingShare,

    /// Tried to delete a share that does not exist.
    #[error("tried to delete a share that is not in the database")]
    DeleteMissingShare,

    /// Tried to delete a push endpoint that does not exist.
    #[error("tried to delete a push endpoint that is not in the database")]
    DeleteMissingPushEndpoint,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("dashboard_share") =>
            {
                Error::DuplicateShare
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("push_endpoint") =>
            {
                Error::DuplicatePushEndpoint
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Validation(_)
            | Error::InvalidCategory(_)
            | Error::InvalidFrequency(_)
            | Error::DuplicateAccountName(_)
            | Error::DuplicateShare
            | Error::DuplicatePushEndpoint => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingAccount
            | Error::DeleteMissingAccount
            | Error::UpdateMissingCredit
            | Error::DeleteMissingCredit
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory
            | Error::UpdateMissingShare
            | Error::DeleteMissingShare
            | Error::DeleteMissingPushEndpoint => StatusCode::NOT_FOUND,
            Error::NothingToArchive => StatusCode::CONFLICT,
            Error::InvalidTimezone(_) | Error::DatabaseLock | Error::SqlError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Storage and timezone errors are logged in full but only a generic
        // message leaves the server.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn unauthorized_maps_to_401() {
        let response = Error::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn nothing_to_archive_maps_to_409() {
        let response = Error::NothingToArchive.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn sql_errors_are_classified() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(error, Error::NotFound);
    }
}
