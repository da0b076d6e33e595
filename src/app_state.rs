//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    auth::{IdentityProvider, SqliteIdentityProvider},
    db::initialize,
    notify::{LogPushSender, PushSender},
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// Resolves bearer tokens to user identifiers and owns the user records.
    pub identity_provider: Arc<dyn IdentityProvider>,

    /// Delivers push messages to registered endpoints.
    pub push_sender: Arc<dyn PushSender + Send + Sync>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models. `local_timezone` should be a valid, canonical
    /// timezone name, e.g. "Pacific/Auckland". The identity provider and push
    /// sender default to the bundled local implementations; swap them with
    /// [AppState::with_identity_provider] and [AppState::with_push_sender]
    /// when wiring real services.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, local_timezone: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            identity_provider: Arc::new(SqliteIdentityProvider::new(connection.clone())),
            push_sender: Arc::new(LogPushSender),
            db_connection: connection,
        })
    }

    /// Replace the identity provider.
    pub fn with_identity_provider(mut self, identity_provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = identity_provider;
        self
    }

    /// Replace the push sender.
    pub fn with_push_sender(mut self, push_sender: Arc<dyn PushSender + Send + Sync>) -> Self {
        self.push_sender = push_sender;
        self
    }
}
