use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::{Error, db::lock_connection, user::UserId};

/// The external identity provider, as the rest of the service sees it.
///
/// Production deployments wrap the hosted provider's API; the bundled
/// [SqliteIdentityProvider] keeps hashed session tokens locally, which is
/// enough for development and tests.
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to the user it authenticates, or `None` for a
    /// token the provider does not recognise.
    ///
    /// # Errors
    /// Returns an error when the provider itself cannot be reached.
    fn resolve(&self, token: &str) -> Result<Option<UserId>, Error>;

    /// Delete the provider's record of `user_id`.
    ///
    /// Callers must purge the application's own data first; a failure here
    /// leaves a provider record without data behind it, which is the
    /// degraded-but-recoverable direction.
    ///
    /// # Errors
    /// Returns an error when the provider rejects or cannot perform the
    /// deletion.
    fn delete_user(&self, user_id: UserId) -> Result<(), Error>;
}

fn hash_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .fold(String::with_capacity(64), |mut hex, byte| {
            use std::fmt::Write;

            let _ = write!(hex, "{byte:02x}");
            hex
        })
}

pub fn create_auth_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS auth_session (
            token_hash TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Register a session token for `user_id`. Only the token's hash is stored.
///
/// # Errors
/// Returns [Error::SqlError] if the insertion fails.
pub fn create_session(token: &str, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT OR REPLACE INTO auth_session (token_hash, user_id) VALUES (?1, ?2)",
        rusqlite::params![hash_token(token), user_id.as_i64()],
    )?;

    Ok(())
}

/// An [IdentityProvider] backed by the application's own database.
#[derive(Clone)]
pub struct SqliteIdentityProvider {
    db_connection: Arc<Mutex<Connection>>,
}

impl SqliteIdentityProvider {
    /// Create a provider over the application's database connection.
    pub fn new(db_connection: Arc<Mutex<Connection>>) -> Self {
        Self { db_connection }
    }
}

impl IdentityProvider for SqliteIdentityProvider {
    fn resolve(&self, token: &str) -> Result<Option<UserId>, Error> {
        let connection = lock_connection(&self.db_connection)?;

        let user_id = connection
            .prepare("SELECT user_id FROM auth_session WHERE token_hash = :token_hash")?
            .query_row(&[(":token_hash", &hash_token(token))], |row| {
                row.get::<_, i64>(0)
            });

        match user_id {
            Ok(user_id) => Ok(Some(UserId::new(user_id))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn delete_user(&self, user_id: UserId) -> Result<(), Error> {
        let connection = lock_connection(&self.db_connection)?;

        connection.execute(
            "DELETE FROM auth_session WHERE user_id = :user_id",
            &[(":user_id", &user_id.as_i64())],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod provider_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{db::initialize, user::UserId};

    use super::{IdentityProvider, SqliteIdentityProvider, create_session};

    fn get_test_provider() -> SqliteIdentityProvider {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        SqliteIdentityProvider::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn resolves_a_registered_token() {
        let provider = get_test_provider();
        {
            let connection = provider.db_connection.lock().unwrap();
            create_session("hunter2", UserId::new(42), &connection).unwrap();
        }

        assert_eq!(
            provider.resolve("hunter2").unwrap(),
            Some(UserId::new(42))
        );
    }

    #[test]
    fn unknown_tokens_resolve_to_none() {
        let provider = get_test_provider();

        assert_eq!(provider.resolve("nope").unwrap(), None);
    }

    #[test]
    fn deleting_a_user_invalidates_their_tokens() {
        let provider = get_test_provider();
        {
            let connection = provider.db_connection.lock().unwrap();
            create_session("hunter2", UserId::new(42), &connection).unwrap();
        }

        provider.delete_user(UserId::new(42)).unwrap();

        assert_eq!(provider.resolve("hunter2").unwrap(), None);
    }
}
