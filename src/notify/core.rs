use rusqlite::{Connection, Row, params};
use serde::Serialize;

use crate::{Error, database_id::PushEndpointId, user::UserId};

/// A registered delivery address for push messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushEndpoint {
    /// The ID of the endpoint registration.
    pub id: PushEndpointId,
    /// The user the endpoint belongs to.
    pub user_id: UserId,
    /// The opaque delivery address the push service understands.
    pub endpoint: String,
}

/// Delivers one message to one registered endpoint.
///
/// The transport is external to this service; implementations wrap whatever
/// delivery mechanism is deployed. Failures are per-endpoint and must never
/// take the calling operation down.
pub trait PushSender {
    /// Attempt to deliver `message` to `endpoint`.
    ///
    /// # Errors
    /// Returns the transport's error message when delivery fails.
    fn send(&self, endpoint: &str, message: &str) -> Result<(), String>;
}

/// A [PushSender] that records deliveries in the log instead of sending them
/// anywhere. The default wiring for development and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPushSender;

impl PushSender for LogPushSender {
    fn send(&self, endpoint: &str, message: &str) -> Result<(), String> {
        tracing::info!("push to {endpoint}: {message}");
        Ok(())
    }
}

pub fn create_push_endpoint_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS push_endpoint (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            endpoint TEXT NOT NULL,
            UNIQUE(user_id, endpoint)
        )",
        (),
    )?;

    Ok(())
}

fn map_push_endpoint_row(row: &Row) -> Result<PushEndpoint, rusqlite::Error> {
    Ok(PushEndpoint {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        endpoint: row.get(2)?,
    })
}

/// Register a delivery address for `user_id`.
///
/// # Errors
/// Returns [Error::DuplicatePushEndpoint] if the address is already
/// registered for this user.
pub fn register_push_endpoint(
    user_id: UserId,
    endpoint: &str,
    connection: &Connection,
) -> Result<PushEndpoint, Error> {
    if endpoint.trim().is_empty() {
        return Err(Error::Validation("push endpoint cannot be empty".to_owned()));
    }

    let endpoint = connection
        .prepare(
            "INSERT INTO push_endpoint (user_id, endpoint) VALUES (?1, ?2)
             RETURNING id, user_id, endpoint",
        )?
        .query_row(params![user_id.as_i64(), endpoint.trim()], map_push_endpoint_row)?;

    Ok(endpoint)
}

/// Retrieve all of `user_id`'s registered endpoints.
pub fn list_push_endpoints(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<PushEndpoint>, Error> {
    connection
        .prepare("SELECT id, user_id, endpoint FROM push_endpoint WHERE user_id = :user_id")?
        .query_map(&[(":user_id", &user_id.as_i64())], map_push_endpoint_row)?
        .map(|maybe_endpoint| maybe_endpoint.map_err(Error::from))
        .collect()
}

pub(crate) fn unregister_push_endpoint(
    id: PushEndpointId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM push_endpoint WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::DeleteMissingPushEndpoint)
    } else {
        Ok(())
    }
}

/// Send `message` to every endpoint registered for `user_id`.
///
/// Each failure is logged and delivery continues with the remaining
/// endpoints; the caller's operation never fails because a notification did.
/// Returns how many endpoints accepted the message.
pub fn notify_user(
    user_id: UserId,
    message: &str,
    sender: &dyn PushSender,
    connection: &Connection,
) -> usize {
    let endpoints = match list_push_endpoints(user_id, connection) {
        Ok(endpoints) => endpoints,
        Err(error) => {
            tracing::error!("Could not list push endpoints for user {user_id}: {error}");
            return 0;
        }
    };

    let mut delivered = 0;
    for endpoint in &endpoints {
        match sender.send(&endpoint.endpoint, message) {
            Ok(()) => delivered += 1,
            Err(error) => {
                tracing::warn!("Push delivery to {} failed: {error}", endpoint.endpoint);
            }
        }
    }

    delivered
}

#[cfg(test)]
mod notify_tests {
    use std::sync::Mutex;

    use rusqlite::Connection;

    use crate::{Error, db::initialize, user::UserId};

    use super::{
        PushSender, list_push_endpoints, notify_user, register_push_endpoint,
        unregister_push_endpoint,
    };

    /// Fails for endpoints containing "down", records the rest.
    struct FlakySender {
        delivered: Mutex<Vec<String>>,
    }

    impl PushSender for FlakySender {
        fn send(&self, endpoint: &str, _message: &str) -> Result<(), String> {
            if endpoint.contains("down") {
                return Err("connection refused".to_owned());
            }
            self.delivered.lock().unwrap().push(endpoint.to_owned());
            Ok(())
        }
    }

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let conn = get_test_connection();
        register_push_endpoint(UserId::new(1), "device-a", &conn).unwrap();

        let result = register_push_endpoint(UserId::new(1), "device-a", &conn);

        assert_eq!(result, Err(Error::DuplicatePushEndpoint));
    }

    #[test]
    fn failures_are_per_endpoint_and_delivery_continues() {
        let conn = get_test_connection();
        register_push_endpoint(UserId::new(1), "device-a", &conn).unwrap();
        register_push_endpoint(UserId::new(1), "down-device", &conn).unwrap();
        register_push_endpoint(UserId::new(1), "device-b", &conn).unwrap();
        let sender = FlakySender {
            delivered: Mutex::new(Vec::new()),
        };

        let delivered = notify_user(UserId::new(1), "hello", &sender, &conn);

        assert_eq!(delivered, 2);
        assert_eq!(sender.delivered.lock().unwrap().len(), 2);
    }

    #[test]
    fn unregister_removes_the_endpoint() {
        let conn = get_test_connection();
        let endpoint = register_push_endpoint(UserId::new(1), "device-a", &conn).unwrap();

        unregister_push_endpoint(endpoint.id, UserId::new(1), &conn).unwrap();

        assert!(list_push_endpoints(UserId::new(1), &conn).unwrap().is_empty());
    }
}
