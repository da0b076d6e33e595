//! The user identity type and account-wide data removal.
//!
//! Users are managed by an external identity provider; the application only
//! ever sees an opaque numeric identifier and scopes every query by it.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The identifier the identity provider assigns to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw identifier from the identity provider.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw identifier, for binding into SQL queries.
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remove every row the user owns.
///
/// Shares granted *to* the user are removed along with shares they granted, so
/// no dangling permission edges remain.
///
/// This only touches the application's own tables. Deleting the user's record
/// at the identity provider is a separate, later step so that a provider
/// outage can never leave provider-less data behind.
///
/// # Errors
/// Returns [Error::SqlError] if any of the deletions fail.
pub fn purge_user_data(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let id = user_id.as_i64();

    connection.execute(
        "DELETE FROM \"transaction\" WHERE user_id = :user_id",
        &[(":user_id", &id)],
    )?;
    connection.execute(
        "DELETE FROM credit WHERE user_id = :user_id",
        &[(":user_id", &id)],
    )?;
    connection.execute(
        "DELETE FROM account WHERE user_id = :user_id",
        &[(":user_id", &id)],
    )?;
    connection.execute(
        "DELETE FROM category WHERE user_id = :user_id",
        &[(":user_id", &id)],
    )?;
    connection.execute(
        "DELETE FROM month_closure WHERE user_id = :user_id",
        &[(":user_id", &id)],
    )?;
    connection.execute(
        "DELETE FROM dashboard_share
         WHERE owner_user_id = :user_id OR shared_with_user_id = :user_id",
        &[(":user_id", &id)],
    )?;
    connection.execute(
        "DELETE FROM push_endpoint WHERE user_id = :user_id",
        &[(":user_id", &id)],
    )?;
    connection.execute(
        "DELETE FROM auth_session WHERE user_id = :user_id",
        &[(":user_id", &id)],
    )?;

    Ok(())
}

#[cfg(test)]
mod purge_user_data_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        account::{Account, create_account},
        db::initialize,
        transaction::{NewTransaction, create_transaction},
        user::{UserId, purge_user_data},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn count(table: &str, conn: &Connection) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn removes_only_the_users_rows() {
        let conn = get_test_connection();
        let user = UserId::new(1);
        let other = UserId::new(2);
        for owner in [user, other] {
            let account =
                create_account(Account::build(owner, &format!("Checking {owner}")), &conn)
                    .unwrap();
            create_transaction(
                NewTransaction::new(owner, account.id, 10.0, date!(2025 - 03 - 01)),
                &conn,
            )
            .unwrap();
        }

        purge_user_data(user, &conn).unwrap();

        assert_eq!(count("account", &conn), 1);
        assert_eq!(count("\"transaction\"", &conn), 1);
    }
}
