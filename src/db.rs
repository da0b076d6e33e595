//! Database initialization for the application's tables.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, archive::create_month_closure_table,
    auth::create_auth_session_table, category::create_category_table,
    credit::create_credit_table, notify::create_push_endpoint_table,
    share::create_dashboard_share_table, transaction::create_transaction_table,
};

/// Create the application's tables if they do not exist.
///
/// All tables are created within a single exclusive transaction so a partially
/// initialized database is never left behind.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must be set outside the transaction; SQLite ignores the pragma inside one.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_account_table(&transaction)?;
    create_credit_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_month_closure_table(&transaction)?;
    create_dashboard_share_table(&transaction)?;
    create_push_endpoint_table(&transaction)?;
    create_auth_session_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLock] if the lock has been poisoned by a panicking
/// handler.
pub fn lock_connection(
    connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })
}
