use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::AccountId, user::UserId};

/// How an account participates in forecasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Holds one-off, discretionary money.
    OneOff,
    /// Holds money earmarked for mandatory outgoings.
    Mandatory,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::OneOff => "one_off",
            AccountKind::Mandatory => "mandatory",
        }
    }

    fn from_column(value: &str) -> Option<Self> {
        match value {
            "one_off" => Some(AccountKind::OneOff),
            "mandatory" => Some(AccountKind::Mandatory),
            _ => None,
        }
    }
}

/// The amount of money available in a bank account, wallet, or similar.
///
/// `balance` is the running balance: the opening value plus the signed effect
/// of every currently existing, non-template transaction dated on or before
/// today. It is adjusted incrementally by the ledger on every transaction
/// mutation, never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserId,
    /// The display name of the account.
    pub name: String,
    /// How the account participates in forecasting.
    pub kind: AccountKind,
    /// The running balance.
    pub balance: f64,
    /// Whether forecasting views skip this account.
    pub exclude_from_forecast: bool,
}

impl Account {
    /// Start building a new account for `user_id`.
    ///
    /// Shortcut for [NewAccount] for discoverability.
    pub fn build(user_id: UserId, name: &str) -> NewAccount {
        NewAccount {
            user_id,
            name: name.to_owned(),
            kind: AccountKind::OneOff,
            opening_balance: 0.0,
            exclude_from_forecast: false,
        }
    }
}

/// A builder for creating [Account] rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The user that will own the account.
    pub user_id: UserId,
    /// The display name of the account. Unique per user.
    pub name: String,
    /// How the account participates in forecasting.
    pub kind: AccountKind,
    /// The balance the account starts with.
    pub opening_balance: f64,
    /// Whether forecasting views skip this account.
    pub exclude_from_forecast: bool,
}

impl NewAccount {
    /// Set the account kind.
    pub fn kind(mut self, kind: AccountKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the balance the account starts with.
    pub fn opening_balance(mut self, opening_balance: f64) -> Self {
        self.opening_balance = opening_balance;
        self
    }

    /// Exclude the account from forecasting views.
    pub fn exclude_from_forecast(mut self, exclude: bool) -> Self {
        self.exclude_from_forecast = exclude;
        self
    }
}

/// A partial update for an account, applied field-by-field where present.
#[derive(Debug, Default, Deserialize)]
pub struct AccountPatch {
    /// A new display name.
    pub name: Option<String>,
    /// A new account kind.
    pub kind: Option<AccountKind>,
    /// A new forecast-exclusion flag.
    pub exclude_from_forecast: Option<bool>,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            balance REAL NOT NULL,
            exclude_from_forecast INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, name)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    let kind: String = row.get(3)?;
    let kind = AccountKind::from_column(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("{kind} is not a valid account kind").into(),
        )
    })?;

    Ok(Account {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
        kind,
        balance: row.get(4)?,
        exclude_from_forecast: row.get(5)?,
    })
}

const ACCOUNT_COLUMNS: &str = "id, user_id, name, kind, balance, exclude_from_forecast";

/// Create a new account.
///
/// # Errors
/// Returns a:
/// - [Error::Validation] if the name is empty,
/// - [Error::DuplicateAccountName] if the user already has an account with
///   this name,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(builder: NewAccount, connection: &Connection) -> Result<Account, Error> {
    if builder.name.trim().is_empty() {
        return Err(Error::Validation("account name cannot be empty".to_owned()));
    }

    connection
        .prepare(&format!(
            "INSERT INTO account (user_id, name, kind, balance, exclude_from_forecast)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {ACCOUNT_COLUMNS}"
        ))?
        .query_row(
            params![
                builder.user_id.as_i64(),
                builder.name.trim(),
                builder.kind.as_str(),
                builder.opening_balance,
                builder.exclude_from_forecast,
            ],
            map_account_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateAccountName(builder.name.trim().to_owned()),
            error => error.into(),
        })
}

/// Retrieve an account by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid account.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    let account = connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_account_row)?;

    Ok(account)
}

/// Retrieve all of `user_id`'s accounts ordered by name.
pub fn list_accounts(user_id: UserId, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = :user_id ORDER BY name"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_account_row)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

pub(crate) fn update_account(
    id: AccountId,
    user_id: UserId,
    patch: &AccountPatch,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = get_account(id, connection).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingAccount,
        error => error,
    })?;
    if account.user_id != user_id {
        return Err(Error::UpdateMissingAccount);
    }

    let name = patch.name.as_deref().unwrap_or(&account.name).trim();
    if name.is_empty() {
        return Err(Error::Validation("account name cannot be empty".to_owned()));
    }
    let kind = patch.kind.unwrap_or(account.kind);
    let exclude = patch
        .exclude_from_forecast
        .unwrap_or(account.exclude_from_forecast);

    connection
        .execute(
            "UPDATE account SET name = ?1, kind = ?2, exclude_from_forecast = ?3 WHERE id = ?4",
            params![name, kind.as_str(), exclude, id],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateAccountName(name.to_owned()),
            error => error.into(),
        })?;

    get_account(id, connection)
}

pub(crate) fn delete_account(
    id: AccountId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::DeleteMissingAccount)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod account_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, user::UserId};

    use super::{
        Account, AccountKind, AccountPatch, create_account, delete_account, get_account,
        list_accounts, update_account,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_sets_opening_balance() {
        let conn = get_test_connection();

        let account = create_account(
            Account::build(UserId::new(1), "Checking").opening_balance(100.0),
            &conn,
        )
        .unwrap();

        assert!(account.id > 0);
        assert_eq!(account.balance, 100.0);
        assert_eq!(account.kind, AccountKind::OneOff);
    }

    #[test]
    fn create_rejects_duplicate_name_for_same_user() {
        let conn = get_test_connection();
        create_account(Account::build(UserId::new(1), "Checking"), &conn).unwrap();

        let result = create_account(Account::build(UserId::new(1), "Checking"), &conn);

        assert_eq!(
            result,
            Err(Error::DuplicateAccountName("Checking".to_owned()))
        );
    }

    #[test]
    fn same_name_is_allowed_across_users() {
        let conn = get_test_connection();
        create_account(Account::build(UserId::new(1), "Checking"), &conn).unwrap();

        let result = create_account(Account::build(UserId::new(2), "Checking"), &conn);

        assert!(result.is_ok());
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let conn = get_test_connection();
        let account = create_account(
            Account::build(UserId::new(1), "Checking").opening_balance(50.0),
            &conn,
        )
        .unwrap();

        let updated = update_account(
            account.id,
            UserId::new(1),
            &AccountPatch {
                kind: Some(AccountKind::Mandatory),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(updated.name, "Checking");
        assert_eq!(updated.kind, AccountKind::Mandatory);
        assert_eq!(updated.balance, 50.0);
    }

    #[test]
    fn patch_by_non_owner_reads_as_missing() {
        let conn = get_test_connection();
        let account = create_account(Account::build(UserId::new(1), "Checking"), &conn).unwrap();

        let result = update_account(
            account.id,
            UserId::new(2),
            &AccountPatch::default(),
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingAccount));
    }

    #[test]
    fn delete_removes_account() {
        let conn = get_test_connection();
        let account = create_account(Account::build(UserId::new(1), "Checking"), &conn).unwrap();

        delete_account(account.id, UserId::new(1), &conn).unwrap();

        assert_eq!(get_account(account.id, &conn), Err(Error::NotFound));
        assert!(list_accounts(UserId::new(1), &conn).unwrap().is_empty());
    }
}
