use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{AccountId, CreditId},
    recurring::Frequency,
    user::UserId,
};

/// Money lent out, tracked until the outstanding amount reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credit {
    /// The ID of the credit.
    pub id: CreditId,
    /// The user that owns the credit.
    pub user_id: UserId,
    /// The account repayments are expected to arrive in.
    pub account_id: AccountId,
    /// A short description, e.g. "Car loan to Alex".
    pub title: String,
    /// The amount originally lent.
    pub principal: f64,
    /// The amount still owed. Decreases toward zero with repayments.
    pub outstanding: f64,
    /// When the credit was extended.
    pub start_date: Date,
    /// When the credit is due to be fully repaid.
    pub due_date: Date,
    /// The expected repayment cadence.
    pub frequency: Frequency,
    /// Whether the credit has been fully repaid.
    pub is_closed: bool,
}

impl Credit {
    /// Start building a new credit.
    ///
    /// Shortcut for [NewCredit] for discoverability.
    pub fn build(
        user_id: UserId,
        account_id: AccountId,
        title: &str,
        principal: f64,
        start_date: Date,
        due_date: Date,
    ) -> NewCredit {
        NewCredit {
            user_id,
            account_id,
            title: title.to_owned(),
            principal,
            outstanding: None,
            start_date,
            due_date,
            frequency: Frequency::Monthly,
        }
    }
}

/// A builder for creating [Credit] rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCredit {
    /// The user that will own the credit.
    pub user_id: UserId,
    /// The account repayments are expected to arrive in.
    pub account_id: AccountId,
    /// A short description.
    pub title: String,
    /// The amount originally lent.
    pub principal: f64,
    /// An explicit outstanding amount. Defaults to the principal.
    pub outstanding: Option<f64>,
    /// When the credit was extended.
    pub start_date: Date,
    /// When the credit is due to be fully repaid.
    pub due_date: Date,
    /// The expected repayment cadence.
    pub frequency: Frequency,
}

impl NewCredit {
    /// Override the outstanding amount instead of starting at the principal.
    pub fn outstanding(mut self, outstanding: f64) -> Self {
        self.outstanding = Some(outstanding);
        self
    }

    /// Set the expected repayment cadence.
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }
}

/// A partial update for a credit, applied field-by-field where present.
///
/// `outstanding` is a mutable scalar of record: a direct edit here is not
/// reconciled against the repayment history.
#[derive(Debug, Default, Deserialize)]
pub struct CreditPatch {
    /// A new title.
    pub title: Option<String>,
    /// A new start date.
    pub start_date: Option<Date>,
    /// A new due date.
    pub due_date: Option<Date>,
    /// A new repayment cadence.
    pub frequency: Option<Frequency>,
    /// A new outstanding amount.
    pub outstanding: Option<f64>,
    /// Close or reopen the credit.
    pub is_closed: Option<bool>,
}

pub fn create_credit_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS credit (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            principal REAL NOT NULL,
            outstanding REAL NOT NULL,
            start_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            frequency TEXT NOT NULL,
            is_closed INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )?;

    Ok(())
}

pub fn map_credit_row(row: &Row) -> Result<Credit, rusqlite::Error> {
    let frequency: String = row.get(8)?;
    let frequency = frequency.parse::<Frequency>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            8,
            rusqlite::types::Type::Text,
            error.to_string().into(),
        )
    })?;

    Ok(Credit {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        account_id: row.get(2)?,
        title: row.get(3)?,
        principal: row.get(4)?,
        outstanding: row.get(5)?,
        start_date: row.get(6)?,
        due_date: row.get(7)?,
        frequency,
        is_closed: row.get(9)?,
    })
}

const CREDIT_COLUMNS: &str = "id, user_id, account_id, title, principal, outstanding, \
     start_date, due_date, frequency, is_closed";

/// Create a new credit. The outstanding amount starts at the principal unless
/// the builder carries an explicit override.
///
/// # Errors
/// Returns [Error::Validation] if the principal is not positive, or
/// [Error::SqlError] on SQL errors.
pub fn create_credit(builder: NewCredit, connection: &Connection) -> Result<Credit, Error> {
    if builder.principal <= 0.0 {
        return Err(Error::Validation(
            "credit principal must be positive".to_owned(),
        ));
    }

    let outstanding = builder.outstanding.unwrap_or(builder.principal);

    let credit = connection
        .prepare(&format!(
            "INSERT INTO credit \
             (user_id, account_id, title, principal, outstanding, start_date, due_date, frequency)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {CREDIT_COLUMNS}"
        ))?
        .query_row(
            params![
                builder.user_id.as_i64(),
                builder.account_id,
                builder.title,
                builder.principal,
                outstanding,
                builder.start_date,
                builder.due_date,
                builder.frequency.as_str(),
            ],
            map_credit_row,
        )?;

    Ok(credit)
}

/// Retrieve a credit by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid credit.
pub fn get_credit(id: CreditId, connection: &Connection) -> Result<Credit, Error> {
    let credit = connection
        .prepare(&format!("SELECT {CREDIT_COLUMNS} FROM credit WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_credit_row)?;

    Ok(credit)
}

/// Retrieve all of `user_id`'s credits ordered by due date.
pub fn list_credits(user_id: UserId, connection: &Connection) -> Result<Vec<Credit>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CREDIT_COLUMNS} FROM credit WHERE user_id = :user_id ORDER BY due_date"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_credit_row)?
        .map(|maybe_credit| maybe_credit.map_err(Error::from))
        .collect()
}

pub(crate) fn update_credit(
    id: CreditId,
    user_id: UserId,
    patch: &CreditPatch,
    connection: &Connection,
) -> Result<Credit, Error> {
    let credit = get_credit(id, connection).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingCredit,
        error => error,
    })?;
    if credit.user_id != user_id {
        return Err(Error::UpdateMissingCredit);
    }

    let title = patch.title.as_deref().unwrap_or(&credit.title);
    let start_date = patch.start_date.unwrap_or(credit.start_date);
    let due_date = patch.due_date.unwrap_or(credit.due_date);
    let frequency = patch.frequency.unwrap_or(credit.frequency);
    let outstanding = patch.outstanding.unwrap_or(credit.outstanding);
    let is_closed = patch.is_closed.unwrap_or(credit.is_closed);

    connection.execute(
        "UPDATE credit SET \
            title = ?1, \
            start_date = ?2, \
            due_date = ?3, \
            frequency = ?4, \
            outstanding = ?5, \
            is_closed = ?6 \
        WHERE id = ?7",
        params![
            title,
            start_date,
            due_date,
            frequency.as_str(),
            outstanding,
            is_closed,
            id,
        ],
    )?;

    get_credit(id, connection)
}

pub(crate) fn delete_credit(
    id: CreditId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM credit WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::DeleteMissingCredit)
    } else {
        Ok(())
    }
}

/// Record a repayment against a credit: the outstanding amount drops by
/// `amount`, and the credit closes (outstanding clamped to zero) when nothing
/// is left owing.
///
/// Both updates run against the stored value, so callers composing this with
/// other writes should hold a SQL transaction.
///
/// # Errors
/// Returns [Error::UpdateMissingCredit] if `id` does not refer to a valid
/// credit.
pub fn apply_repayment(id: CreditId, amount: f64, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE credit SET outstanding = outstanding - ?1 WHERE id = ?2",
        params![amount, id],
    )?;
    if rows_affected == 0 {
        return Err(Error::UpdateMissingCredit);
    }

    connection.execute(
        "UPDATE credit SET outstanding = 0, is_closed = 1 WHERE id = ?1 AND outstanding <= 0",
        params![id],
    )?;

    Ok(())
}

/// Reverse a repayment, e.g. because the linked transaction was deleted: the
/// outstanding amount grows by `amount` and the credit reopens if anything is
/// owed again.
///
/// The amount added back is not capped at the principal, so the outstanding
/// amount can exceed it.
///
/// # Errors
/// Returns [Error::UpdateMissingCredit] if `id` does not refer to a valid
/// credit.
pub fn reverse_repayment(id: CreditId, amount: f64, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE credit SET outstanding = outstanding + ?1 WHERE id = ?2",
        params![amount, id],
    )?;
    if rows_affected == 0 {
        return Err(Error::UpdateMissingCredit);
    }

    connection.execute(
        "UPDATE credit SET is_closed = 0 WHERE id = ?1 AND outstanding > 0",
        params![id],
    )?;

    Ok(())
}

#[cfg(test)]
mod credit_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{Error, db::initialize, user::UserId};

    use super::{
        Credit, CreditPatch, apply_repayment, create_credit, delete_credit, get_credit,
        reverse_repayment, update_credit,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn build_credit(principal: f64) -> super::NewCredit {
        Credit::build(
            UserId::new(1),
            1,
            "Car loan to Alex",
            principal,
            date!(2025 - 01 - 01),
            date!(2026 - 01 - 01),
        )
    }

    #[test]
    fn outstanding_defaults_to_principal() {
        let conn = get_test_connection();

        let credit = create_credit(build_credit(1000.0), &conn).unwrap();

        assert_eq!(credit.outstanding, 1000.0);
        assert!(!credit.is_closed);
    }

    #[test]
    fn explicit_outstanding_override_wins() {
        let conn = get_test_connection();

        let credit = create_credit(build_credit(1000.0).outstanding(400.0), &conn).unwrap();

        assert_eq!(credit.outstanding, 400.0);
    }

    #[test]
    fn repayment_reduces_outstanding() {
        let conn = get_test_connection();
        let credit = create_credit(build_credit(1000.0), &conn).unwrap();

        apply_repayment(credit.id, 200.0, &conn).unwrap();

        let credit = get_credit(credit.id, &conn).unwrap();
        assert_eq!(credit.outstanding, 800.0);
        assert!(!credit.is_closed);
    }

    #[test]
    fn full_repayment_closes_and_clamps_to_zero() {
        let conn = get_test_connection();
        let credit = create_credit(build_credit(1000.0).outstanding(150.0), &conn).unwrap();

        apply_repayment(credit.id, 200.0, &conn).unwrap();

        let credit = get_credit(credit.id, &conn).unwrap();
        assert_eq!(credit.outstanding, 0.0);
        assert!(credit.is_closed);
    }

    #[test]
    fn reversing_a_repayment_reopens_a_closed_credit() {
        let conn = get_test_connection();
        let credit = create_credit(build_credit(1000.0).outstanding(200.0), &conn).unwrap();
        apply_repayment(credit.id, 200.0, &conn).unwrap();
        assert!(get_credit(credit.id, &conn).unwrap().is_closed);

        reverse_repayment(credit.id, 200.0, &conn).unwrap();

        let credit = get_credit(credit.id, &conn).unwrap();
        assert_eq!(credit.outstanding, 200.0);
        assert!(!credit.is_closed);
    }

    #[test]
    fn reversal_is_not_capped_at_the_principal() {
        let conn = get_test_connection();
        let credit = create_credit(build_credit(1000.0), &conn).unwrap();

        reverse_repayment(credit.id, 200.0, &conn).unwrap();

        assert_eq!(get_credit(credit.id, &conn).unwrap().outstanding, 1200.0);
    }

    #[test]
    fn patch_edits_outstanding_directly() {
        let conn = get_test_connection();
        let credit = create_credit(build_credit(1000.0), &conn).unwrap();

        let updated = update_credit(
            credit.id,
            UserId::new(1),
            &CreditPatch {
                outstanding: Some(640.0),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(updated.outstanding, 640.0);
        assert_eq!(updated.title, "Car loan to Alex");
    }

    #[test]
    fn delete_by_non_owner_reads_as_missing() {
        let conn = get_test_connection();
        let credit = create_credit(build_credit(1000.0), &conn).unwrap();

        assert_eq!(
            delete_credit(credit.id, UserId::new(2), &conn),
            Err(Error::DeleteMissingCredit)
        );
    }
}
