//! Keeps each account's running balance consistent with its transactions.
//!
//! Every create, edit, delete, and transfer of a dated monetary transaction
//! computes a signed delta and applies it to exactly the account(s) affected,
//! but only once the transaction's date is on or before "today". Future-dated
//! transactions leave the stored balance untouched until they become due.
//!
//! Deltas are applied as atomic `balance = balance + ?` updates so that, run
//! inside the caller's SQL transaction, the transaction row and its balance
//! effect commit or fail together. Recurring templates never pass through
//! here; only realized entries do.

use rusqlite::{Connection, params};
use time::Date;

use crate::{
    Error,
    database_id::AccountId,
    transaction::{Transaction, TransactionKind},
};

/// The balance-relevant fields of a transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// Whether money came in or went out.
    pub kind: TransactionKind,
    /// The positive amount of money moved.
    pub amount: f64,
    /// When the money moved.
    pub date: Date,
}

impl Entry {
    /// The balance-relevant view of a stored transaction.
    pub fn of(transaction: &Transaction) -> Self {
        Self {
            account_id: transaction.account_id,
            kind: transaction.kind,
            amount: transaction.amount,
            date: transaction.date,
        }
    }
}

/// The signed value of an amount: income adds, expense subtracts.
pub fn signed_amount(kind: TransactionKind, amount: f64) -> f64 {
    match kind {
        TransactionKind::Income => amount,
        TransactionKind::Expense => -amount,
    }
}

/// The signed effect an entry has on its account's balance as of `today`.
///
/// Zero for future-dated entries.
pub fn effect(entry: &Entry, today: Date) -> f64 {
    if entry.date <= today {
        signed_amount(entry.kind, entry.amount)
    } else {
        0.0
    }
}

/// Add `delta` to the account's running balance.
///
/// # Errors
/// Returns [Error::UpdateMissingAccount] if `account_id` does not refer to a
/// valid account.
pub fn apply_delta(account_id: AccountId, delta: f64, connection: &Connection) -> Result<(), Error> {
    if delta == 0.0 {
        return Ok(());
    }

    let rows_affected = connection.execute(
        "UPDATE account SET balance = balance + ?1 WHERE id = ?2",
        params![delta, account_id],
    )?;

    if rows_affected == 0 {
        Err(Error::UpdateMissingAccount)
    } else {
        Ok(())
    }
}

/// The per-account deltas needed to move the books from `old` to `new`.
///
/// When the account is unchanged this is a single net delta. When the entry
/// moves between accounts, the old account receives only the reversal of the
/// old effect and the new account only the new effect; the two adjustments are
/// never conflated onto one account.
pub fn edit_adjustments(old: &Entry, new: &Entry, today: Date) -> Vec<(AccountId, f64)> {
    let old_effect = effect(old, today);
    let new_effect = effect(new, today);

    if old.account_id == new.account_id {
        vec![(old.account_id, new_effect - old_effect)]
    } else {
        vec![(old.account_id, -old_effect), (new.account_id, new_effect)]
    }
}

/// Apply each adjustment produced by [edit_adjustments].
pub fn apply_adjustments(
    adjustments: &[(AccountId, f64)],
    connection: &Connection,
) -> Result<(), Error> {
    for (account_id, delta) in adjustments {
        apply_delta(*account_id, *delta, connection)?;
    }

    Ok(())
}



#[cfg(test)]
mod apply_delta_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{Account, create_account, get_account},
        db::initialize,
        user::UserId,
    };

    use super::apply_delta;

    #[test]
    fn adds_delta_to_stored_balance() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let account = create_account(
            Account::build(UserId::new(1), "Checking").opening_balance(100.0),
            &conn,
        )
        .unwrap();

        apply_delta(account.id, -30.0, &conn).unwrap();

        assert_eq!(get_account(account.id, &conn).unwrap().balance, 70.0);
    }

    #[test]
    fn missing_account_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        assert_eq!(
            apply_delta(99, 1.0, &conn),
            Err(Error::UpdateMissingAccount)
        );
    }
}
