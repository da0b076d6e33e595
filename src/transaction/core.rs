//! Defines the core data model and database queries for transactions, plus
//! the orchestration that keeps account balances and credit outstanding
//! amounts consistent with every transaction mutation.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Deserializer, Serialize};
use time::Date;

use crate::{
    Error,
    account::get_account,
    category::get_category,
    credit::{apply_repayment, get_credit, reverse_repayment},
    database_id::{AccountId, CategoryId, CreditId, TransactionId, TransferId},
    ledger,
    recurring::Frequency,
    user::UserId,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money came in.
    Income,
    /// Money went out.
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    fn from_column(value: &str) -> Option<Self> {
        match value {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

/// An event where money moved, or a recurring template describing events that
/// will keep happening.
///
/// Regular rows feed the account's running balance the moment their date is
/// on or before today. Template rows (`is_recurring`) never touch the balance
/// themselves; the recurring processor posts realized copies that do.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user whose dashboard the transaction belongs to (the account's
    /// owner).
    pub user_id: UserId,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// The category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// The positive amount of money moved.
    pub amount: f64,
    /// Whether money came in or went out.
    pub kind: TransactionKind,
    /// When the transaction happened, or for templates, when it is next due.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub note: String,
    /// Whether this row is a recurring template.
    pub is_recurring: bool,
    /// How often a template recurs.
    pub recurrence_frequency: Option<Frequency>,
    /// The day of month a monthly template aims for, clamped to short months.
    pub recurrence_day: Option<u8>,
    /// Whether a template is still being processed.
    pub is_active: bool,
    /// Whether the month archiver has closed this row out.
    pub archived: bool,
    /// The due date the recurring processor last realized for this template.
    pub last_processed_date: Option<Date>,
    /// The credit this transaction repays, if any.
    pub credit_id: Option<CreditId>,
    /// The template this row was realized from, if the recurring processor
    /// posted it.
    pub source_template_id: Option<TransactionId>,
    /// Pairs the two legs of a transfer.
    pub transfer_id: Option<TransferId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        user_id: UserId,
        account_id: AccountId,
        amount: f64,
        date: Date,
    ) -> NewTransaction {
        NewTransaction::new(user_id, account_id, amount, date)
    }
}

/// A builder for creating [Transaction] rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The user whose dashboard the transaction belongs to.
    pub user_id: UserId,
    /// The account the money moves in or out of.
    pub account_id: AccountId,
    /// The positive amount of money moved.
    pub amount: f64,
    /// Whether money came in or went out. Defaults to expense.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub note: String,
    /// The category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// Whether this row is a recurring template.
    pub is_recurring: bool,
    /// How often a template recurs.
    pub recurrence_frequency: Option<Frequency>,
    /// The day of month a monthly template aims for.
    pub recurrence_day: Option<u8>,
    /// The credit this transaction repays, if any.
    pub credit_id: Option<CreditId>,
    /// The template this row was realized from.
    pub source_template_id: Option<TransactionId>,
    /// Pairs the two legs of a transfer.
    pub transfer_id: Option<TransferId>,
}

impl NewTransaction {
    /// Start a new transaction with the required fields; everything else
    /// defaults to a plain, uncategorized expense.
    pub fn new(user_id: UserId, account_id: AccountId, amount: f64, date: Date) -> Self {
        Self {
            user_id,
            account_id,
            amount,
            kind: TransactionKind::Expense,
            date,
            note: String::new(),
            category_id: None,
            is_recurring: false,
            recurrence_frequency: None,
            recurrence_day: None,
            credit_id: None,
            source_template_id: None,
            transfer_id: None,
        }
    }

    /// Set whether money came in or went out.
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the note.
    pub fn note(mut self, note: &str) -> Self {
        self.note = note.to_owned();
        self
    }

    /// Set the category.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Mark the row as a recurring template with the given cadence.
    pub fn recurring(mut self, frequency: Frequency, recurrence_day: Option<u8>) -> Self {
        self.is_recurring = true;
        self.recurrence_frequency = Some(frequency);
        self.recurrence_day = recurrence_day;
        self
    }

    /// Link the transaction to a credit as a repayment.
    pub fn credit_id(mut self, credit_id: Option<CreditId>) -> Self {
        self.credit_id = credit_id;
        self
    }

    /// Record which template the row was realized from.
    pub fn source_template_id(mut self, source_template_id: Option<TransactionId>) -> Self {
        self.source_template_id = source_template_id;
        self
    }

    /// Pair the row with the other leg of a transfer.
    pub fn transfer_id(mut self, transfer_id: Option<TransferId>) -> Self {
        self.transfer_id = transfer_id;
        self
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A partial update for a transaction, applied field-by-field where present.
///
/// For the nullable links (`category_id`, `credit_id`) an absent field leaves
/// the link alone while an explicit `null` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionPatch {
    /// A new amount.
    pub amount: Option<f64>,
    /// A new direction.
    pub kind: Option<TransactionKind>,
    /// A new date.
    pub date: Option<Date>,
    /// A new note.
    pub note: Option<String>,
    /// A new account.
    pub account_id: Option<AccountId>,
    /// A new category link, or `null` to clear it.
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<CategoryId>>,
    /// A new credit link, or `null` to clear it.
    #[serde(default, deserialize_with = "double_option")]
    pub credit_id: Option<Option<CreditId>>,
    /// A new cadence for a template.
    pub recurrence_frequency: Option<Frequency>,
    /// A new target day of month for a monthly template.
    pub recurrence_day: Option<u8>,
    /// Pause or resume a template.
    pub is_active: Option<bool>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                account_id INTEGER NOT NULL,
                category_id INTEGER,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                date TEXT NOT NULL,
                note TEXT NOT NULL DEFAULT '',
                is_recurring INTEGER NOT NULL DEFAULT 0,
                recurrence_frequency TEXT,
                recurrence_day INTEGER,
                is_active INTEGER NOT NULL DEFAULT 1,
                archived INTEGER NOT NULL DEFAULT 0,
                last_processed_date TEXT,
                credit_id INTEGER,
                source_template_id INTEGER,
                transfer_id INTEGER,
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(credit_id) REFERENCES credit(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Composite index used by the recurring processor and the month archiver.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_archived_date
         ON \"transaction\"(user_id, archived, date);",
        (),
    )?;

    Ok(())
}

pub(crate) const TRANSACTION_COLUMNS: &str = "id, user_id, account_id, category_id, amount, kind, date, \
     note, is_recurring, recurrence_frequency, recurrence_day, is_active, archived, \
     last_processed_date, credit_id, source_template_id, transfer_id";

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let kind: String = row.get(5)?;
    let kind = TransactionKind::from_column(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("{kind} is not a valid transaction kind").into(),
        )
    })?;

    let recurrence_frequency: Option<String> = row.get(9)?;
    let recurrence_frequency = recurrence_frequency
        .map(|value| {
            value.parse::<Frequency>().map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(
                    9,
                    rusqlite::types::Type::Text,
                    error.to_string().into(),
                )
            })
        })
        .transpose()?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        amount: row.get(4)?,
        kind,
        date: row.get(6)?,
        note: row.get(7)?,
        is_recurring: row.get(8)?,
        recurrence_frequency,
        recurrence_day: row.get(10)?,
        is_active: row.get(11)?,
        archived: row.get(12)?,
        last_processed_date: row.get(13)?,
        credit_id: row.get(14)?,
        source_template_id: row.get(15)?,
        transfer_id: row.get(16)?,
    })
}

/// Insert a transaction row without applying any side effects.
///
/// Most callers want [post_transaction], which also keeps the account balance
/// and any linked credit consistent.
///
/// # Errors
/// Returns [Error::SqlError] if the insertion fails.
pub fn create_transaction(
    builder: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" \
             (user_id, account_id, category_id, amount, kind, date, note, is_recurring, \
              recurrence_frequency, recurrence_day, credit_id, source_template_id, transfer_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                builder.user_id.as_i64(),
                builder.account_id,
                builder.category_id,
                builder.amount,
                builder.kind.as_str(),
                builder.date,
                builder.note,
                builder.is_recurring,
                builder.recurrence_frequency.map(Frequency::as_str),
                builder.recurrence_day,
                builder.credit_id,
                builder.source_template_id,
                builder.transfer_id,
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid transaction.
pub fn get_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Optional filters for listing transactions.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionFilter {
    /// Only transactions on this account.
    pub account_id: Option<AccountId>,
    /// Only archived (or only unarchived) transactions.
    pub archived: Option<bool>,
}

/// Retrieve `user_id`'s transactions, newest first.
pub fn list_transactions(
    user_id: UserId,
    filter: TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = :user_id
               AND (:account_id IS NULL OR account_id = :account_id)
               AND (:archived IS NULL OR archived = :archived)
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id.as_i64(),
                ":account_id": filter.account_id,
                ":archived": filter.archived,
            },
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

fn validate_category(
    category_id: Option<CategoryId>,
    owner: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(category_id) = category_id else {
        return Ok(());
    };

    match get_category(category_id, connection) {
        Ok(category) if category.user_id == owner => Ok(()),
        Ok(_) | Err(Error::NotFound) => Err(Error::InvalidCategory(Some(category_id))),
        Err(error) => Err(error),
    }
}

fn validate_credit(
    credit_id: Option<CreditId>,
    owner: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(credit_id) = credit_id else {
        return Ok(());
    };

    match get_credit(credit_id, connection) {
        Ok(credit) if credit.user_id == owner => Ok(()),
        Ok(_) | Err(Error::NotFound) => Err(Error::NotFound),
        Err(error) => Err(error),
    }
}

/// Insert a transaction and apply its side effects: the ledger effect on the
/// account balance (realized rows dated on or before `today`) and the
/// repayment against a linked credit.
///
/// Callers compose multiple writes, so this expects to run inside the
/// caller's SQL transaction.
///
/// # Errors
/// Returns a:
/// - [Error::Validation] if the amount is not positive or a template has no
///   cadence,
/// - [Error::InvalidCategory] if the category does not belong to the row's
///   owner,
/// - [Error::NotFound] if the credit does not belong to the row's owner,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn post_transaction(
    builder: NewTransaction,
    today: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if builder.amount <= 0.0 {
        return Err(Error::Validation(
            "transaction amount must be positive".to_owned(),
        ));
    }
    if builder.is_recurring && builder.recurrence_frequency.is_none() {
        return Err(Error::Validation(
            "a recurring transaction needs a recurrence frequency".to_owned(),
        ));
    }
    validate_category(builder.category_id, builder.user_id, connection)?;
    validate_credit(builder.credit_id, builder.user_id, connection)?;

    let transaction = create_transaction(builder, connection)?;

    // Templates describe future events; only realized rows move money.
    if !transaction.is_recurring {
        let entry = ledger::Entry::of(&transaction);
        ledger::apply_delta(entry.account_id, ledger::effect(&entry, today), connection)?;

        if let Some(credit_id) = transaction.credit_id {
            apply_repayment(credit_id, transaction.amount, connection)?;
        }
    }

    Ok(transaction)
}

/// Apply a patch to a transaction, adjusting account balances and credit
/// outstanding amounts so the books stay consistent.
///
/// Archived rows are immutable for reporting and cannot be edited.
///
/// Expects to run inside the caller's SQL transaction.
///
/// # Errors
/// Returns a:
/// - [Error::Validation] for non-positive amounts or archived rows,
/// - [Error::NotFound] if a new account or credit does not belong to the
///   row's owner,
/// - [Error::InvalidCategory] if a new category does not belong to the row's
///   owner,
/// - or [Error::UpdateMissingTransaction] if the row disappeared.
pub fn revise_transaction(
    old: &Transaction,
    patch: &TransactionPatch,
    today: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if old.archived {
        return Err(Error::Validation(
            "archived transactions cannot be modified".to_owned(),
        ));
    }

    let amount = patch.amount.unwrap_or(old.amount);
    if amount <= 0.0 {
        return Err(Error::Validation(
            "transaction amount must be positive".to_owned(),
        ));
    }

    let account_id = patch.account_id.unwrap_or(old.account_id);
    if account_id != old.account_id {
        match get_account(account_id, connection) {
            Ok(account) if account.user_id == old.user_id => {}
            Ok(_) | Err(Error::NotFound) => return Err(Error::NotFound),
            Err(error) => return Err(error),
        }
    }

    let category_id = match patch.category_id {
        Some(category_id) => category_id,
        None => old.category_id,
    };
    if category_id != old.category_id {
        validate_category(category_id, old.user_id, connection)?;
    }

    let credit_id = match patch.credit_id {
        Some(credit_id) => credit_id,
        None => old.credit_id,
    };
    if credit_id != old.credit_id {
        validate_credit(credit_id, old.user_id, connection)?;
    }

    let kind = patch.kind.unwrap_or(old.kind);
    let date = patch.date.unwrap_or(old.date);
    let note = patch.note.as_deref().unwrap_or(&old.note);
    let recurrence_frequency = patch.recurrence_frequency.or(old.recurrence_frequency);
    let recurrence_day = patch.recurrence_day.or(old.recurrence_day);
    let is_active = patch.is_active.unwrap_or(old.is_active);

    if !old.is_recurring {
        let new_entry = ledger::Entry {
            account_id,
            kind,
            amount,
            date,
        };
        let adjustments = ledger::edit_adjustments(&ledger::Entry::of(old), &new_entry, today);
        ledger::apply_adjustments(&adjustments, connection)?;

        if old.credit_id != credit_id || old.amount != amount {
            if let Some(old_credit) = old.credit_id {
                reverse_repayment(old_credit, old.amount, connection)?;
            }
            if let Some(new_credit) = credit_id {
                apply_repayment(new_credit, amount, connection)?;
            }
        }
    }

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
        SET \
            account_id = ?1, \
            category_id = ?2, \
            amount = ?3, \
            kind = ?4, \
            date = ?5, \
            note = ?6, \
            recurrence_frequency = ?7, \
            recurrence_day = ?8, \
            is_active = ?9, \
            credit_id = ?10 \
        WHERE id = ?11;",
        params![
            account_id,
            category_id,
            amount,
            kind.as_str(),
            date,
            note,
            recurrence_frequency.map(Frequency::as_str),
            recurrence_day,
            is_active,
            credit_id,
            old.id,
        ],
    )?;
    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    get_transaction(old.id, connection)
}

/// Delete a transaction, reversing its ledger effect (when its date is on or
/// before `today`) and restoring any linked credit.
///
/// Expects to run inside the caller's SQL transaction.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if the row disappeared.
pub fn remove_transaction(
    transaction: &Transaction,
    today: Date,
    connection: &Connection,
) -> Result<(), Error> {
    if !transaction.is_recurring {
        let entry = ledger::Entry::of(transaction);
        ledger::apply_delta(entry.account_id, -ledger::effect(&entry, today), connection)?;

        if let Some(credit_id) = transaction.credit_id {
            reverse_repayment(credit_id, transaction.amount, connection)?;
        }
    }

    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id",
        &[(":id", &transaction.id)],
    )?;

    if rows_affected == 0 {
        Err(Error::DeleteMissingTransaction)
    } else {
        Ok(())
    }
}

// ============================================================================
// TRANSFERS
// ============================================================================

/// Move money between two of `owner`'s accounts by posting an expense leg on
/// the source and an income leg on the destination, paired by a shared
/// transfer ID. Both legs and both balance effects land atomically in the
/// caller's SQL transaction.
///
/// # Errors
/// Returns [Error::Validation] if the two accounts are the same or the amount
/// is not positive.
pub fn create_transfer(
    owner: UserId,
    from_account_id: AccountId,
    to_account_id: AccountId,
    amount: f64,
    date: Date,
    note: &str,
    today: Date,
    connection: &Connection,
) -> Result<(Transaction, Transaction), Error> {
    if from_account_id == to_account_id {
        return Err(Error::Validation(
            "a transfer needs two different accounts".to_owned(),
        ));
    }

    let expense_leg = post_transaction(
        NewTransaction::new(owner, from_account_id, amount, date)
            .kind(TransactionKind::Expense)
            .note(note),
        today,
        connection,
    )?;

    // The expense leg's row ID doubles as the transfer ID for both legs.
    connection.execute(
        "UPDATE \"transaction\" SET transfer_id = ?1 WHERE id = ?1",
        params![expense_leg.id],
    )?;

    let income_leg = post_transaction(
        NewTransaction::new(owner, to_account_id, amount, date)
            .kind(TransactionKind::Income)
            .note(note)
            .transfer_id(Some(expense_leg.id)),
        today,
        connection,
    )?;

    let expense_leg = get_transaction(expense_leg.id, connection)?;

    Ok((expense_leg, income_leg))
}

/// Delete both legs of a transfer, reversing each side's balance effect under
/// the same date condition as any other deletion.
///
/// # Errors
/// Returns [Error::NotFound] if `owner` has no transfer with this ID.
pub fn delete_transfer(
    owner: UserId,
    transfer_id: TransferId,
    today: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let legs: Vec<Transaction> = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE transfer_id = :transfer_id AND user_id = :user_id"
        ))?
        .query_map(
            rusqlite::named_params! {
                ":transfer_id": transfer_id,
                ":user_id": owner.as_i64(),
            },
            map_transaction_row,
        )?
        .collect::<Result<_, _>>()?;

    if legs.is_empty() {
        return Err(Error::NotFound);
    }

    for leg in &legs {
        remove_transaction(leg, today, connection)?;
    }

    Ok(())
}

/// The user whose dashboard a transfer belongs to.
///
/// # Errors
/// Returns [Error::NotFound] if no transfer with this ID exists.
pub fn transfer_owner(
    transfer_id: TransferId,
    connection: &Connection,
) -> Result<UserId, Error> {
    let owner: i64 = connection
        .prepare("SELECT user_id FROM \"transaction\" WHERE transfer_id = :transfer_id LIMIT 1")?
        .query_row(&[(":transfer_id", &transfer_id)], |row| row.get(0))?;

    Ok(UserId::new(owner))
}

// ============================================================================
// TESTS
// ============================================================================




#[cfg(test)]
mod transfer_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, create_account, get_account},
        db::initialize,
        user::UserId,
    };

    use super::{create_transfer, delete_transfer};

    const TODAY: time::Date = date!(2025 - 06 - 15);

    fn setup() -> (Connection, i64, i64) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let checking = create_account(
            Account::build(UserId::new(1), "Checking").opening_balance(100.0),
            &conn,
        )
        .unwrap();
        let savings = create_account(
            Account::build(UserId::new(1), "Savings").opening_balance(50.0),
            &conn,
        )
        .unwrap();
        (conn, checking.id, savings.id)
    }

    #[test]
    fn transfer_debits_source_and_credits_destination() {
        let (conn, checking, savings) = setup();

        let (expense_leg, income_leg) = create_transfer(
            UserId::new(1),
            checking,
            savings,
            40.0,
            date!(2025 - 06 - 14),
            "Top up savings",
            TODAY,
            &conn,
        )
        .unwrap();

        assert_eq!(expense_leg.transfer_id, income_leg.transfer_id);
        assert_eq!(get_account(checking, &conn).unwrap().balance, 60.0);
        assert_eq!(get_account(savings, &conn).unwrap().balance, 90.0);
    }

    #[test]
    fn future_dated_transfer_moves_nothing_yet() {
        let (conn, checking, savings) = setup();

        create_transfer(
            UserId::new(1),
            checking,
            savings,
            40.0,
            date!(2025 - 07 - 01),
            "",
            TODAY,
            &conn,
        )
        .unwrap();

        assert_eq!(get_account(checking, &conn).unwrap().balance, 100.0);
        assert_eq!(get_account(savings, &conn).unwrap().balance, 50.0);
    }

    #[test]
    fn deleting_a_transfer_reverses_both_sides() {
        let (conn, checking, savings) = setup();
        let (expense_leg, _) = create_transfer(
            UserId::new(1),
            checking,
            savings,
            40.0,
            date!(2025 - 06 - 14),
            "",
            TODAY,
            &conn,
        )
        .unwrap();

        delete_transfer(
            UserId::new(1),
            expense_leg.transfer_id.unwrap(),
            TODAY,
            &conn,
        )
        .unwrap();

        assert_eq!(get_account(checking, &conn).unwrap().balance, 100.0);
        assert_eq!(get_account(savings, &conn).unwrap().balance, 50.0);
    }

    #[test]
    fn transfer_to_the_same_account_is_rejected() {
        let (conn, checking, _) = setup();

        let result = create_transfer(
            UserId::new(1),
            checking,
            checking,
            40.0,
            TODAY,
            "",
            TODAY,
            &conn,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
