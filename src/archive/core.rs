use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::Date;

use crate::{Error, database_id::DatabaseId, user::UserId};

/// A recorded, immutable date range whose transactions have been archived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthClosure {
    /// The ID of the closure.
    pub id: DatabaseId,
    /// The user the closure belongs to.
    pub user_id: UserId,
    /// The period label, e.g. "2025-05", derived from the earliest archived
    /// transaction.
    pub month_year: String,
    /// The earliest archived transaction date in the period.
    pub start_date: Date,
    /// The latest archived transaction date in the period.
    pub end_date: Date,
}

/// The result of one archiver run.
#[derive(Debug, PartialEq, Serialize)]
pub struct ArchiveSummary {
    /// The closure that was created or extended.
    pub closure: MonthClosure,
    /// How many transactions were archived.
    pub archived: usize,
}

pub fn create_month_closure_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS month_closure (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            month_year TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            UNIQUE(user_id, month_year)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_month_closure_row(row: &Row) -> Result<MonthClosure, rusqlite::Error> {
    Ok(MonthClosure {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        month_year: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
    })
}

fn month_year_of(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// Close out the past period: mark all of `user_id`'s unarchived transactions
/// strictly before `today` as archived and record the covered range.
///
/// The closure is upserted by `(user_id, month_year)`, where the label comes
/// from the earliest selected transaction, so re-closing the same month
/// extends the existing record instead of duplicating it. Archiving is
/// monotonic; nothing ever unarchives.
///
/// Expects to run inside the caller's SQL transaction so the closure record
/// and the batch update land together.
///
/// # Errors
/// Returns [Error::NothingToArchive] when no transaction is eligible; no
/// write happens in that case.
pub fn archive_transactions(
    user_id: UserId,
    today: Date,
    connection: &Connection,
) -> Result<ArchiveSummary, Error> {
    let dates: Vec<Date> = connection
        .prepare(
            "SELECT date FROM \"transaction\"
             WHERE user_id = :user_id AND archived = 0 AND date < :today
             ORDER BY date",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id.as_i64(),
                ":today": today,
            },
            |row| row.get(0),
        )?
        .collect::<Result<_, _>>()?;

    let (Some(start_date), Some(end_date)) = (dates.first(), dates.last()) else {
        return Err(Error::NothingToArchive);
    };

    let closure = connection
        .prepare(
            "INSERT INTO month_closure (user_id, month_year, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, month_year) DO UPDATE SET
                start_date = excluded.start_date,
                end_date = excluded.end_date
             RETURNING id, user_id, month_year, start_date, end_date",
        )?
        .query_row(
            params![
                user_id.as_i64(),
                month_year_of(*start_date),
                start_date,
                end_date,
            ],
            map_month_closure_row,
        )?;

    let archived = connection.execute(
        "UPDATE \"transaction\" SET archived = 1
         WHERE user_id = :user_id AND archived = 0 AND date < :today",
        rusqlite::named_params! {
            ":user_id": user_id.as_i64(),
            ":today": today,
        },
    )?;

    Ok(ArchiveSummary { closure, archived })
}

/// Retrieve all of `user_id`'s closures, oldest first.
pub fn list_closures(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<MonthClosure>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, month_year, start_date, end_date
             FROM month_closure WHERE user_id = :user_id ORDER BY start_date",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_month_closure_row)?
        .map(|maybe_closure| maybe_closure.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod archive_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, create_account},
        db::initialize,
        transaction::{
            NewTransaction, TransactionFilter, create_transaction, list_transactions,
        },
        user::UserId,
    };

    use super::{archive_transactions, list_closures};

    const TODAY: time::Date = date!(2025 - 06 - 15);

    fn setup() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let account = create_account(Account::build(UserId::new(1), "Checking"), &conn).unwrap();
        (conn, account.id)
    }

    #[test]
    fn archives_everything_before_today_and_records_the_range() {
        let (conn, account_id) = setup();
        for day in [date!(2025 - 05 - 03), date!(2025 - 05 - 20), date!(2025 - 06 - 14)] {
            create_transaction(
                NewTransaction::new(UserId::new(1), account_id, 10.0, day),
                &conn,
            )
            .unwrap();
        }
        // Today's transaction stays live.
        create_transaction(
            NewTransaction::new(UserId::new(1), account_id, 10.0, TODAY),
            &conn,
        )
        .unwrap();

        let summary = archive_transactions(UserId::new(1), TODAY, &conn).unwrap();

        assert_eq!(summary.archived, 3);
        assert_eq!(summary.closure.month_year, "2025-05");
        assert_eq!(summary.closure.start_date, date!(2025 - 05 - 03));
        assert_eq!(summary.closure.end_date, date!(2025 - 06 - 14));

        let live = list_transactions(
            UserId::new(1),
            TransactionFilter {
                archived: Some(false),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].date, TODAY);
    }

    #[test]
    fn nothing_eligible_reports_an_error_and_writes_nothing() {
        let (conn, account_id) = setup();
        create_transaction(
            NewTransaction::new(UserId::new(1), account_id, 10.0, TODAY),
            &conn,
        )
        .unwrap();

        let result = archive_transactions(UserId::new(1), TODAY, &conn);

        assert_eq!(result.unwrap_err(), Error::NothingToArchive);
        assert!(list_closures(UserId::new(1), &conn).unwrap().is_empty());
        let archived = list_transactions(
            UserId::new(1),
            TransactionFilter {
                archived: Some(true),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();
        assert!(archived.is_empty());
    }

    #[test]
    fn rerunning_is_the_error_outcome_not_a_crash() {
        let (conn, account_id) = setup();
        create_transaction(
            NewTransaction::new(UserId::new(1), account_id, 10.0, date!(2025 - 05 - 03)),
            &conn,
        )
        .unwrap();
        archive_transactions(UserId::new(1), TODAY, &conn).unwrap();

        let result = archive_transactions(UserId::new(1), TODAY, &conn);

        assert_eq!(result.unwrap_err(), Error::NothingToArchive);
        assert_eq!(list_closures(UserId::new(1), &conn).unwrap().len(), 1);
    }

    #[test]
    fn reclosing_the_same_month_extends_the_existing_closure() {
        let (conn, account_id) = setup();
        create_transaction(
            NewTransaction::new(UserId::new(1), account_id, 10.0, date!(2025 - 05 - 03)),
            &conn,
        )
        .unwrap();
        archive_transactions(UserId::new(1), date!(2025 - 05 - 10), &conn).unwrap();

        create_transaction(
            NewTransaction::new(UserId::new(1), account_id, 10.0, date!(2025 - 05 - 20)),
            &conn,
        )
        .unwrap();
        archive_transactions(UserId::new(1), TODAY, &conn).unwrap();

        let closures = list_closures(UserId::new(1), &conn).unwrap();
        assert_eq!(closures.len(), 1);
        assert_eq!(closures[0].month_year, "2025-05");
        assert_eq!(closures[0].end_date, date!(2025 - 05 - 20));
    }

    #[test]
    fn archiving_is_scoped_by_user() {
        let (conn, account_id) = setup();
        create_transaction(
            NewTransaction::new(UserId::new(1), account_id, 10.0, date!(2025 - 05 - 03)),
            &conn,
        )
        .unwrap();

        let result = archive_transactions(UserId::new(2), TODAY, &conn);

        assert_eq!(result.unwrap_err(), Error::NothingToArchive);
    }
}
