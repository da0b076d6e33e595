use rusqlite::{
    Connection, Transaction as SqlTransaction, TransactionBehavior, params,
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    Error,
    transaction::{
        NewTransaction, TRANSACTION_COLUMNS, Transaction, map_transaction_row, post_transaction,
    },
    user::UserId,
};

/// How often a recurring transaction happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    /// A calendar month of variable length.
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(Error::InvalidFrequency(other.to_owned())),
        }
    }
}

fn clamped_date(year: i32, month: time::Month, target_day: u8) -> Date {
    let day = target_day.clamp(1, time::util::days_in_month(month, year));
    Date::from_calendar_date(year, month, day)
        .expect("a day clamped to the month's length is always valid")
}

/// The occurrence after `date` for a template with the given cadence.
///
/// Monthly templates aim for `recurrence_day` (or the template's current day
/// when absent), capped at the target month's last day, so a day-31 template
/// lands on Feb 28/29 and Apr 30 rather than drifting. Yearly templates clamp
/// Feb 29 in non-leap years.
pub fn next_occurrence(date: Date, frequency: Frequency, recurrence_day: Option<u8>) -> Date {
    match frequency {
        Frequency::Daily => date + Duration::days(1),
        Frequency::Weekly => date + Duration::days(7),
        Frequency::Monthly => {
            let (year, month) = match date.month() {
                time::Month::December => (date.year() + 1, time::Month::January),
                month => (date.year(), month.next()),
            };
            clamped_date(year, month, recurrence_day.unwrap_or(date.day()))
        }
        Frequency::Yearly => clamped_date(date.year() + 1, date.month(), date.day()),
    }
}

/// What happened to one template during a processor run.
#[derive(Debug, PartialEq)]
pub enum TemplateOutcome {
    /// A realized copy was posted and the template advanced.
    Posted,
    /// A matching historical copy already existed, so only the advance
    /// happened.
    SkippedDuplicate,
}

/// The tally of a processor run. Failed templates are logged and left behind
/// for the next run; they never abort the batch.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ProcessReport {
    /// Templates that posted a realized copy.
    pub processed: u32,
    /// Templates whose due entry already existed.
    pub skipped: u32,
    /// Templates whose processing errored.
    pub failed: u32,
}

/// Retrieve `user_id`'s templates that are due on or before `today` and have
/// not been processed for their current due date.
pub fn due_templates(
    user_id: UserId,
    today: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}
             FROM \"transaction\"
             WHERE user_id = :user_id
               AND is_recurring = 1
               AND is_active = 1
               AND archived = 0
               AND date <= :today
               AND (last_processed_date IS NULL OR last_processed_date < date)
             ORDER BY date"
        ))?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id.as_i64(),
                ":today": today,
            },
            map_transaction_row,
        )?
        .map(|maybe_template| maybe_template.map_err(Error::from))
        .collect()
}

fn historical_copy_exists(template: &Transaction, connection: &Connection) -> Result<bool, Error> {
    let exists = connection.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM \"transaction\"
            WHERE is_recurring = 0
              AND account_id = :account_id
              AND category_id IS :category_id
              AND amount = :amount
              AND date = :date
        )",
        rusqlite::named_params! {
            ":account_id": template.account_id,
            ":category_id": template.category_id,
            ":amount": template.amount,
            ":date": template.date,
        },
        |row| row.get(0),
    )?;

    Ok(exists)
}

/// Realize one due occurrence of `template` and roll it forward.
///
/// If a matching historical copy already exists, nothing is posted but the
/// template still advances.
///
/// Expects to run inside the caller's SQL transaction.
pub(crate) fn process_template(
    template: &Transaction,
    today: Date,
    connection: &Connection,
) -> Result<TemplateOutcome, Error> {
    let frequency = template
        .recurrence_frequency
        .ok_or_else(|| Error::Validation("recurring transaction has no frequency".to_owned()))?;

    let outcome = if historical_copy_exists(template, connection)? {
        TemplateOutcome::SkippedDuplicate
    } else {
        post_transaction(
            NewTransaction::new(
                template.user_id,
                template.account_id,
                template.amount,
                template.date,
            )
            .kind(template.kind)
            .note(&template.note)
            .category_id(template.category_id)
            .credit_id(template.credit_id)
            .source_template_id(Some(template.id)),
            today,
            connection,
        )?;
        TemplateOutcome::Posted
    };

    let next = next_occurrence(template.date, frequency, template.recurrence_day);
    connection.execute(
        "UPDATE \"transaction\" SET date = ?1, last_processed_date = ?2 WHERE id = ?3",
        params![next, template.date, template.id],
    )?;

    Ok(outcome)
}

fn process_one(
    template: &Transaction,
    today: Date,
    connection: &Connection,
) -> Result<TemplateOutcome, Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;
    let outcome = process_template(template, today, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(outcome)
}

/// Process every due template for `user_id`, one occurrence each.
///
/// Each template commits (or rolls back) on its own, so one broken template
/// cannot take the batch down with it. A template that is overdue for several
/// periods advances a single step per run and catches up across repeated
/// runs.
pub fn process_due_templates(
    user_id: UserId,
    today: Date,
    connection: &Connection,
) -> Result<ProcessReport, Error> {
    let templates = due_templates(user_id, today, connection)?;
    let mut report = ProcessReport::default();

    for template in &templates {
        match process_one(template, today, connection) {
            Ok(TemplateOutcome::Posted) => report.processed += 1,
            Ok(TemplateOutcome::SkippedDuplicate) => {
                tracing::warn!(
                    "Recurring transaction {} already has an entry for {}; advancing without posting",
                    template.id,
                    template.date
                );
                report.skipped += 1;
            }
            Err(error) => {
                tracing::error!(
                    "Could not process recurring transaction {}: {error}",
                    template.id
                );
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod next_occurrence_tests {
    use time::macros::date;

    use super::{Frequency, next_occurrence};

    #[test]
    fn daily_advances_one_day() {
        assert_eq!(
            next_occurrence(date!(2025 - 06 - 15), Frequency::Daily, None),
            date!(2025 - 06 - 16)
        );
    }

    #[test]
    fn weekly_advances_seven_days() {
        assert_eq!(
            next_occurrence(date!(2025 - 06 - 28), Frequency::Weekly, None),
            date!(2025 - 07 - 05)
        );
    }

    #[test]
    fn monthly_day_31_clamps_to_short_months() {
        assert_eq!(
            next_occurrence(date!(2025 - 01 - 31), Frequency::Monthly, None),
            date!(2025 - 02 - 28)
        );
    }

    #[test]
    fn monthly_recovers_to_the_target_day_after_a_short_month() {
        // Clamped to Feb 28, but a recurrence day of 31 climbs back to Mar 31.
        assert_eq!(
            next_occurrence(date!(2025 - 02 - 28), Frequency::Monthly, Some(31)),
            date!(2025 - 03 - 31)
        );
    }

    #[test]
    fn monthly_wraps_the_year() {
        assert_eq!(
            next_occurrence(date!(2025 - 12 - 15), Frequency::Monthly, None),
            date!(2026 - 01 - 15)
        );
    }

    #[test]
    fn monthly_day_31_lands_on_feb_29_in_leap_years() {
        assert_eq!(
            next_occurrence(date!(2024 - 01 - 31), Frequency::Monthly, None),
            date!(2024 - 02 - 29)
        );
    }

    #[test]
    fn yearly_clamps_feb_29() {
        assert_eq!(
            next_occurrence(date!(2024 - 02 - 29), Frequency::Yearly, None),
            date!(2025 - 02 - 28)
        );
    }
}
