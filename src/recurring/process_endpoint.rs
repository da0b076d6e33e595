//! Defines the endpoints for running the recurring processor and previewing
//! what it would do.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState,
    db::lock_connection,
    notify::{PushSender, notify_user},
    recurring::core::{due_templates, process_due_templates},
    timezone::local_today,
    user::UserId,
};

/// The state needed to run or preview the recurring processor.
#[derive(Clone)]
pub struct ProcessRecurringState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// Where to deliver the run summary.
    pub push_sender: Arc<dyn PushSender + Send + Sync>,
}

impl FromRef<AppState> for ProcessRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            push_sender: state.push_sender.clone(),
        }
    }
}

/// A route handler that processes the caller's due recurring transactions and
/// reports the tally.
///
/// A summary is pushed to the caller's registered endpoints when anything was
/// posted; delivery failures never fail the run.
pub async fn process_recurring_endpoint(
    State(state): State<ProcessRecurringState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    let report = match process_due_templates(user_id, today, &connection) {
        Ok(report) => report,
        Err(error) => return error.into_response(),
    };

    if report.processed > 0 {
        let message = format!("Processed {} recurring transaction(s)", report.processed);
        notify_user(user_id, &message, state.push_sender.as_ref(), &connection);
    }

    Json(report).into_response()
}

/// A route handler that lists the templates a processor run would realize,
/// without side effects.
pub async fn preview_recurring_endpoint(
    State(state): State<ProcessRecurringState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match due_templates(user_id, today, &connection) {
        Ok(templates) => Json(templates).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        account::{Account, create_account},
        db::initialize,
        notify::LogPushSender,
        recurring::Frequency,
        transaction::{NewTransaction, create_transaction},
        user::UserId,
    };

    use super::{ProcessRecurringState, preview_recurring_endpoint, process_recurring_endpoint};

    fn get_test_state() -> ProcessRecurringState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        ProcessRecurringState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
            push_sender: Arc::new(LogPushSender),
        }
    }

    #[tokio::test]
    async fn preview_lists_due_templates_without_posting() {
        let state = get_test_state();
        let yesterday = OffsetDateTime::now_utc().date() - Duration::days(1);
        {
            let connection = state.db_connection.lock().unwrap();
            let account =
                create_account(Account::build(UserId::new(1), "Checking"), &connection).unwrap();
            create_transaction(
                NewTransaction::new(UserId::new(1), account.id, 30.0, yesterday)
                    .recurring(Frequency::Monthly, None),
                &connection,
            )
            .unwrap();
        }

        let response =
            preview_recurring_endpoint(State(state.clone()), Extension(UserId::new(1))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response =
            process_recurring_endpoint(State(state.clone()), Extension(UserId::new(1))).await;
        assert_eq!(response.status(), StatusCode::OK);

        // Processing realized the copy, so a second preview has nothing due.
        let connection = state.db_connection.lock().unwrap();
        let due = crate::recurring::due_templates(
            UserId::new(1),
            OffsetDateTime::now_utc().date(),
            &connection,
        )
        .unwrap();
        assert!(due.is_empty());
    }
}
