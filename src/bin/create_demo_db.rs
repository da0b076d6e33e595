//! Creates a database pre-populated with demo data and a session token for
//! poking at the API locally.

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use fiscus::{AppState, UserId, create_session};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path for the new SQLite database.
    #[arg(long, default_value = "demo.db")]
    db_path: String,
}

const DEMO_TOKEN: &str = "local-dev-token";

fn main() {
    let args = Args::parse();

    let conn = Connection::open(&args.db_path).expect("Could not open the database file.");
    let state = AppState::new(conn, "Etc/UTC").expect("Could not initialize the database.");

    let connection = state.db_connection.lock().expect("Could not lock the database.");
    let user = UserId::new(1);
    create_session(DEMO_TOKEN, user, &connection).expect("Could not create the demo session.");

    let today = OffsetDateTime::now_utc().date();
    let user_id = user.as_i64();

    connection
        .execute(
            "INSERT INTO account (user_id, name, kind, balance, exclude_from_forecast)
             VALUES (?1, 'Checking', 'one_off', 1250.0, 0), (?1, 'Bills', 'mandatory', 600.0, 0)",
            [user_id],
        )
        .expect("Could not create demo accounts.");

    connection
        .execute(
            "INSERT INTO category (user_id, name) VALUES (?1, 'Groceries'), (?1, 'Rent')",
            [user_id],
        )
        .expect("Could not create demo categories.");

    connection
        .execute(
            "INSERT INTO \"transaction\"
                (user_id, account_id, category_id, amount, kind, date, note,
                 is_recurring, recurrence_frequency, recurrence_day)
             VALUES
                (?1, 1, 1, 84.50, 'expense', ?2, 'Weekly shop', 0, NULL, NULL),
                (?1, 2, 2, 1600.0, 'expense', ?3, 'Rent', 1, 'monthly', 1)",
            rusqlite::params![user_id, today - Duration::days(2), today - Duration::days(1)],
        )
        .expect("Could not create demo transactions.");

    println!("Demo database written to {}", args.db_path);
    println!("Authenticate with: Authorization: Bearer {DEMO_TOKEN}");
}
