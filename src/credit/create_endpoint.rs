//! Defines the endpoint for creating a new credit.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState,
    account::get_account,
    credit::core::{Credit, create_credit},
    database_id::AccountId,
    db::lock_connection,
    recurring::Frequency,
    user::UserId,
};

/// The state needed to create a credit.
#[derive(Debug, Clone)]
pub struct CreateCreditState {
    /// The database connection for managing credits.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCreditState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a credit.
#[derive(Debug, Deserialize)]
pub struct CreateCreditBody {
    /// The account repayments are expected to arrive in.
    pub account_id: AccountId,
    /// A short description of the credit.
    pub title: String,
    /// The amount lent.
    pub principal: f64,
    /// An explicit outstanding amount; defaults to the principal.
    pub outstanding: Option<f64>,
    /// When the credit was extended.
    pub start_date: Date,
    /// When the credit is due to be fully repaid.
    pub due_date: Date,
    /// The expected repayment cadence. Defaults to monthly.
    pub frequency: Option<Frequency>,
}

/// A route handler for creating a new credit.
pub async fn create_credit_endpoint(
    State(state): State<CreateCreditState>,
    Extension(user_id): Extension<UserId>,
    Json(body): Json<CreateCreditBody>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    // The repayment account must be one of the caller's own.
    match get_account(body.account_id, &connection) {
        Ok(account) if account.user_id == user_id => {}
        Ok(_) | Err(crate::Error::NotFound) => return crate::Error::NotFound.into_response(),
        Err(error) => return error.into_response(),
    }

    let mut builder = Credit::build(
        user_id,
        body.account_id,
        &body.title,
        body.principal,
        body.start_date,
        body.due_date,
    );
    if let Some(outstanding) = body.outstanding {
        builder = builder.outstanding(outstanding);
    }
    if let Some(frequency) = body.frequency {
        builder = builder.frequency(frequency);
    }

    match create_credit(builder, &connection) {
        Ok(credit) => (StatusCode::CREATED, Json(credit)).into_response(),
        Err(error) => error.into_response(),
    }
}
