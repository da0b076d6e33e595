use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, category::core::update_category, database_id::CategoryId, db::lock_connection,
    user::UserId,
};

/// The state needed to edit a category.
#[derive(Debug, Clone)]
pub struct EditCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for renaming a category.
#[derive(Debug, Deserialize)]
pub struct EditCategoryBody {
    /// The new display name.
    pub name: String,
}

/// A route handler for renaming a category.
pub async fn edit_category_endpoint(
    State(state): State<EditCategoryState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
    Json(body): Json<EditCategoryBody>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match update_category(category_id, user_id, &body.name, &connection) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}
