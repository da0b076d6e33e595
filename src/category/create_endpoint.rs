//! Defines the endpoint for creating a new category.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, category::core::create_category, db::lock_connection, user::UserId};

/// The state needed to create a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryBody {
    /// The display name of the new category.
    pub name: String,
}

/// A route handler for creating a new category.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Extension(user_id): Extension<UserId>,
    Json(body): Json<CreateCategoryBody>,
) -> Response {
    let connection = match lock_connection(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match create_category(user_id, &body.name, &connection) {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{category::list_categories, db::initialize, user::UserId};

    use super::{CreateCategoryBody, CreateCategoryState, create_category_endpoint};

    #[tokio::test]
    async fn creates_category_for_authenticated_user() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let state = CreateCategoryState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = create_category_endpoint(
            State(state.clone()),
            Extension(UserId::new(7)),
            Json(CreateCategoryBody {
                name: "Utilities".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let connection = state.db_connection.lock().unwrap();
        let categories = list_categories(UserId::new(7), &connection).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Utilities");
    }
}
