use rusqlite::{Connection, Row, params};
use serde::Serialize;

use crate::{Error, database_id::CategoryId, user::UserId};

/// A label a user attaches to transactions, e.g. "Groceries", "Rent".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The user that owns the category.
    pub user_id: UserId,
    /// The display name of the category.
    pub name: String,
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
    })
}

/// Create a new category for `user_id`.
///
/// # Errors
/// Returns [Error::Validation] if `name` is empty, or [Error::SqlError] on SQL
/// errors.
pub fn create_category(
    user_id: UserId,
    name: &str,
    connection: &Connection,
) -> Result<Category, Error> {
    if name.trim().is_empty() {
        return Err(Error::Validation("category name cannot be empty".to_owned()));
    }

    let category = connection
        .prepare(
            "INSERT INTO category (user_id, name) VALUES (?1, ?2)
             RETURNING id, user_id, name",
        )?
        .query_row(params![user_id.as_i64(), name.trim()], map_category_row)?;

    Ok(category)
}

/// Retrieve a category by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid category.
pub fn get_category(id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    let category = connection
        .prepare("SELECT id, user_id, name FROM category WHERE id = :id")?
        .query_row(&[(":id", &id)], map_category_row)?;

    Ok(category)
}

/// Retrieve all of `user_id`'s categories ordered by name.
pub fn list_categories(user_id: UserId, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, user_id, name FROM category WHERE user_id = :user_id ORDER BY name")?
        .query_map(&[(":user_id", &user_id.as_i64())], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

pub(crate) fn update_category(
    id: CategoryId,
    user_id: UserId,
    name: &str,
    connection: &Connection,
) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::Validation("category name cannot be empty".to_owned()));
    }

    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1 WHERE id = ?2 AND user_id = ?3",
        params![name.trim(), id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::UpdateMissingCategory)
    } else {
        Ok(())
    }
}

pub(crate) fn delete_category(
    id: CategoryId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::DeleteMissingCategory)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod category_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, user::UserId};

    use super::{create_category, delete_category, get_category, list_categories, update_category};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_and_get() {
        let conn = get_test_connection();

        let category = create_category(UserId::new(1), "Groceries", &conn).unwrap();

        assert!(category.id > 0);
        assert_eq!(category.name, "Groceries");
        assert_eq!(get_category(category.id, &conn).unwrap(), category);
    }

    #[test]
    fn create_rejects_empty_name() {
        let conn = get_test_connection();

        let result = create_category(UserId::new(1), "   ", &conn);

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn list_is_scoped_by_user() {
        let conn = get_test_connection();
        create_category(UserId::new(1), "Groceries", &conn).unwrap();
        create_category(UserId::new(2), "Rent", &conn).unwrap();

        let categories = list_categories(UserId::new(1), &conn).unwrap();

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Groceries");
    }

    #[test]
    fn update_fails_for_other_users_category() {
        let conn = get_test_connection();
        let category = create_category(UserId::new(1), "Groceries", &conn).unwrap();

        let result = update_category(category.id, UserId::new(2), "Food", &conn);

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_removes_category() {
        let conn = get_test_connection();
        let category = create_category(UserId::new(1), "Groceries", &conn).unwrap();

        delete_category(category.id, UserId::new(1), &conn).unwrap();

        assert_eq!(get_category(category.id, &conn), Err(Error::NotFound));
    }
}
