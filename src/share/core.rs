use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::ShareId, user::UserId};

/// What a share allows the recipient to do with the owner's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Read-only access to the owner's accounts, transactions, credits and
    /// closures.
    View,
    /// View access plus mutation of the owner's transactions.
    Edit,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::View => "view",
            Permission::Edit => "edit",
        }
    }

    fn from_column(value: &str) -> Result<Self, rusqlite::types::FromSqlError> {
        match value {
            "view" => Ok(Permission::View),
            "edit" => Ok(Permission::Edit),
            _ => Err(rusqlite::types::FromSqlError::InvalidType),
        }
    }
}

/// An access-control edge from a dashboard owner to another user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardShare {
    /// The ID of the share.
    pub id: ShareId,
    /// The user whose dashboard is shared.
    pub owner_user_id: UserId,
    /// The user the dashboard is shared with.
    pub shared_with_user_id: UserId,
    /// What the recipient may do.
    pub permission: Permission,
}

pub fn create_dashboard_share_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS dashboard_share (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_user_id INTEGER NOT NULL,
            shared_with_user_id INTEGER NOT NULL,
            permission TEXT NOT NULL,
            UNIQUE(owner_user_id, shared_with_user_id)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_dashboard_share_row(row: &Row) -> Result<DashboardShare, rusqlite::Error> {
    let permission: String = row.get(3)?;
    let permission = Permission::from_column(&permission).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(DashboardShare {
        id: row.get(0)?,
        owner_user_id: UserId::new(row.get(1)?),
        shared_with_user_id: UserId::new(row.get(2)?),
        permission,
    })
}

/// Grant `shared_with` access to `owner`'s dashboard.
///
/// # Errors
/// Returns [Error::Validation] when sharing with oneself, or
/// [Error::DuplicateShare] when an edge for this pair already exists.
pub fn grant_share(
    owner: UserId,
    shared_with: UserId,
    permission: Permission,
    connection: &Connection,
) -> Result<DashboardShare, Error> {
    if owner == shared_with {
        return Err(Error::Validation(
            "a dashboard cannot be shared with its owner".to_owned(),
        ));
    }

    let share = connection
        .prepare(
            "INSERT INTO dashboard_share (owner_user_id, shared_with_user_id, permission)
             VALUES (?1, ?2, ?3)
             RETURNING id, owner_user_id, shared_with_user_id, permission",
        )?
        .query_row(
            params![owner.as_i64(), shared_with.as_i64(), permission.as_str()],
            map_dashboard_share_row,
        )?;

    Ok(share)
}

pub(crate) fn update_share(
    id: ShareId,
    owner: UserId,
    permission: Permission,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE dashboard_share SET permission = ?1 WHERE id = ?2 AND owner_user_id = ?3",
        params![permission.as_str(), id, owner.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::UpdateMissingShare)
    } else {
        Ok(())
    }
}

pub(crate) fn revoke_share(
    id: ShareId,
    owner: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM dashboard_share WHERE id = ?1 AND owner_user_id = ?2",
        params![id, owner.as_i64()],
    )?;

    if rows_affected == 0 {
        Err(Error::DeleteMissingShare)
    } else {
        Ok(())
    }
}

pub(crate) fn shares_granted_by(
    owner: UserId,
    connection: &Connection,
) -> Result<Vec<DashboardShare>, Error> {
    connection
        .prepare(
            "SELECT id, owner_user_id, shared_with_user_id, permission
             FROM dashboard_share WHERE owner_user_id = :owner",
        )?
        .query_map(&[(":owner", &owner.as_i64())], map_dashboard_share_row)?
        .map(|maybe_share| maybe_share.map_err(Error::from))
        .collect()
}

pub(crate) fn shares_received_by(
    user: UserId,
    connection: &Connection,
) -> Result<Vec<DashboardShare>, Error> {
    connection
        .prepare(
            "SELECT id, owner_user_id, shared_with_user_id, permission
             FROM dashboard_share WHERE shared_with_user_id = :user",
        )?
        .query_map(&[(":user", &user.as_i64())], map_dashboard_share_row)?
        .map(|maybe_share| maybe_share.map_err(Error::from))
        .collect()
}

fn permission_between(
    owner: UserId,
    viewer: UserId,
    connection: &Connection,
) -> Result<Option<Permission>, Error> {
    let mut statement = connection.prepare(
        "SELECT permission FROM dashboard_share
         WHERE owner_user_id = :owner AND shared_with_user_id = :viewer",
    )?;
    let permission = statement
        .query_row(
            &[(":owner", &owner.as_i64()), (":viewer", &viewer.as_i64())],
            |row| row.get::<_, String>(0),
        )
        .map(|value| Permission::from_column(&value).ok());

    match permission {
        Ok(permission) => Ok(permission),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Check that `viewer` may read `owner`'s data.
///
/// # Errors
/// Returns [Error::NotFound] when no share exists, so the response leaks
/// nothing about the owner's data.
pub fn ensure_read_access(
    owner: UserId,
    viewer: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    if owner == viewer {
        return Ok(());
    }

    match permission_between(owner, viewer, connection)? {
        Some(_) => Ok(()),
        None => Err(Error::NotFound),
    }
}

/// Check that `viewer` may mutate transactions on `owner`'s accounts.
///
/// # Errors
/// Returns [Error::NotFound] when no edit share exists.
pub fn ensure_edit_access(
    owner: UserId,
    viewer: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    if owner == viewer {
        return Ok(());
    }

    match permission_between(owner, viewer, connection)? {
        Some(Permission::Edit) => Ok(()),
        _ => Err(Error::NotFound),
    }
}

#[cfg(test)]
mod share_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, user::UserId};

    use super::{
        Permission, ensure_edit_access, ensure_read_access, grant_share, revoke_share,
        shares_granted_by, shares_received_by, update_share,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn owners_always_have_access_to_their_own_data() {
        let conn = get_test_connection();
        let user = UserId::new(1);

        assert_eq!(ensure_read_access(user, user, &conn), Ok(()));
        assert_eq!(ensure_edit_access(user, user, &conn), Ok(()));
    }

    #[test]
    fn view_share_grants_read_but_not_edit() {
        let conn = get_test_connection();
        let owner = UserId::new(1);
        let viewer = UserId::new(2);
        grant_share(owner, viewer, Permission::View, &conn).unwrap();

        assert_eq!(ensure_read_access(owner, viewer, &conn), Ok(()));
        assert_eq!(
            ensure_edit_access(owner, viewer, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn edit_share_grants_both() {
        let conn = get_test_connection();
        let owner = UserId::new(1);
        let editor = UserId::new(2);
        grant_share(owner, editor, Permission::Edit, &conn).unwrap();

        assert_eq!(ensure_read_access(owner, editor, &conn), Ok(()));
        assert_eq!(ensure_edit_access(owner, editor, &conn), Ok(()));
    }

    #[test]
    fn missing_share_reads_as_not_found() {
        let conn = get_test_connection();

        assert_eq!(
            ensure_read_access(UserId::new(1), UserId::new(2), &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn cannot_share_with_self() {
        let conn = get_test_connection();
        let user = UserId::new(1);

        let result = grant_share(user, user, Permission::View, &conn);

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn duplicate_share_is_rejected() {
        let conn = get_test_connection();
        let owner = UserId::new(1);
        let viewer = UserId::new(2);
        grant_share(owner, viewer, Permission::View, &conn).unwrap();

        let result = grant_share(owner, viewer, Permission::Edit, &conn);

        assert_eq!(result, Err(Error::DuplicateShare));
    }

    #[test]
    fn update_changes_permission() {
        let conn = get_test_connection();
        let owner = UserId::new(1);
        let viewer = UserId::new(2);
        let share = grant_share(owner, viewer, Permission::View, &conn).unwrap();

        update_share(share.id, owner, Permission::Edit, &conn).unwrap();

        assert_eq!(ensure_edit_access(owner, viewer, &conn), Ok(()));
    }

    #[test]
    fn only_the_owner_can_revoke() {
        let conn = get_test_connection();
        let owner = UserId::new(1);
        let viewer = UserId::new(2);
        let share = grant_share(owner, viewer, Permission::View, &conn).unwrap();

        assert_eq!(
            revoke_share(share.id, viewer, &conn),
            Err(Error::DeleteMissingShare)
        );
        assert_eq!(revoke_share(share.id, owner, &conn), Ok(()));
        assert_eq!(
            ensure_read_access(owner, viewer, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn listing_splits_granted_and_received() {
        let conn = get_test_connection();
        let owner = UserId::new(1);
        let viewer = UserId::new(2);
        grant_share(owner, viewer, Permission::View, &conn).unwrap();

        assert_eq!(shares_granted_by(owner, &conn).unwrap().len(), 1);
        assert_eq!(shares_received_by(viewer, &conn).unwrap().len(), 1);
        assert!(shares_granted_by(viewer, &conn).unwrap().is_empty());
    }
}
