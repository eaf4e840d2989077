//! Groups and permissions that can be attached to users.
//!
//! These are managed from the command line with the `manage_users` binary.

use rusqlite::{Connection, Row};

use crate::{Error, database_id::DatabaseId, user::UserID};

/// A named collection of permissions that users can belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// The ID of the group.
    pub id: DatabaseId,
    /// The unique name of the group.
    pub name: String,
}

/// A permission that can be granted to a user directly or through a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    /// The ID of the permission.
    pub id: DatabaseId,
    /// The unique short name used to check for the permission, e.g. "view_transaction".
    pub codename: String,
    /// A human readable name.
    pub name: String,
}

/// Create the group, permission and association tables.
///
/// The user table must already exist.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_authorization_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS auth_group (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
                );
        CREATE TABLE IF NOT EXISTS auth_permission (
                id INTEGER PRIMARY KEY,
                codename TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL
                );
        CREATE TABLE IF NOT EXISTS user_group (
                user_id INTEGER NOT NULL,
                group_id INTEGER NOT NULL,
                PRIMARY KEY(user_id, group_id),
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(group_id) REFERENCES auth_group(id) ON DELETE CASCADE
                );
        CREATE TABLE IF NOT EXISTS user_permission (
                user_id INTEGER NOT NULL,
                permission_id INTEGER NOT NULL,
                PRIMARY KEY(user_id, permission_id),
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(permission_id) REFERENCES auth_permission(id) ON DELETE CASCADE
                );
        CREATE TABLE IF NOT EXISTS group_permission (
                group_id INTEGER NOT NULL,
                permission_id INTEGER NOT NULL,
                PRIMARY KEY(group_id, permission_id),
                FOREIGN KEY(group_id) REFERENCES auth_group(id) ON DELETE CASCADE,
                FOREIGN KEY(permission_id) REFERENCES auth_permission(id) ON DELETE CASCADE
                );",
    )
}

fn map_group_row(row: &Row) -> Result<Group, rusqlite::Error> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn map_permission_row(row: &Row) -> Result<Permission, rusqlite::Error> {
    Ok(Permission {
        id: row.get(0)?,
        codename: row.get(1)?,
        name: row.get(2)?,
    })
}

/// Map a foreign key failure to [Error::NotFound], since it means the user,
/// group or permission does not exist.
fn map_association_error(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::NotFound,
        error => error.into(),
    }
}

/// Get the group called `name`, creating it if it does not exist.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_or_create_group(name: &str, connection: &Connection) -> Result<Group, Error> {
    connection.execute(
        "INSERT OR IGNORE INTO auth_group (name) VALUES (?1)",
        (name,),
    )?;

    connection
        .prepare("SELECT id, name FROM auth_group WHERE name = :name")?
        .query_row(&[(":name", &name)], map_group_row)
        .map_err(Error::from)
}

/// Get the group called `name`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such group, or [Error::SqlError] for other SQL errors.
pub fn get_group_by_name(name: &str, connection: &Connection) -> Result<Group, Error> {
    connection
        .prepare("SELECT id, name FROM auth_group WHERE name = :name")?
        .query_row(&[(":name", &name)], map_group_row)
        .map_err(Error::from)
}

/// Get the permission with `codename`, creating it with `name` if it does not exist.
///
/// The name of an existing permission is left unchanged.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_or_create_permission(
    codename: &str,
    name: &str,
    connection: &Connection,
) -> Result<Permission, Error> {
    connection.execute(
        "INSERT OR IGNORE INTO auth_permission (codename, name) VALUES (?1, ?2)",
        (codename, name),
    )?;

    connection
        .prepare("SELECT id, codename, name FROM auth_permission WHERE codename = :codename")?
        .query_row(&[(":codename", &codename)], map_permission_row)
        .map_err(Error::from)
}

/// Add the user to the group. Adding a user to a group they are already in does nothing.
///
/// # Errors
/// Returns an [Error::NotFound] if the user or group does not exist.
pub fn add_user_to_group(
    user_id: UserID,
    group_id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    connection
        .execute(
            "INSERT OR IGNORE INTO user_group (user_id, group_id) VALUES (?1, ?2)",
            (user_id.as_i64(), group_id),
        )
        .map_err(map_association_error)?;

    Ok(())
}

/// Remove the user from the group.
///
/// # Errors
/// Returns an [Error::NotFound] if the user is not in the group.
pub fn remove_user_from_group(
    user_id: UserID,
    group_id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM user_group WHERE user_id = ?1 AND group_id = ?2",
        (user_id.as_i64(), group_id),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Grant a permission directly to a user.
///
/// # Errors
/// Returns an [Error::NotFound] if the user or permission does not exist.
pub fn grant_user_permission(
    user_id: UserID,
    permission_id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    connection
        .execute(
            "INSERT OR IGNORE INTO user_permission (user_id, permission_id) VALUES (?1, ?2)",
            (user_id.as_i64(), permission_id),
        )
        .map_err(map_association_error)?;

    Ok(())
}

/// Grant a permission to every member of a group.
///
/// # Errors
/// Returns an [Error::NotFound] if the group or permission does not exist.
pub fn grant_group_permission(
    group_id: DatabaseId,
    permission_id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    connection
        .execute(
            "INSERT OR IGNORE INTO group_permission (group_id, permission_id) VALUES (?1, ?2)",
            (group_id, permission_id),
        )
        .map_err(map_association_error)?;

    Ok(())
}

/// Get the groups the user belongs to, sorted by name.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_user_groups(user_id: UserID, connection: &Connection) -> Result<Vec<Group>, Error> {
    connection
        .prepare(
            "SELECT auth_group.id, auth_group.name
             FROM auth_group
             INNER JOIN user_group ON user_group.group_id = auth_group.id
             WHERE user_group.user_id = :user_id
             ORDER BY auth_group.name",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_group_row)?
        .map(|maybe_group| maybe_group.map_err(Error::from))
        .collect()
}

/// Get the permissions granted to the user directly and through their groups.
///
/// Each permission appears once, sorted by codename.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_user_permissions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Permission>, Error> {
    connection
        .prepare(
            "SELECT auth_permission.id, auth_permission.codename, auth_permission.name
             FROM auth_permission
             INNER JOIN user_permission ON user_permission.permission_id = auth_permission.id
             WHERE user_permission.user_id = :user_id
             UNION
             SELECT auth_permission.id, auth_permission.codename, auth_permission.name
             FROM auth_permission
             INNER JOIN group_permission ON group_permission.permission_id = auth_permission.id
             INNER JOIN user_group ON user_group.group_id = group_permission.group_id
             WHERE user_group.user_id = :user_id
             ORDER BY 2",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_permission_row)?
        .map(|maybe_permission| maybe_permission.map_err(Error::from))
        .collect()
}

/// Check whether the user has the permission with `codename`, either directly
/// or through a group.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn user_has_permission(
    user_id: UserID,
    codename: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    let permissions = get_user_permissions(user_id, connection)?;

    Ok(permissions
        .iter()
        .any(|permission| permission.codename == codename))
}
