//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The reasons a string is not a valid username.
///
/// The messages are shown to the user next to the username field.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum UsernameError {
    /// The username is empty or only whitespace.
    #[error("This field is required.")]
    Empty,
    /// The username has more than [Username::MAX_LENGTH] characters.
    #[error("Ensure this value has at most 150 characters (it has {0}).")]
    TooLong(usize),
    /// The username contains something other than letters, numbers and @/./+/-/_.
    #[error(
        "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
    )]
    InvalidCharacters,
}

/// The name a user logs in with.
///
/// Usernames are unique, ignoring case. Only ASCII letters are case folded,
/// so "Émile" and "émile" are two different usernames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// The maximum number of characters in a username.
    pub const MAX_LENGTH: usize = 150;

    /// Validate `raw_username` after trimming surrounding whitespace.
    ///
    /// # Errors
    /// Returns a [UsernameError] if the username is empty, too long, or has
    /// characters other than letters, numbers and @/./+/-/_.
    pub fn new(raw_username: &str) -> Result<Self, UsernameError> {
        let username = raw_username.trim();

        if username.is_empty() {
            return Err(UsernameError::Empty);
        }

        let length = username.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong(length));
        }

        let is_valid_char = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
        if !username.chars().all(is_valid_char) {
            return Err(UsernameError::InvalidCharacters);
        }

        Ok(Self(username.to_owned()))
    }

    /// Create a username without any validation.
    ///
    /// The caller should ensure that `raw_username` is a valid username.
    pub fn new_unchecked(raw_username: &str) -> Self {
        Self(raw_username.to_owned())
    }

    /// The username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with.
    pub username: Username,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// Whether the user is allowed to log in.
    pub is_active: bool,
    /// When the user registered.
    pub date_joined: OffsetDateTime,
    /// When the user last logged in, `None` if they never have.
    pub last_login: Option<OffsetDateTime>,
}

/// The data needed to create a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The name the user logs in with.
    pub username: Username,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                password TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                date_joined TEXT NOT NULL,
                last_login TEXT
                )",
        (),
    )?;

    Ok(())
}

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, password, is_active, date_joined, last_login";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_username: String = row.get(1)?;
    let raw_password_hash: String = row.get(4)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: Username::new_unchecked(&raw_username),
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        is_active: row.get(5)?,
        date_joined: row.get(6)?,
        last_login: row.get(7)?,
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if the username is taken (ignoring case),
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO user (username, first_name, last_name, password, date_joined)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            (
                new_user.username.as_str(),
                &new_user.first_name,
                &new_user.last_name,
                new_user.password_hash.to_string(),
                OffsetDateTime::now_utc(),
            ),
            map_user_row,
        )
        .map_err(Error::from)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(Error::from)
}

/// Get the user with the given username, ignoring the case of ASCII letters.
///
/// # Errors
///
/// Returns a [Error::NotFound] if no user has the username, or a
/// [Error::SqlError] if some other SQL related error occurred.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE username = :username"
        ))?
        .query_row(&[(":username", &username)], map_user_row)
        .map_err(Error::from)
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Run an update that should affect exactly the user with `user_id`.
fn update_user(
    sql: &str,
    params: impl rusqlite::Params,
    connection: &Connection,
) -> Result<(), Error> {
    match connection.execute(sql, params)? {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Record that the user logged in at `logged_in_at`.
///
/// # Errors
///
/// Returns a [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn update_last_login(
    user_id: UserID,
    logged_in_at: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    update_user(
        "UPDATE user SET last_login = ?1 WHERE id = ?2",
        (logged_in_at, user_id.as_i64()),
        connection,
    )
}

/// Replace the user's password hash.
///
/// # Errors
///
/// Returns a [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn set_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    update_user(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.to_string(), user_id.as_i64()),
        connection,
    )
}

/// Allow or block the user from logging in.
///
/// # Errors
///
/// Returns a [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn set_active(user_id: UserID, is_active: bool, connection: &Connection) -> Result<(), Error> {
    update_user(
        "UPDATE user SET is_active = ?1 WHERE id = ?2",
        (is_active, user_id.as_i64()),
        connection,
    )
}
