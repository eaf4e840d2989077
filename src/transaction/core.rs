//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, database_id::TransactionId, transaction::Amount, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in, stored as a positive amount.
    #[default]
    Income,
    /// Money going out, stored as a negative amount.
    Expense,
}

impl TransactionType {
    /// The value used in URLs, forms and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The name shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }

    /// Negative amounts are expenses, everything else is income.
    pub fn from_amount(amount: Amount) -> Self {
        if amount.is_negative() {
            TransactionType::Expense
        } else {
            TransactionType::Income
        }
    }

    /// Give `amount` the sign that matches this type.
    pub fn signed_amount(&self, amount: Amount) -> Amount {
        match self {
            TransactionType::Income => amount.abs(),
            TransactionType::Expense => -amount.abs(),
        }
    }
}

/// The error for a string that is neither "income" nor "expense".
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Select a valid choice. {0} is not one of the available choices.")]
pub struct InvalidTransactionType(pub String);

impl FromStr for TransactionType {
    type Err = InvalidTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(InvalidTransactionType(other.to_owned())),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money earned (positive) or spent (negative).
    pub amount: Amount,
    /// When the transaction happened.
    pub date: Date,
    /// Whether money was earned or spent.
    pub transaction_type: TransactionType,
}

impl Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

/// The data needed to record a new transaction.
///
/// The sign of `amount` is ignored, the stored amount takes its sign from
/// `transaction_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The user recording the transaction.
    pub user_id: UserID,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money.
    pub amount: Amount,
    /// When the transaction happened.
    pub date: Date,
    /// Whether money was earned or spent.
    pub transaction_type: TransactionType,
}

/// The new values for an existing transaction.
///
/// As with [NewTransaction], the stored amount takes its sign from `transaction_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionUpdate {
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money.
    pub amount: Amount,
    /// When the transaction happened.
    pub date: Date,
    /// Whether money was earned or spent.
    pub transaction_type: TransactionType,
}

/// The sums of a user's transactions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    /// The sum of all income.
    pub income: Amount,
    /// The sum of all expenses, as a positive amount.
    pub expenses: Amount,
    /// Income minus expenses.
    pub balance: Amount,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// The user table must already exist.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                amount INTEGER NOT NULL,
                date TEXT NOT NULL,
                transaction_type TEXT NOT NULL CHECK (transaction_type IN ('income', 'expense')),
                CHECK ((transaction_type = 'income' AND amount >= 0)
                    OR (transaction_type = 'expense' AND amount <= 0)),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Composite index used by the dashboard page.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_type_date
            ON \"transaction\"(user_id, transaction_type, date);",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "id, user_id, description, amount, date, transaction_type";

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        description: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        transaction_type: row.get(5)?,
    })
}

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the user does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = new_transaction
        .transaction_type
        .signed_amount(new_transaction.amount);

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (user_id, description, amount, date, transaction_type)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                new_transaction.user_id.as_i64(),
                &new_transaction.description,
                amount,
                new_transaction.date,
                new_transaction.transaction_type,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })
}

/// Retrieve the transaction `id` recorded by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Get the user's transactions of one type, newest first.
///
/// Transactions on the same date are ordered by most recently created first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_type(
    user_id: UserID,
    transaction_type: TransactionType,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 AND transaction_type = ?2
             ORDER BY date DESC, id DESC"
        ))?
        .query_map((user_id.as_i64(), transaction_type), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Overwrite the transaction `id` recorded by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let amount = update.transaction_type.signed_amount(update.amount);

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET description = ?1, amount = ?2, date = ?3, transaction_type = ?4
         WHERE id = ?5 AND user_id = ?6",
        (
            &update.description,
            amount,
            update.date,
            update.transaction_type,
            id,
            user_id.as_i64(),
        ),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Delete the transaction `id` recorded by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Sum the user's income and expenses.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_totals(user_id: UserID, connection: &Connection) -> Result<Totals, Error> {
    let (income, expenses): (Amount, Amount) = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN transaction_type = 'income' THEN amount ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN transaction_type = 'expense' THEN amount ELSE 0 END), 0)
         FROM \"transaction\"
         WHERE user_id = ?1",
        (user_id.as_i64(),),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(Totals {
        income,
        expenses: expenses.abs(),
        balance: Amount::from_cents(income.as_cents() + expenses.as_cents()),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod transaction_type_tests {
    use rust_decimal_macros::dec;

    use crate::transaction::{Amount, TransactionType};

    use super::InvalidTransactionType;

    #[test]
    fn parses_url_values() {
        assert_eq!("income".parse(), Ok(TransactionType::Income));
        assert_eq!("expense".parse(), Ok(TransactionType::Expense));
        assert_eq!(
            "Income".parse::<TransactionType>(),
            Err(InvalidTransactionType("Income".to_owned()))
        );
    }

    #[test]
    fn from_amount_uses_sign() {
        assert_eq!(
            TransactionType::from_amount(Amount::from(dec!(-0.01))),
            TransactionType::Expense
        );
        assert_eq!(
            TransactionType::from_amount(Amount::from(dec!(0))),
            TransactionType::Income
        );
    }

    #[test]
    fn signed_amount_matches_type() {
        let amount = Amount::from(dec!(12.5));

        assert_eq!(
            TransactionType::Income.signed_amount(-amount),
            Amount::from(dec!(12.5))
        );
        assert_eq!(
            TransactionType::Expense.signed_amount(amount),
            Amount::from(dec!(-12.5))
        );
    }

    #[test]
    fn defaults_to_income() {
        assert_eq!(TransactionType::default(), TransactionType::Income);
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        transaction::{
            Amount, NewTransaction, TransactionType, TransactionUpdate, count_transactions,
            create_transaction, delete_transaction, get_totals, get_transaction,
            get_transactions_by_type, update_transaction,
        },
        user::{NewUser, UserID, Username, create_user},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_user(username: &str, conn: &Connection) -> UserID {
        create_user(
            NewUser {
                username: Username::new_unchecked(username),
                first_name: "Test".to_owned(),
                last_name: "User".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
            },
            conn,
        )
        .unwrap()
        .id
    }

    fn new_transaction(
        user_id: UserID,
        amount: Amount,
        transaction_type: TransactionType,
    ) -> NewTransaction {
        NewTransaction {
            user_id,
            description: "Groceries".to_owned(),
            amount,
            date: date!(2025 - 10 - 05),
            transaction_type,
        }
    }

    #[test]
    fn create_income_stores_positive_amount() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);

        let transaction = create_transaction(
            new_transaction(user_id, Amount::from(dec!(50)), TransactionType::Income),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.amount, Amount::from(dec!(50)));
        assert_eq!(transaction.transaction_type, TransactionType::Income);
        assert_eq!(transaction.user_id, user_id);
        assert_eq!(transaction.to_string(), "Groceries");
    }

    #[test]
    fn create_expense_stores_negative_amount() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);

        let transaction = create_transaction(
            new_transaction(user_id, Amount::from(dec!(12.3)), TransactionType::Expense),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.amount, Amount::from(dec!(-12.3)));
    }

    #[test]
    fn create_fails_for_missing_user() {
        let conn = get_test_connection();

        let result = create_transaction(
            new_transaction(
                UserID::new(42),
                Amount::from(dec!(1)),
                TransactionType::Income,
            ),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn database_rejects_mismatched_sign() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);

        let result = conn.execute(
            "INSERT INTO \"transaction\" (user_id, description, amount, date, transaction_type)
             VALUES (?1, 'x', 100, '2025-10-05', 'expense')",
            (user_id.as_i64(),),
        );

        assert!(result.is_err());
    }

    #[test]
    fn get_transaction_is_scoped_to_user() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let bob = create_test_user("bob", &conn);
        let transaction = create_transaction(
            new_transaction(alice, Amount::from(dec!(5)), TransactionType::Income),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(transaction.id, alice, &conn),
            Ok(transaction.clone())
        );
        assert_eq!(
            get_transaction(transaction.id, bob, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_transactions_by_type_orders_newest_first() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let mut older = new_transaction(user_id, Amount::from(dec!(1)), TransactionType::Expense);
        older.date = date!(2025 - 01 - 01);
        let older = create_transaction(older, &conn).unwrap();
        let first_today = create_transaction(
            new_transaction(user_id, Amount::from(dec!(2)), TransactionType::Expense),
            &conn,
        )
        .unwrap();
        let second_today = create_transaction(
            new_transaction(user_id, Amount::from(dec!(3)), TransactionType::Expense),
            &conn,
        )
        .unwrap();
        create_transaction(
            new_transaction(user_id, Amount::from(dec!(4)), TransactionType::Income),
            &conn,
        )
        .unwrap();

        let expenses = get_transactions_by_type(user_id, TransactionType::Expense, &conn).unwrap();

        assert_eq!(expenses, vec![second_today, first_today, older]);
    }

    #[test]
    fn update_changes_fields_and_renormalises_sign() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let transaction = create_transaction(
            new_transaction(user_id, Amount::from(dec!(5)), TransactionType::Income),
            &conn,
        )
        .unwrap();

        update_transaction(
            transaction.id,
            user_id,
            TransactionUpdate {
                description: "Rent".to_owned(),
                amount: Amount::from(dec!(400)),
                date: date!(2025 - 11 - 01),
                transaction_type: TransactionType::Expense,
            },
            &conn,
        )
        .unwrap();

        let updated = get_transaction(transaction.id, user_id, &conn).unwrap();
        assert_eq!(updated.description, "Rent");
        assert_eq!(updated.amount, Amount::from(dec!(-400)));
        assert_eq!(updated.date, date!(2025 - 11 - 01));
        assert_eq!(updated.transaction_type, TransactionType::Expense);
    }

    #[test]
    fn update_fails_for_other_users_transaction() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let bob = create_test_user("bob", &conn);
        let transaction = create_transaction(
            new_transaction(alice, Amount::from(dec!(5)), TransactionType::Income),
            &conn,
        )
        .unwrap();

        let result = update_transaction(
            transaction.id,
            bob,
            TransactionUpdate {
                description: "Stolen".to_owned(),
                amount: Amount::from(dec!(1)),
                date: transaction.date,
                transaction_type: TransactionType::Income,
            },
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(get_transaction(transaction.id, alice, &conn), Ok(transaction));
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let transaction = create_transaction(
            new_transaction(user_id, Amount::from(dec!(5)), TransactionType::Income),
            &conn,
        )
        .unwrap();

        delete_transaction(transaction.id, user_id, &conn).unwrap();

        assert_eq!(
            get_transaction(transaction.id, user_id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn delete_fails_for_other_users_transaction() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let bob = create_test_user("bob", &conn);
        let transaction = create_transaction(
            new_transaction(alice, Amount::from(dec!(5)), TransactionType::Income),
            &conn,
        )
        .unwrap();

        assert_eq!(
            delete_transaction(transaction.id, bob, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(count_transactions(&conn).unwrap(), 1);
    }

    #[test]
    fn totals_sum_income_and_expenses() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let bob = create_test_user("bob", &conn);
        for (user_id, amount, transaction_type) in [
            (alice, dec!(100), TransactionType::Income),
            (alice, dec!(20.5), TransactionType::Income),
            (alice, dec!(30.25), TransactionType::Expense),
            (bob, dec!(999), TransactionType::Income),
        ] {
            create_transaction(
                new_transaction(user_id, Amount::from(amount), transaction_type),
                &conn,
            )
            .unwrap();
        }

        let totals = get_totals(alice, &conn).unwrap();

        assert_eq!(totals.income, Amount::from(dec!(120.5)));
        assert_eq!(totals.expenses, Amount::from(dec!(30.25)));
        assert_eq!(totals.balance, Amount::from(dec!(90.25)));
    }

    #[test]
    fn totals_are_zero_without_transactions() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);

        let totals = get_totals(user_id, &conn).unwrap();

        assert_eq!(totals, Default::default());
    }
}
