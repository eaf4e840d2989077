use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use tally_rs::{
    PasswordHash, ValidatedPassword, initialize_db,
    transaction::{Amount, NewTransaction, TransactionType, create_transaction},
    user::{NewUser, Username, create_user},
};

/// A utility for creating a test database for Tally.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        NewUser {
            username: Username::new_unchecked("test"),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            password_hash,
        },
        &conn,
    )?;

    println!("Creating sample transactions...");

    let today = OffsetDateTime::now_utc().date();
    let samples = [
        ("Salary", 3_200_00, 14, TransactionType::Income),
        ("Salary", 3_200_00, 0, TransactionType::Income),
        ("Interest", 12_34, 3, TransactionType::Income),
        ("Rent", 1_450_00, 13, TransactionType::Expense),
        ("Groceries", 187_65, 9, TransactionType::Expense),
        ("Coffee", 4_50, 2, TransactionType::Expense),
        ("Power bill", 96_20, 1, TransactionType::Expense),
    ];

    for (description, cents, days_ago, transaction_type) in samples {
        create_transaction(
            NewTransaction {
                user_id: user.id,
                description: description.to_owned(),
                amount: Amount::from_cents(cents),
                date: today - Duration::days(days_ago),
                transaction_type,
            },
            &conn,
        )?;
    }

    println!("Success! Log in with the username \"test\" and the password \"test\".");

    Ok(())
}
