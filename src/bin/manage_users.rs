use std::{error::Error, io, path::Path, process::exit};

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use tally_rs::{
    PasswordHash, ValidatedPassword, initialize_db,
    user::{
        User,
        authorization::{
            add_user_to_group, get_group_by_name, get_or_create_group, get_or_create_permission,
            get_user_groups, get_user_permissions, grant_group_permission, grant_user_permission,
            remove_user_from_group,
        },
        get_user_by_username, set_active, set_password,
    },
};

/// A utility for the user administration that the web app does not expose.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set a new password for a user.
    ResetPassword {
        /// The user's username.
        #[arg(long)]
        username: String,
    },
    /// Allow or stop a user from logging in.
    SetActive {
        /// The user's username.
        #[arg(long)]
        username: String,
        /// Whether the user may log in.
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Add a user to a group, creating the group if needed.
    AddToGroup {
        /// The user's username.
        #[arg(long)]
        username: String,
        /// The name of the group.
        #[arg(long)]
        group: String,
    },
    /// Remove a user from a group.
    RemoveFromGroup {
        /// The user's username.
        #[arg(long)]
        username: String,
        /// The name of the group.
        #[arg(long)]
        group: String,
    },
    /// Grant a permission to a user, creating the permission if needed.
    GrantPermission {
        /// The user's username.
        #[arg(long)]
        username: String,
        /// The short name of the permission, e.g. "view_transaction".
        #[arg(long)]
        codename: String,
        /// A human readable name for a new permission. Defaults to the codename.
        #[arg(long)]
        name: Option<String>,
    },
    /// Grant a permission to every member of a group.
    GrantGroupPermission {
        /// The name of the group, created if needed.
        #[arg(long)]
        group: String,
        /// The short name of the permission, e.g. "view_transaction".
        #[arg(long)]
        codename: String,
        /// A human readable name for a new permission. Defaults to the codename.
        #[arg(long)]
        name: Option<String>,
    },
    /// Print a user's details, groups and permissions.
    Show {
        /// The user's username.
        #[arg(long)]
        username: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    match args.command {
        Command::ResetPassword { username } => {
            let user = get_user(&username, &connection);
            println!("Resetting password for {}", user.username);

            let Some(password_hash) = get_new_password_hash(&user) else {
                return Ok(());
            };

            set_password(user.id, &password_hash, &connection)?;
            println!("Password updated successfully!");
        }
        Command::SetActive { username, active } => {
            let user = get_user(&username, &connection);
            set_active(user.id, active, &connection)?;

            if active {
                println!("{} can now log in.", user.username);
            } else {
                println!("{} can no longer log in.", user.username);
            }
        }
        Command::AddToGroup { username, group } => {
            let user = get_user(&username, &connection);
            let group = get_or_create_group(&group, &connection)?;
            add_user_to_group(user.id, group.id, &connection)?;
            println!("Added {} to {}.", user.username, group.name);
        }
        Command::RemoveFromGroup { username, group } => {
            let user = get_user(&username, &connection);
            let group = match get_group_by_name(&group, &connection) {
                Ok(group) => group,
                Err(tally_rs::Error::NotFound) => {
                    print_error(format!("there is no group called {group:?}"));
                    exit(1);
                }
                Err(error) => return Err(error.into()),
            };

            match remove_user_from_group(user.id, group.id, &connection) {
                Ok(()) => println!("Removed {} from {}.", user.username, group.name),
                Err(tally_rs::Error::NotFound) => {
                    print_error(format!("{} is not in {}", user.username, group.name));
                    exit(1);
                }
                Err(error) => return Err(error.into()),
            }
        }
        Command::GrantPermission {
            username,
            codename,
            name,
        } => {
            let user = get_user(&username, &connection);
            let name = name.as_deref().unwrap_or(&codename);
            let permission = get_or_create_permission(&codename, name, &connection)?;
            grant_user_permission(user.id, permission.id, &connection)?;
            println!("Granted {} to {}.", permission.codename, user.username);
        }
        Command::GrantGroupPermission {
            group,
            codename,
            name,
        } => {
            let group = get_or_create_group(&group, &connection)?;
            let name = name.as_deref().unwrap_or(&codename);
            let permission = get_or_create_permission(&codename, name, &connection)?;
            grant_group_permission(group.id, permission.id, &connection)?;
            println!("Granted {} to group {}.", permission.codename, group.name);
        }
        Command::Show { username } => {
            let user = get_user(&username, &connection);
            show_user(&user, &connection)?;
        }
    }

    Ok(())
}

fn show_user(user: &User, connection: &Connection) -> Result<(), Box<dyn Error>> {
    let groups = get_user_groups(user.id, connection)?;
    let permissions = get_user_permissions(user.id, connection)?;

    println!("ID:          {}", user.id);
    println!("Username:    {}", user.username);
    println!("Name:        {} {}", user.first_name, user.last_name);
    println!("Active:      {}", user.is_active);
    println!("Joined:      {}", user.date_joined);
    match user.last_login {
        Some(last_login) => println!("Last login:  {last_login}"),
        None => println!("Last login:  never"),
    }

    println!("Groups:");
    for group in groups {
        println!("  - {}", group.name);
    }

    println!("Permissions:");
    for permission in permissions {
        println!("  - {} ({})", permission.codename, permission.name);
    }

    Ok(())
}

fn get_user(username: &str, connection: &Connection) -> User {
    match get_user_by_username(username, connection) {
        Ok(user) => user,
        Err(tally_rs::Error::NotFound) => {
            print_error(format!("there is no user called {username:?}"));
            exit(1);
        }
        Err(error) => {
            print_error(format!("could not load user {username:?}: {error}"));
            exit(1);
        }
    }
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        None => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if !db_path.is_file() {
        print_error(format!("File does not exist at {db_path:#?}!"));
        exit(1);
    }
}

fn get_new_password_hash(user: &User) -> Option<PasswordHash> {
    let user_inputs = [
        user.username.as_str(),
        user.first_name.as_str(),
        user.last_name.as_str(),
    ];

    loop {
        println!();

        let first_password = match rpassword::prompt_password("Enter a new password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        let password = match ValidatedPassword::new(&first_password, &user_inputs) {
            Ok(password) => password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
            }
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    );
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
