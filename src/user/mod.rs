//! Users, their login details and the groups and permissions attached to them.

pub mod authorization;
mod core;

pub use core::{
    NewUser, User, UserID, Username, UsernameError, count_users, create_user, create_user_table,
    get_user_by_id, get_user_by_username, set_active, set_password, update_last_login,
};
