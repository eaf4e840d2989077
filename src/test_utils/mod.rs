#![allow(missing_docs)]

pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    AppState, PasswordHash, ValidatedPassword,
    auth::COOKIE_TOKEN,
    build_router, endpoints,
    user::{NewUser, User, Username, create_user},
};

pub(crate) use form::{
    assert_form_action, assert_form_error_message, assert_form_input,
    assert_form_input_with_value, assert_form_submit_button_with_text, assert_radio_checked,
    get_form_error_messages, must_get_form,
};
pub(crate) use html::{assert_valid_html, parse_html_document, select_text};
pub(crate) use http::{assert_content_type, assert_see_other, assert_status_ok, get_header};

/// The cheapest bcrypt cost, keeps password hashing fast in tests.
pub(crate) const TEST_HASH_COST: u32 = 4;

/// A password that passes the strength check.
pub(crate) const TEST_PASSWORD: &str = "zT8qLw2mRx5vNp7k";

/// Create app state backed by a fresh in-memory database.
pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, "42", "Etc/UTC")
        .expect("Could not create app state")
        .with_password_hash_cost(TEST_HASH_COST)
}

/// Insert a user with [TEST_PASSWORD] as their password.
pub(crate) fn insert_test_user(state: &AppState, username: &str) -> User {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        TEST_HASH_COST,
    )
    .expect("Could not hash password");
    let connection = state.db_connection.lock().unwrap();

    create_user(
        NewUser {
            username: Username::new_unchecked(username),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            password_hash,
        },
        &connection,
    )
    .expect("Could not create test user")
}

/// Serve the full app.
pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server")
}

/// Log in through the log-in form and return the auth cookie.
pub(crate) async fn log_in(server: &TestServer, username: &str) -> Cookie<'static> {
    let response = server
        .post(endpoints::LOG_IN_VIEW)
        .form(&[("username", username), ("password", TEST_PASSWORD)])
        .await;

    response.assert_status_see_other();

    response.cookie(COOKIE_TOKEN)
}
