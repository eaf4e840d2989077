//! The confirmation page and handler for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{BUTTON_DELETE_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, base},
    navigation::NavBar,
    transaction::{
        Transaction,
        core::{delete_transaction, get_transaction},
        edit::parse_transaction_id,
    },
    user::UserID,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn delete_transaction_page(transaction: &Transaction) -> Markup {
    let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION_VIEW, transaction.id);
    let nav_bar = NavBar::new(&delete_url).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                method="post"
                action=(delete_url)
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Delete " (transaction.transaction_type.label()) }

                p
                {
                    "Are you sure you want to delete "
                    strong { (transaction) }
                    " ("
                    (transaction.amount.abs())
                    " on "
                    (transaction.date)
                    ")?"
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }

            p class="mt-4 text-sm"
            {
                a href=(endpoints::DASHBOARD_VIEW) class=(LINK_STYLE) { "Cancel" }
            }
        }
    };

    base("Delete Transaction", &[], &content)
}

/// Ask the user to confirm deleting one of their transactions.
///
/// Responds with 404 if the transaction does not exist or belongs to another user.
pub async fn get_delete_transaction_page(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
) -> Result<Response, Error> {
    let transaction_id = parse_transaction_id(&transaction_id)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection)?;

    Ok(delete_transaction_page(&transaction).into_response())
}

/// Delete one of the user's transactions and redirect to the dashboard.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
) -> Result<Response, Error> {
    let transaction_id = parse_transaction_id(&transaction_id)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, user_id, &connection)?;
    tracing::debug!("User {user_id} deleted transaction {transaction_id}");

    Ok(Redirect::to(endpoints::DASHBOARD_VIEW).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use scraper::Html;
    use time::macros::date;

    use crate::{
        AppState,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_action, assert_form_submit_button_with_text, assert_valid_html,
            get_test_server, get_test_state, insert_test_user, log_in, must_get_form, select_text,
        },
        transaction::{
            Amount, NewTransaction, Transaction, TransactionType, count_transactions,
            create_transaction,
        },
        user::UserID,
    };

    fn insert_transaction(state: &AppState, user_id: UserID) -> Transaction {
        let connection = state.db_connection.lock().unwrap();

        create_transaction(
            NewTransaction {
                user_id,
                description: "Rent".to_owned(),
                amount: Amount::from(dec!(400)),
                date: date!(2025 - 10 - 01),
                transaction_type: TransactionType::Expense,
            },
            &connection,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn renders_confirmation_page() {
        let state = get_test_state();
        let user = insert_test_user(&state, "alice");
        let transaction = insert_transaction(&state, user.id);
        let server = get_test_server(state);
        let cookie = log_in(&server, "alice").await;
        let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION_VIEW, transaction.id);

        let response = server.get(&delete_url).add_cookie(cookie).await;

        response.assert_status_ok();
        let document = Html::parse_document(&response.text());
        assert_valid_html(&document);
        assert_eq!(
            select_text(&document, "form p"),
            vec!["Are you sure you want to delete Rent ($400.00 on 2025-10-01)?"]
        );
        let form = must_get_form(&document);
        assert_form_action(&form, &delete_url);
        assert_form_submit_button_with_text(&form, "Delete");
    }

    #[tokio::test]
    async fn deletes_transaction() {
        let state = get_test_state();
        let user = insert_test_user(&state, "alice");
        let transaction = insert_transaction(&state, user.id);
        let server = get_test_server(state.clone());
        let cookie = log_in(&server, "alice").await;

        let response = server
            .post(&format_endpoint(
                endpoints::DELETE_TRANSACTION_VIEW,
                transaction.id,
            ))
            .add_cookie(cookie)
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::DASHBOARD_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn other_users_transaction_is_not_found() {
        let state = get_test_state();
        let alice = insert_test_user(&state, "alice");
        insert_test_user(&state, "bob");
        let transaction = insert_transaction(&state, alice.id);
        let server = get_test_server(state.clone());
        let cookie = log_in(&server, "bob").await;
        let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION_VIEW, transaction.id);

        server
            .get(&delete_url)
            .add_cookie(cookie.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .post(&delete_url)
            .add_cookie(cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let state = get_test_state();
        insert_test_user(&state, "alice");
        let server = get_test_server(state);
        let cookie = log_in(&server, "alice").await;

        server
            .post(&format_endpoint(endpoints::DELETE_TRANSACTION_VIEW, 999))
            .add_cookie(cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
