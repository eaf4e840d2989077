//! The page and form handler for editing a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    endpoints::{self, format_endpoint},
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    transaction::{
        TransactionUpdate,
        core::{get_transaction, update_transaction},
        form::{
            TransactionForm, TransactionFormErrors, transaction_form_fields,
            validate_transaction_form,
        },
    },
    user::UserID,
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Parse the transaction ID in a URL, anything that is not an ID cannot refer to a transaction.
pub(super) fn parse_transaction_id(raw_id: &str) -> Result<TransactionId, Error> {
    raw_id.parse().map_err(|_| Error::NotFound)
}

fn edit_transaction_page(
    transaction_id: TransactionId,
    form: &TransactionForm,
    errors: &TransactionFormErrors,
) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction_id);
    let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION_VIEW, transaction_id);
    let nav_bar = NavBar::new(&edit_url).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                method="post"
                action=(edit_url)
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Transaction" }

                (transaction_form_fields(form, errors, true))

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    "Save"
                }
            }

            p class="mt-4 text-sm"
            {
                a href=(delete_url) class=(LINK_STYLE) { "Delete this transaction" }
            }
        }
    };

    base("Edit Transaction", &[dollar_input_styles()], &content)
}

/// Render the form for editing one of the user's transactions.
///
/// Responds with 404 if the transaction does not exist or belongs to another user.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
) -> Result<Response, Error> {
    let transaction_id = parse_transaction_id(&transaction_id)?;

    let transaction = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transaction(transaction_id, user_id, &connection)?
    };

    let form = TransactionForm::from_transaction(&transaction);

    Ok(
        edit_transaction_page(transaction_id, &form, &TransactionFormErrors::default())
            .into_response(),
    )
}

/// Overwrite one of the user's transactions and redirect to the dashboard.
///
/// The transaction keeps its stored type unless the form picks another one.
pub async fn edit_transaction(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
    Form(form): Form<TransactionForm>,
) -> Result<Response, Error> {
    let transaction_id = parse_transaction_id(&transaction_id)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let stored = get_transaction(transaction_id, user_id, &connection)?;

    let valid = match validate_transaction_form(&form) {
        Ok(valid) => valid,
        Err(errors) => {
            let form = TransactionForm {
                transaction_type: form
                    .transaction_type
                    .clone()
                    .or_else(|| Some(stored.transaction_type.as_str().to_owned())),
                ..form
            };

            return Ok(edit_transaction_page(transaction_id, &form, &errors).into_response());
        }
    };

    let update = TransactionUpdate {
        description: valid.description,
        amount: valid.amount,
        date: valid.date,
        transaction_type: valid.transaction_type.unwrap_or(stored.transaction_type),
    };

    update_transaction(transaction_id, user_id, update, &connection)
        .inspect_err(|error| tracing::error!("could not update transaction {transaction_id}: {error}"))?;

    Ok(Redirect::to(endpoints::DASHBOARD_VIEW).into_response())
}
