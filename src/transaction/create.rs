//! The page and form handler for adding an income or expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
// Must use axum_extra's Form since axum's Form rejects a body with missing fields.
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    timezone::get_local_offset,
    transaction::{
        NewTransaction, TransactionType, create_transaction,
        form::{
            TransactionForm, TransactionFormErrors, transaction_form_fields,
            validate_transaction_form,
        },
    },
    user::UserID,
};

/// The state needed to add a transaction.
#[derive(Debug, Clone)]
pub struct AddTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AddTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn add_transaction_endpoint(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Income => endpoints::ADD_INCOME_VIEW,
        TransactionType::Expense => endpoints::ADD_EXPENSE_VIEW,
    }
}

fn add_transaction_page(
    transaction_type: TransactionType,
    form: &TransactionForm,
    errors: &TransactionFormErrors,
) -> Markup {
    let endpoint = add_transaction_endpoint(transaction_type);
    let title = format!("Add {}", transaction_type.label());
    let nav_bar = NavBar::new(endpoint).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                method="post"
                action=(endpoint)
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { (title) }

                (transaction_form_fields(form, errors, false))

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    (title)
                }
            }
        }
    };

    base(&title, &[dollar_input_styles()], &content)
}

fn parse_transaction_type(raw_type: &str) -> Result<TransactionType, Error> {
    raw_type.parse().map_err(|_| Error::NotFound)
}

/// Render the form for adding an income or expense.
///
/// The date defaults to today in the server's timezone.
pub async fn get_add_transaction_page(
    State(state): State<AddTransactionState>,
    Path(transaction_type): Path<String>,
) -> Result<Response, Error> {
    let transaction_type = parse_transaction_type(&transaction_type)?;

    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let form = TransactionForm::for_date(today);

    Ok(
        add_transaction_page(transaction_type, &form, &TransactionFormErrors::default())
            .into_response(),
    )
}

/// Record a new income or expense and redirect to the dashboard.
///
/// The transaction type comes from the URL. Invalid input re-renders the form
/// with an error message under each invalid field.
pub async fn add_transaction(
    State(state): State<AddTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_type): Path<String>,
    Form(form): Form<TransactionForm>,
) -> Result<Response, Error> {
    let transaction_type = parse_transaction_type(&transaction_type)?;

    // The add form has no type field, the URL decides.
    let form = TransactionForm {
        transaction_type: None,
        ..form
    };

    let valid = match validate_transaction_form(&form) {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(add_transaction_page(transaction_type, &form, &errors).into_response());
        }
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(
        NewTransaction {
            user_id,
            description: valid.description,
            amount: valid.amount,
            date: valid.date,
            transaction_type,
        },
        &connection,
    )
    .inspect_err(|error| tracing::error!("could not create transaction: {error}"))?;

    tracing::debug!(
        "User {user_id} added {} {}",
        transaction.transaction_type.as_str(),
        transaction.id
    );

    Ok(Redirect::to(endpoints::DASHBOARD_VIEW).into_response())
}
