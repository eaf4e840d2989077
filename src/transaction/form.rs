//! The fields shared by the add and edit transaction forms, and their validation.

use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, field_error, text_input,
    },
    transaction::{Amount, Transaction, TransactionType},
};

/// The maximum number of characters in a transaction description.
pub const DESCRIPTION_MAX_LENGTH: usize = 255;

const REQUIRED_FIELD_MSG: &str = "This field is required.";
const INVALID_DATE_MSG: &str = "Enter a valid date.";

/// The raw data entered in a transaction form.
///
/// Every field is kept as text so that invalid input can be shown back to the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionForm {
    /// What the transaction was for.
    pub description: String,
    /// The amount of money as a positive number, e.g. "12.30".
    pub amount: String,
    /// The date formatted as "YYYY-MM-DD".
    pub date: String,
    /// "income" or "expense". Only sent by the edit form.
    pub transaction_type: Option<String>,
}

impl TransactionForm {
    /// An empty form for a new transaction on `date`.
    pub fn for_date(date: Date) -> Self {
        Self {
            date: date.to_string(),
            ..Default::default()
        }
    }

    /// A form prefilled with the values of an existing transaction.
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            description: transaction.description.clone(),
            amount: transaction.amount.abs().to_input_value(),
            date: transaction.date.to_string(),
            transaction_type: Some(transaction.transaction_type.as_str().to_owned()),
        }
    }
}

/// The error message for each field of a transaction form, if any.
#[derive(Debug, Default, PartialEq)]
pub struct TransactionFormErrors {
    /// The description error.
    pub description: Option<String>,
    /// The amount error.
    pub amount: Option<String>,
    /// The date error.
    pub date: Option<String>,
    /// The transaction type error.
    pub transaction_type: Option<String>,
}

/// The validated contents of a transaction form.
#[derive(Debug, PartialEq)]
pub struct ValidTransactionForm {
    /// The trimmed description.
    pub description: String,
    /// The amount, always at least one cent.
    pub amount: Amount,
    /// When the transaction happened.
    pub date: Date,
    /// The type picked in the form, `None` if the form did not include one.
    pub transaction_type: Option<TransactionType>,
}

fn validate_description(raw_description: &str) -> Result<String, String> {
    let description = raw_description.trim();
    let length = description.chars().count();

    if description.is_empty() {
        Err(REQUIRED_FIELD_MSG.to_owned())
    } else if length > DESCRIPTION_MAX_LENGTH {
        Err(format!(
            "Ensure this value has at most {DESCRIPTION_MAX_LENGTH} characters (it has {length})."
        ))
    } else {
        Ok(description.to_owned())
    }
}

fn validate_date(raw_date: &str) -> Result<Date, String> {
    let raw_date = raw_date.trim();

    if raw_date.is_empty() {
        return Err(REQUIRED_FIELD_MSG.to_owned());
    }

    Date::parse(raw_date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| INVALID_DATE_MSG.to_owned())
}

fn validate_transaction_type(raw_type: Option<&str>) -> Result<Option<TransactionType>, String> {
    match raw_type.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw_type) => raw_type
            .parse::<TransactionType>()
            .map(Some)
            .map_err(|error| error.to_string()),
    }
}

/// Check every field of `form`, collecting one error message per invalid field.
pub fn validate_transaction_form(
    form: &TransactionForm,
) -> Result<ValidTransactionForm, TransactionFormErrors> {
    let description = validate_description(&form.description);
    let amount = Amount::parse_entry(&form.amount).map_err(|error| error.to_string());
    let date = validate_date(&form.date);
    let transaction_type = validate_transaction_type(form.transaction_type.as_deref());

    match (description, amount, date, transaction_type) {
        (Ok(description), Ok(amount), Ok(date), Ok(transaction_type)) => Ok(ValidTransactionForm {
            description,
            amount,
            date,
            transaction_type,
        }),
        (description, amount, date, transaction_type) => Err(TransactionFormErrors {
            description: description.err(),
            amount: amount.err(),
            date: date.err(),
            transaction_type: transaction_type.err(),
        }),
    }
}

fn transaction_type_radio(
    transaction_type: TransactionType,
    selected: Option<&str>,
) -> Markup {
    let value = transaction_type.as_str();
    let id = format!("transaction-type-{value}");

    html! {
        div class="flex items-center gap-3"
        {
            input
                name="transaction_type"
                id=(id)
                type="radio"
                value=(value)
                checked[selected == Some(value)]
                tabindex="0"
                class=(FORM_RADIO_INPUT_STYLE);

            label
                for=(id)
                class=(FORM_RADIO_LABEL_STYLE)
            {
                (transaction_type.label())
            }
        }
    }
}

/// Render the inputs of a transaction form.
///
/// The transaction type radio buttons are only rendered when `show_type` is set,
/// the add form takes the type from the URL instead.
pub fn transaction_form_fields(
    form: &TransactionForm,
    errors: &TransactionFormErrors,
    show_type: bool,
) -> Markup {
    html! {
        @if show_type {
            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Transaction type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    (transaction_type_radio(TransactionType::Income, form.transaction_type.as_deref()))
                    (transaction_type_radio(TransactionType::Expense, form.transaction_type.as_deref()))
                }

                (field_error(errors.transaction_type.as_deref()))
            }
        }

        (text_input(
            "description",
            "Description",
            &form.description,
            DESCRIPTION_MAX_LENGTH,
            errors.description.as_deref(),
        ))

        div
        {
            label
                for="amount"
                class=(FORM_LABEL_STYLE)
            {
                "Amount"
            }

            // w-full needed to ensure input takes the full width when prefilled with a value
            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    required
                    autofocus[errors.amount.is_some()]
                    value=(form.amount)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (field_error(errors.amount.as_deref()))
        }

        div
        {
            label
                for="date"
                class=(FORM_LABEL_STYLE)
            {
                "Date"
            }

            input
                name="date"
                id="date"
                type="date"
                required
                value=(form.date)
                class=(FORM_TEXT_INPUT_STYLE);

            (field_error(errors.date.as_deref()))
        }
    }
}
