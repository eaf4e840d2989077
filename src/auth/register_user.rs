//! The registration page for creating a new user account.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
// Missing fields become empty strings so they get "This field is required." like empty ones.
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword, endpoints,
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, base, log_in_register, password_input, text_input},
    user::{NewUser, Username, create_user},
};

/// The minimum number of characters the password input accepts on the client side.
///
/// The server checks the password strength on top of this.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 8;

/// The maximum number of characters in a first or last name.
pub const NAME_MAX_LENGTH: usize = 30;

const REQUIRED_FIELD_MSG: &str = "This field is required.";
const PASSWORD_MISMATCH_MSG: &str = "The two password fields didn’t match.";
const DUPLICATE_USERNAME_MSG: &str = "A user with that username already exists.";

/// The raw data entered in the registration form.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    /// The name the user wants to log in with.
    pub username: String,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The password.
    pub password1: String,
    /// The password again, to catch typos.
    pub password2: String,
}

/// The error message for each field of the registration form, if any.
#[derive(Debug, Default, PartialEq)]
struct RegisterFormErrors {
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password1: Option<String>,
    password2: Option<String>,
}

impl RegisterFormErrors {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn validate_name(raw_name: &str) -> Result<String, String> {
    let name = raw_name.trim();
    let length = name.chars().count();

    if name.is_empty() {
        Err(REQUIRED_FIELD_MSG.to_owned())
    } else if length > NAME_MAX_LENGTH {
        Err(format!(
            "Ensure this value has at most {NAME_MAX_LENGTH} characters (it has {length})."
        ))
    } else {
        Ok(name.to_owned())
    }
}

/// The validated contents of the registration form.
#[derive(Debug)]
struct ValidRegistration {
    username: Username,
    first_name: String,
    last_name: String,
    password: ValidatedPassword,
}

fn validate_registration(form: &RegisterForm) -> Result<ValidRegistration, RegisterFormErrors> {
    let mut errors = RegisterFormErrors::default();

    let username = Username::new(&form.username)
        .inspect_err(|error| errors.username = Some(error.to_string()))
        .ok();
    let first_name = validate_name(&form.first_name)
        .inspect_err(|error| errors.first_name = Some(error.clone()))
        .ok();
    let last_name = validate_name(&form.last_name)
        .inspect_err(|error| errors.last_name = Some(error.clone()))
        .ok();

    if form.password1.is_empty() {
        errors.password1 = Some(REQUIRED_FIELD_MSG.to_owned());
    }

    if form.password2.is_empty() {
        errors.password2 = Some(REQUIRED_FIELD_MSG.to_owned());
    } else if !form.password1.is_empty() && form.password1 != form.password2 {
        errors.password2 = Some(PASSWORD_MISMATCH_MSG.to_owned());
    }

    let password = if errors.password1.is_none() && errors.password2.is_none() {
        let user_inputs = [
            form.username.trim(),
            form.first_name.trim(),
            form.last_name.trim(),
        ];

        match ValidatedPassword::new(&form.password1, &user_inputs) {
            Ok(password) => Some(password),
            Err(Error::TooWeak(feedback)) => {
                errors.password1 = Some(
                    format!("This password is too easy to guess. {feedback}")
                        .trim_end()
                        .to_owned(),
                );
                None
            }
            Err(error) => {
                tracing::error!("Unexpected error while validating password: {error}");
                errors.password1 = Some("Could not check the password, try again.".to_owned());
                None
            }
        }
    } else {
        None
    };

    match (username, first_name, last_name, password) {
        (Some(username), Some(first_name), Some(last_name), Some(password))
            if errors.is_empty() =>
        {
            Ok(ValidRegistration {
                username,
                first_name,
                last_name,
                password,
            })
        }
        _ => Err(errors),
    }
}

fn registration_form(form: &RegisterForm, errors: &RegisterFormErrors) -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::REGISTER_VIEW)
            class="space-y-4 md:space-y-6"
        {
            (text_input(
                "username",
                "Username",
                &form.username,
                Username::MAX_LENGTH,
                errors.username.as_deref(),
            ))

            (text_input(
                "first_name",
                "First name",
                &form.first_name,
                NAME_MAX_LENGTH,
                errors.first_name.as_deref(),
            ))

            (text_input(
                "last_name",
                "Last name",
                &form.last_name,
                NAME_MAX_LENGTH,
                errors.last_name.as_deref(),
            ))

            (password_input(
                "password1",
                "Password",
                PASSWORD_INPUT_MIN_LENGTH,
                errors.password1.as_deref(),
            ))

            (password_input(
                "password2",
                "Confirm password",
                PASSWORD_INPUT_MIN_LENGTH,
                errors.password2.as_deref(),
            ))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Register"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

fn registration_page(form: &RegisterForm, errors: &RegisterFormErrors) -> Markup {
    let content = log_in_register("Create an account", &registration_form(form, errors));

    base("Register", &[], &content)
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    registration_page(&RegisterForm::default(), &RegisterFormErrors::default()).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost for hashing the new user's password.
    pub password_hash_cost: u32,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a new user from the registration form and redirect to the log-in page.
///
/// Invalid input re-renders the form with an error message under each invalid field.
/// Passwords are never sent back to the client.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, Error> {
    let registration = match validate_registration(&form) {
        Ok(registration) => registration,
        Err(errors) => return Ok(registration_page(&form, &errors).into_response()),
    };

    let password_hash = PasswordHash::new(registration.password, state.password_hash_cost)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let new_user = NewUser {
        username: registration.username,
        first_name: registration.first_name,
        last_name: registration.last_name,
        password_hash,
    };

    match create_user(new_user, &connection) {
        Ok(user) => {
            tracing::info!("Registered user {} ({})", user.username, user.id);
            Ok(Redirect::to(endpoints::LOG_IN_VIEW).into_response())
        }
        Err(Error::DuplicateUsername) => {
            let errors = RegisterFormErrors {
                username: Some(DUPLICATE_USERNAME_MSG.to_owned()),
                ..Default::default()
            };

            Ok(registration_page(&form, &errors).into_response())
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod validation_tests {
    use super::{
        DUPLICATE_USERNAME_MSG, PASSWORD_MISMATCH_MSG, REQUIRED_FIELD_MSG, RegisterForm,
        RegisterFormErrors, validate_registration,
    };

    fn valid_form() -> RegisterForm {
        RegisterForm {
            username: "alice".to_owned(),
            first_name: "Alice".to_owned(),
            last_name: "Smith".to_owned(),
            password1: "zT8qLw2mRx5vNp7k".to_owned(),
            password2: "zT8qLw2mRx5vNp7k".to_owned(),
        }
    }

    #[test]
    fn accepts_valid_form() {
        let registration = validate_registration(&valid_form()).unwrap();

        assert_eq!(registration.username.as_str(), "alice");
        assert_eq!(registration.first_name, "Alice");
        assert_eq!(registration.last_name, "Smith");
    }

    #[test]
    fn trims_names() {
        let form = RegisterForm {
            first_name: "  Alice ".to_owned(),
            ..valid_form()
        };

        let registration = validate_registration(&form).unwrap();

        assert_eq!(registration.first_name, "Alice");
    }

    #[test]
    fn reports_every_missing_field() {
        let errors = validate_registration(&RegisterForm::default()).unwrap_err();

        assert_eq!(
            errors,
            RegisterFormErrors {
                username: Some(REQUIRED_FIELD_MSG.to_owned()),
                first_name: Some(REQUIRED_FIELD_MSG.to_owned()),
                last_name: Some(REQUIRED_FIELD_MSG.to_owned()),
                password1: Some(REQUIRED_FIELD_MSG.to_owned()),
                password2: Some(REQUIRED_FIELD_MSG.to_owned()),
            }
        );
    }

    #[test]
    fn rejects_mismatched_passwords() {
        let form = RegisterForm {
            password2: "Hq3vN8pLz2Tw6kRm".to_owned(),
            ..valid_form()
        };

        let errors = validate_registration(&form).unwrap_err();

        assert_eq!(errors.password2, Some(PASSWORD_MISMATCH_MSG.to_owned()));
        assert_eq!(errors.password1, None);
    }

    #[test]
    fn rejects_weak_password() {
        let form = RegisterForm {
            password1: "password".to_owned(),
            password2: "password".to_owned(),
            ..valid_form()
        };

        let errors = validate_registration(&form).unwrap_err();

        assert!(
            errors
                .password1
                .is_some_and(|message| message.starts_with("This password is too easy to guess."))
        );
    }

    #[test]
    fn rejects_long_names() {
        let form = RegisterForm {
            last_name: "a".repeat(31),
            ..valid_form()
        };

        let errors = validate_registration(&form).unwrap_err();

        assert_eq!(
            errors.last_name,
            Some("Ensure this value has at most 30 characters (it has 31).".to_owned())
        );
    }

    #[test]
    fn rejects_invalid_username() {
        let form = RegisterForm {
            username: "alice smith".to_owned(),
            ..valid_form()
        };

        let errors = validate_registration(&form).unwrap_err();

        assert!(errors.username.is_some());
        assert_ne!(errors.username, Some(DUPLICATE_USERNAME_MSG.to_owned()));
    }
}
