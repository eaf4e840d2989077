//! The 500 page shown when a request fails for reasons the user cannot fix.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// An error page for failures inside Tally, such as a broken database or bad server settings.
///
/// `description` says what went wrong and `fix` says what, if anything, can be done about it.
/// Neither should contain internal details like SQL errors.
pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Tally could not finish your request.",
            fix: "Your transactions have not been changed. Try again in a moment, \
                and ask the administrator to check the server logs if it keeps happening.",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        let page = error_view("Something Went Wrong", "500", self.description, self.fix);

        (StatusCode::INTERNAL_SERVER_ERROR, Html(page.into_string())).into_response()
    }
}
