//! The endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/edit/{transaction_id}/', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users, lists their income and expenses.
pub const DASHBOARD_VIEW: &str = "/dashboard/";
/// The route for registering a new user.
pub const REGISTER_VIEW: &str = "/register/";
/// The route for logging in.
pub const LOG_IN_VIEW: &str = "/login/";
/// The route for logging out the current user.
pub const LOG_OUT: &str = "/logout/";
/// The route pattern for adding a transaction, the parameter is the transaction type.
pub const ADD_TRANSACTION_VIEW: &str = "/add_transaction/{transaction_type}/";
/// The page for adding an income.
pub const ADD_INCOME_VIEW: &str = "/add_transaction/income/";
/// The page for adding an expense.
pub const ADD_EXPENSE_VIEW: &str = "/add_transaction/expense/";
/// The page for editing a transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/edit/{transaction_id}/";
/// The page for confirming and deleting a transaction.
pub const DELETE_TRANSACTION_VIEW: &str = "/delete/{transaction_id}/";
/// The route for static files.
pub const STATIC: &str = "/static";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/edit/{transaction_id}/', '{transaction_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
