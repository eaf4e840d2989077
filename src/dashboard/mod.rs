//! Dashboard module
//!
//! Provides the landing page that lists the user's incomes and expenses
//! along with their totals.

mod handlers;
mod tables;

pub use handlers::get_dashboard_page;
