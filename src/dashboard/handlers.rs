//! Dashboard HTTP handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    dashboard::tables::{totals_table, transactions_table},
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    transaction::{Totals, Transaction, TransactionType, get_totals, get_transactions_by_type},
    user::{User, UserID, get_user_by_id},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading the user's transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    user: User,
    incomes: Vec<Transaction>,
    expenses: Vec<Transaction>,
    totals: Totals,
}

fn get_dashboard_data(user_id: UserID, connection: &Connection) -> Result<DashboardData, Error> {
    let user = get_user_by_id(user_id, connection)
        .inspect_err(|error| tracing::error!("could not get user {user_id}: {error}"))?;
    let incomes = get_transactions_by_type(user_id, TransactionType::Income, connection)
        .inspect_err(|error| tracing::error!("could not get incomes: {error}"))?;
    let expenses = get_transactions_by_type(user_id, TransactionType::Expense, connection)
        .inspect_err(|error| tracing::error!("could not get expenses: {error}"))?;
    let totals = get_totals(user_id, connection)
        .inspect_err(|error| tracing::error!("could not get totals: {error}"))?;

    Ok(DashboardData {
        user,
        incomes,
        expenses,
        totals,
    })
}

fn dashboard_view(data: &DashboardData) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class={(PAGE_CONTAINER_STYLE) " max-w-screen-lg"}
        {
            h2 class="text-2xl font-bold mb-6 self-start"
            {
                "Hello, " (data.user.first_name)
            }

            (totals_table(&data.totals))

            (transactions_table("Income", TransactionType::Income, &data.incomes))

            (transactions_table("Expenses", TransactionType::Expense, &data.expenses))
        }
    );

    base("Dashboard", &[], &content)
}

/// Display the user's incomes and expenses with their totals.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let data = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_dashboard_data(user_id, &connection)?
    };

    Ok(dashboard_view(&data).into_response())
}
