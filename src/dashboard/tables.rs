//! Table views for the dashboard.
//!
//! Provides the lists of incomes and expenses and the totals summary.

use maud::{Markup, html};

use crate::{
    endpoints::{self, format_endpoint},
    html::{LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE},
    transaction::{Amount, Totals, Transaction, TransactionType},
};

const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

/// Gets the CSS class for coloring amounts (green for positive, red for negative).
fn amount_color_class(amount: Amount) -> &'static str {
    if amount.is_negative() {
        TABLE_CELL_RED_STYLE
    } else {
        TABLE_CELL_GREEN_STYLE
    }
}

fn add_transaction_url(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Income => endpoints::ADD_INCOME_VIEW,
        TransactionType::Expense => endpoints::ADD_EXPENSE_VIEW,
    }
}

/// Renders one row per transaction with links to edit or delete it.
///
/// Amounts are shown without their sign, the table heading says which way the money went.
pub(super) fn transactions_table(
    title: &str,
    transaction_type: TransactionType,
    transactions: &[Transaction],
) -> Markup {
    let section_id = format!("{}-table", transaction_type.as_str());
    let empty_message = format!("No {} yet.", title.to_lowercase());

    html! {
        section id=(section_id) class="w-full mb-8"
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h3 class="text-xl font-semibold" { (title) }

                a href=(add_transaction_url(transaction_type)) class=(LINK_STYLE)
                {
                    "Add " (transaction_type.label().to_lowercase())
                }
            }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                        }
                    }

                    tbody
                    {
                        @if transactions.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan="4" class={(TABLE_CELL_STYLE) " text-center"} { (empty_message) }
                            }
                        }

                        @for transaction in transactions {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class={(TABLE_CELL_STYLE) " whitespace-nowrap"} { (transaction.date) }
                                td class=(TABLE_CELL_STYLE) { (transaction) }
                                td class={(TABLE_CELL_STYLE) " text-right " (amount_color_class(transaction.amount))}
                                {
                                    (transaction.amount.abs())
                                }
                                td class={(TABLE_CELL_STYLE) " space-x-4 whitespace-nowrap"}
                                {
                                    a
                                        href=(format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id))
                                        class=(LINK_STYLE)
                                    {
                                        "Edit"
                                    }

                                    a
                                        href=(format_endpoint(endpoints::DELETE_TRANSACTION_VIEW, transaction.id))
                                        class=(LINK_STYLE)
                                    {
                                        "Delete"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Renders the total income, total expenses and net balance.
pub(super) fn totals_table(totals: &Totals) -> Markup {
    html! {
        section id="totals" class="w-full mb-8"
        {
            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    tbody
                    {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class=(TABLE_CELL_STYLE) { "Total income" }
                            td class={(TABLE_CELL_STYLE) " text-right " (TABLE_CELL_GREEN_STYLE)} { (totals.income) }
                        }

                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class=(TABLE_CELL_STYLE) { "Total expenses" }
                            td class={(TABLE_CELL_STYLE) " text-right " (TABLE_CELL_RED_STYLE)} { (totals.expenses) }
                        }

                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class={(TABLE_CELL_STYLE) " font-bold"} { "Balance" }
                            td class={(TABLE_CELL_STYLE) " text-right font-bold " (amount_color_class(totals.balance))}
                            {
                                (totals.balance)
                            }
                        }
                    }
                }
            }
        }
    }
}
