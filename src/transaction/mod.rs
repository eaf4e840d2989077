//! Income and expense tracking.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the `Amount` type for money
//! - Database functions for storing and querying a user's transactions
//! - View handlers for adding, editing and deleting transactions

mod amount;
mod core;
mod create;
mod delete;
mod edit;
mod form;

pub use amount::{Amount, AmountError};
pub use core::{
    InvalidTransactionType, NewTransaction, Totals, Transaction, TransactionType,
    TransactionUpdate, count_transactions, create_transaction, create_transaction_table,
    delete_transaction, get_totals, get_transaction, get_transactions_by_type,
    update_transaction,
};
pub use create::{add_transaction, get_add_transaction_page};
pub use delete::{delete_transaction_endpoint, get_delete_transaction_page};
pub use edit::{edit_transaction, get_edit_transaction_page};
