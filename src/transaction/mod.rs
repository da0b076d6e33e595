//! Transactions: realized money movements, recurring templates, and the
//! transfer pairs built from them.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod transfer_endpoint;

pub(crate) use core::TRANSACTION_COLUMNS;
pub use core::{
    NewTransaction, Transaction, TransactionFilter, TransactionKind, TransactionPatch,
    create_transaction, create_transaction_table, create_transfer, delete_transfer,
    get_transaction, list_transactions, map_transaction_row, post_transaction,
    remove_transaction, revise_transaction, transfer_owner,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use transfer_endpoint::{create_transfer_endpoint, delete_transfer_endpoint};
