//! Accounts hold a running balance maintained incrementally by the ledger.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    Account, AccountKind, AccountPatch, NewAccount, create_account, create_account_table,
    get_account, list_accounts, map_account_row,
};
pub use create_endpoint::create_account_endpoint;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::edit_account_endpoint;
pub use list_endpoint::list_accounts_endpoint;
