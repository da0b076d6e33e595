//! Credits track money lent out and the outstanding amount still owed.
//!
//! Transactions link to a credit via `credit_id` to record repayments; the
//! outstanding balance moves with those links but remains a directly editable
//! scalar of record.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    Credit, CreditPatch, NewCredit, apply_repayment, create_credit, create_credit_table,
    get_credit, list_credits, map_credit_row, reverse_repayment,
};
pub use create_endpoint::create_credit_endpoint;
pub use delete_endpoint::delete_credit_endpoint;
pub use edit_endpoint::edit_credit_endpoint;
pub use list_endpoint::list_credits_endpoint;
