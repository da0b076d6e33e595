//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
pub type AccountId = i64;
pub type TransactionId = i64;
pub type CategoryId = i64;
pub type CreditId = i64;
pub type TransferId = i64;
pub type ShareId = i64;
pub type PushEndpointId = i64;
