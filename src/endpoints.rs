//! The API endpoint URIs.

/// The route to list and create accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to update or delete a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to update or delete a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create transfers between accounts.
pub const TRANSFERS: &str = "/api/transfers";
/// The route to delete both legs of a transfer.
pub const TRANSFER: &str = "/api/transfers/{transfer_id}";
/// The route to list and create credits.
pub const CREDITS: &str = "/api/credits";
/// The route to update or delete a single credit.
pub const CREDIT: &str = "/api/credits/{credit_id}";
/// The route to list and grant dashboard shares.
pub const SHARES: &str = "/api/shares";
/// The route to update or revoke a single share.
pub const SHARE: &str = "/api/shares/{share_id}";
/// The route to list and register push endpoints.
pub const PUSH_ENDPOINTS: &str = "/api/push-endpoints";
/// The route to remove a push endpoint.
pub const PUSH_ENDPOINT: &str = "/api/push-endpoints/{endpoint_id}";
/// The route that runs the recurring processor (POST) or previews its due
/// items (GET).
pub const PROCESS_RECURRING: &str = "/api/process-recurring";
/// The route that archives past transactions and records the closure.
pub const CHANGE_MONTH: &str = "/api/change-month";
/// The route to list month closures.
pub const CLOSURES: &str = "/api/closures";
/// The route to delete the calling user and everything they own.
pub const USER: &str = "/api/user";

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ACCOUNTS);
        assert_endpoint_is_valid_uri(endpoints::ACCOUNT);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::CATEGORY);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::TRANSFERS);
        assert_endpoint_is_valid_uri(endpoints::TRANSFER);
        assert_endpoint_is_valid_uri(endpoints::CREDITS);
        assert_endpoint_is_valid_uri(endpoints::CREDIT);
        assert_endpoint_is_valid_uri(endpoints::SHARES);
        assert_endpoint_is_valid_uri(endpoints::SHARE);
        assert_endpoint_is_valid_uri(endpoints::PUSH_ENDPOINTS);
        assert_endpoint_is_valid_uri(endpoints::PUSH_ENDPOINT);
        assert_endpoint_is_valid_uri(endpoints::PROCESS_RECURRING);
        assert_endpoint_is_valid_uri(endpoints::CHANGE_MONTH);
        assert_endpoint_is_valid_uri(endpoints::CLOSURES);
        assert_endpoint_is_valid_uri(endpoints::USER);
    }
}
