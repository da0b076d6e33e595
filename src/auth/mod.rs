//! Authentication glue around the external identity provider.
//!
//! The provider is the source of truth for who a token belongs to; this
//! service trusts the identifier it resolves and scopes every query by it.

mod delete_user_endpoint;
mod middleware;
mod provider;

pub use delete_user_endpoint::delete_user_endpoint;
pub use middleware::{AuthState, auth_guard};
pub use provider::{
    IdentityProvider, SqliteIdentityProvider, create_auth_session_table, create_session,
};
