//! Push notifications: registered delivery endpoints and the fan-out that
//! sends a message to all of a user's endpoints.

mod core;
mod register_endpoint;
mod unregister_endpoint;

pub use core::{
    LogPushSender, PushEndpoint, PushSender, create_push_endpoint_table, list_push_endpoints,
    notify_user, register_push_endpoint,
};
pub use register_endpoint::register_push_endpoint_endpoint;
pub use unregister_endpoint::unregister_push_endpoint_endpoint;
