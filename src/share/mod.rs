//! Dashboard sharing: permission edges that let one user view or edit
//! another user's financial data.

mod core;
mod grant_endpoint;
mod list_endpoint;
mod revoke_endpoint;
mod update_endpoint;

pub use core::{
    DashboardShare, Permission, create_dashboard_share_table, ensure_edit_access,
    ensure_read_access, grant_share, map_dashboard_share_row,
};
pub use grant_endpoint::grant_share_endpoint;
pub use list_endpoint::list_shares_endpoint;
pub use revoke_endpoint::revoke_share_endpoint;
pub use update_endpoint::update_share_endpoint;
