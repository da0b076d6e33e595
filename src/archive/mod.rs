//! Month archiving: closing out a past period by marking its transactions
//! immutable-for-reporting and recording the covered date range.

mod change_month_endpoint;
mod closures_endpoint;
mod core;

pub use change_month_endpoint::change_month_endpoint;
pub use closures_endpoint::list_closures_endpoint;
pub use core::{
    ArchiveSummary, MonthClosure, archive_transactions, create_month_closure_table,
    list_closures, map_month_closure_row,
};
