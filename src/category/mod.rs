//! Categories label transactions for reporting. Each user owns their own set.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    Category, create_category, create_category_table, get_category, list_categories,
    map_category_row,
};
pub use create_endpoint::create_category_endpoint;
pub use delete_endpoint::delete_category_endpoint;
pub use edit_endpoint::edit_category_endpoint;
pub use list_endpoint::list_categories_endpoint;
