//! CLI command handlers, one per file.

mod exists;
mod get;
mod info;
mod put;

pub use exists::run_exists;
pub use get::run_get;
pub use info::run_info;
pub use put::run_put;
