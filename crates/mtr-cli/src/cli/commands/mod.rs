//! CLI command handlers. Each command is in its own file.

mod completions;
mod purge_cache;
mod resolve;
mod scan_log;
mod serve;

pub use completions::run_completions;
pub use purge_cache::run_purge_cache;
pub use resolve::run_resolve;
pub use scan_log::run_scan_log;
pub use serve::run_serve;
