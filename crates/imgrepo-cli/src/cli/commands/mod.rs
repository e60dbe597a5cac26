//! CLI command handlers, one per file.

mod checksum;
mod completions;
mod list;
mod path;
mod pull;
mod status;
mod verify;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use list::run_list;
pub use path::run_path;
pub use pull::run_pull;
pub use status::run_status;
pub use verify::run_verify;
