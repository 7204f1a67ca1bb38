//! CLI command handlers.

mod request;
mod servers;
mod version;

pub use request::{run_get_command, run_login_command, run_post_command};
pub use servers::run_servers_command;
pub use version::{run_version_all_command, run_version_command};
