//! `servers` command: list the configured servers.

use qbremote_core::{ServerConfig, ServerRegistry};

pub fn run_servers_command(registry: &ServerRegistry) {
    let servers = registry.list();
    if servers.is_empty() {
        println!("no servers configured");
        return;
    }
    for server in &servers {
        println!("{}", describe_server(server));
    }
}

/// One tab-separated line: id, name, base URL, auth mode.
fn describe_server(server: &ServerConfig) -> String {
    let mut auth = if server.login_credentials().is_some() {
        "login".to_string()
    } else {
        "anonymous".to_string()
    };
    if server.basic_auth.is_some() {
        auth.push_str("+basic");
    }
    format!(
        "{}\t{}\t{}\t{auth}",
        server.id,
        server.display_name(),
        server.base_url
    )
}
