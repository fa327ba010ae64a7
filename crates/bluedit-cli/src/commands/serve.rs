use bluedit_gateway::Gateway;

use crate::cli::{GlobalOpts, ServeArgs};
use crate::config::load_config;
use crate::error::CliError;
use crate::output::OutputContext;

/// Run the `serve` command until the server stops.
pub async fn run(
    args: ServeArgs,
    global: &GlobalOpts,
    output: &OutputContext,
) -> Result<(), CliError> {
    let mut config = load_config(global.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    let gateway = Gateway::builder().with_config(config).build()?;
    let addr = format!(
        "{}:{}",
        gateway.config().server.host,
        gateway.config().server.port
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CliError::Serve {
            message: format!("failed to bind {addr}: {e}"),
        })?;

    output.success(&format!(
        "Bluedit BFF ({}) listening on http://{addr}",
        gateway.config().environment
    ));

    gateway.serve_on(listener).await.map_err(|e| CliError::Serve {
        message: e.to_string(),
    })
}
