use crate::cli::{ConfigCommands, ConfigFormat, GlobalOpts};
use crate::config::{find_config, load_config, redacted};
use crate::error::CliError;
use crate::output::OutputContext;

pub async fn run(
    command: ConfigCommands,
    global: &GlobalOpts,
    output: &OutputContext,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show(args) => {
            if find_config(global.config.as_deref()).is_none() {
                output.warn("no configuration file found; showing defaults and environment overrides");
            }
            let config = redacted(&load_config(global.config.as_deref())?);
            let rendered = match args.format {
                ConfigFormat::Toml => toml::to_string_pretty(&config)
                    .map_err(|e| CliError::Other(format!("could not render TOML: {e}")))?,
                ConfigFormat::Json => serde_json::to_string_pretty(&config)
                    .map_err(|e| CliError::Other(format!("could not render JSON: {e}")))?,
            };
            output.print(&rendered);
            Ok(())
        }
    }
}
