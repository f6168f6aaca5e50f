use std::error::Error;

use clap::Subcommand;

use crate::core::config::data::path_display;
use crate::core::config::{ConfigKey, ConfigOrchestrator, SettingError};

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print every key with its current value
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g. backend-url, theme, markdown)
        key: String,
        /// Value for the key; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        value: Vec<String>,
    },
    /// Clear a configuration value
    Unset { key: String },
}

pub fn run_config(command: ConfigCommand, orchestrator: &ConfigOrchestrator) -> Result<(), Box<dyn Error>> {
    for line in execute(command, orchestrator)? {
        println!("{line}");
    }
    Ok(())
}

pub fn execute(command: ConfigCommand, orchestrator: &ConfigOrchestrator) -> Result<Vec<String>, SettingError> {
    match command {
        ConfigCommand::Show => {
            let config = orchestrator.load()?;
            let mut lines = vec![format!("Config file: {}", path_display(orchestrator.path()))];
            lines.extend(ConfigKey::ALL.iter().map(|key| format!("  {}", key.display(&config))));
            Ok(lines)
        }
        ConfigCommand::Set { key, value } => {
            let key: ConfigKey = key.parse()?;
            let value = value.join(" ");
            let shown = orchestrator.mutate(|config| key.set(config, &value))?;
            Ok(vec![format!("✅ Set {shown}")])
        }
        ConfigCommand::Unset { key } => {
            let key: ConfigKey = key.parse()?;
            orchestrator.mutate(|config| {
                key.unset(config);
                Ok::<_, SettingError>(())
            })?;
            Ok(vec![format!("✅ Unset {key}")])
        }
    }
}
