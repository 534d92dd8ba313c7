use anyhow::Result;
use clap::{Args, Subcommand};
use loadout::services::ConfigService;
use std::path::Path;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write loadout.toml with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

pub async fn execute(args: ConfigArgs, root: &Path) -> Result<()> {
    let config_service = ConfigService::new(root);

    match args.command {
        ConfigCommands::Init { force } => {
            if config_service.exists() && !force {
                return Err(anyhow::anyhow!(
                    "loadout.toml already exists. Use --force to overwrite."
                ));
            }
            config_service.init()?;
            println!("Wrote {}", root.join(loadout::services::config::CONFIG_FILE).display());
        },

        ConfigCommands::Show => {
            let config = config_service.load()?;
            print!("{}", config_service.render(&config)?);
        },

        ConfigCommands::Get { key } => {
            let value = config_service.get(&key)?;
            println!("{}", value);
        },

        ConfigCommands::Set { key, value } => {
            config_service.set(&key, value.clone())?;
            println!("Set {} = {}", key, value);
        },
    }

    Ok(())
}
