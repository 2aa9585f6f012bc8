//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{WheelwrightError, WheelwrightResult};
use console::style;

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config) -> WheelwrightResult<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => show(config),
        ConfigAction::Path => {
            println!("{}", ConfigManager::default_config_path().display());
            Ok(())
        }
        ConfigAction::Init { force } => init(force).await,
    }
}

fn show(config: &Config) -> WheelwrightResult<()> {
    let content = toml::to_string_pretty(config)?;
    println!("{}", content);
    Ok(())
}

async fn init(force: bool) -> WheelwrightResult<()> {
    let manager = ConfigManager::new();

    if manager.path().exists() && !force {
        return Err(WheelwrightError::User(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            manager.path().display()
        )));
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Wrote default configuration to {}",
        style("✓").green(),
        manager.path().display()
    );
    Ok(())
}
