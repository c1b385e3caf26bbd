use clap::Subcommand;
use pomodoro_core::Settings;

use super::{open_engine, print_json};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a settings value
    Get {
        /// Settings key (e.g. "work_minutes", "long_break_interval")
        key: String,
    },
    /// Set a settings value
    Set {
        /// Settings key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings
    List,
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;

    match action {
        ConfigAction::Get { key } => {
            let settings = engine.settings()?;
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = engine.settings()?;
            settings.set(&key, &value)?;
            engine.update_settings(settings)?;
            println!("ok");
        }
        ConfigAction::List => print_json(&engine.settings()?)?,
        ConfigAction::Reset => {
            engine.update_settings(Settings::default())?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
