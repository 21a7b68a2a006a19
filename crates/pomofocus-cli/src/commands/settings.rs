use std::error::Error;

use clap::Subcommand;
use pomofocus_core::{EntitlementGateway, Settings};

use super::print_json;
use crate::app::App;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Get a setting
    Get {
        /// Setting key (e.g. "work_minutes", "ambient_volume")
        key: String,
    },
    /// Set a setting
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings
    List,
    /// Reset settings to defaults
    Reset,
}

pub fn run(app: &App, action: SettingsAction) -> Result<(), Box<dyn Error>> {
    let store = app.store.as_ref();

    match action {
        SettingsAction::Get { key } => {
            let settings = app.settings();
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        SettingsAction::Set { key, value } => {
            let mut settings = app.settings();
            settings.set(&key, &value)?;
            settings.save(store)?;
            // Clamped value, which may differ from what was typed.
            if let Some(stored) = settings.get(&key) {
                println!("{stored}");
            }
        }
        SettingsAction::List => print_json(&app.settings())?,
        SettingsAction::Reset => {
            let mut settings = Settings::default();
            if let Ok(entitlement) = app.entitlements().entitlement() {
                settings.sync_entitlement(&entitlement);
            }
            settings.save(store)?;
            print_json(&settings)?;
        }
    }
    Ok(())
}
