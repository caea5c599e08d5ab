//! `quest settings` -- typed key-value app settings.

use anyhow::{Context, Result};

use quest_core::enums::SettingType;
use quest_storage::Storage;

use crate::cli::{SettingsArgs, SettingsCommands, SettingsSetArgs};
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table, parse_variant};

/// Execute the `quest settings` command.
pub fn run(ctx: &RuntimeContext, args: &SettingsArgs) -> Result<()> {
    let store = ctx.open_store()?;

    match &args.command {
        SettingsCommands::List => {
            let settings = store.list_settings().context("failed to list settings")?;
            if ctx.json {
                output_json(&settings);
            } else {
                let rows: Vec<Vec<String>> = settings
                    .iter()
                    .map(|s| {
                        vec![
                            s.key.clone(),
                            s.value.clone(),
                            s.setting_type.to_string(),
                            s.description.clone(),
                        ]
                    })
                    .collect();
                output_table(&["KEY", "VALUE", "TYPE", "DESCRIPTION"], &rows);
            }
        }

        SettingsCommands::Get(get) => {
            let setting = store
                .get_setting(&get.key)
                .with_context(|| format!("failed to read setting '{}'", get.key))?;
            if ctx.json {
                output_json(&setting);
            } else {
                println!("{}", setting.value);
            }
        }

        SettingsCommands::Set(set) => run_set(ctx, &store, set)?,
    }

    Ok(())
}

fn run_set(ctx: &RuntimeContext, store: &dyn Storage, args: &SettingsSetArgs) -> Result<()> {
    let setting_type = match &args.setting_type {
        Some(t) => parse_variant(t, "type", SettingType::parse_builtin, SettingType::BUILTIN)?,
        None => match store.get_setting(&args.key) {
            Ok(existing) => existing.setting_type,
            Err(e) if e.is_not_found() => SettingType::String,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read setting '{}'", args.key));
            }
        },
    };

    store
        .set_setting(&args.key, &args.value, &setting_type)
        .with_context(|| format!("failed to set '{}'", args.key))?;

    if ctx.json {
        output_json(&serde_json::json!({
            "key": args.key,
            "value": args.value,
            "setting_type": setting_type,
        }));
    } else if !ctx.quiet {
        println!("Set {} = {} ({})", args.key, args.value, setting_type);
    }
    Ok(())
}
