//! Output formatting utilities

use colored::*;
use mailveil_engine::{AppliedProfile, PanelForm, ReconciliationPlan};
use mailveil_store::WriteOp;
use serde::Serialize;

use crate::error::CliResult;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(data: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

pub fn print_form(form: &PanelForm, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(form),
        OutputFormat::Text => {
            println!("{:<22} {}", "profile:".bold(), form.kind);
            if let Some(variant) = form.variant {
                println!("{:<22} {:?}", "relay:".bold(), variant);
            }
            match &form.endpoint {
                Some(endpoint) => println!("{:<22} {}", "endpoint:".bold(), endpoint),
                None => println!("{:<22} {}", "endpoint:".bold(), "none".dimmed()),
            }
            println!(
                "{:<22} {}",
                "idle polling:".bold(),
                form.toggles.use_server_idle_polling
            );
            println!(
                "{:<22} {}",
                "restore last folder:".bold(),
                form.toggles.restore_last_folder
            );
            println!("{:<22} {}", "hide key ids:".bold(), form.toggles.hide_key_id);
            Ok(())
        }
    }
}

pub fn print_applied(applied: &AppliedProfile, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(applied),
        OutputFormat::Text => {
            print_success(&format!("{} ({} writes)", applied.label, applied.writes));
            Ok(())
        }
    }
}

pub fn print_plan(plan: &ReconciliationPlan, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let ops: Vec<_> = plan
                .batch
                .ops()
                .iter()
                .map(|op| match op {
                    WriteOp::Set { key, value } => {
                        serde_json::json!({ "op": "set", "key": key, "value": value })
                    }
                    WriteOp::Clear { key } => serde_json::json!({ "op": "clear", "key": key }),
                })
                .collect();
            print_json(&serde_json::json!({
                "kind": plan.selection.kind,
                "stale_shadow_keys": plan.stale_shadow_keys,
                "ops": ops,
            }))
        }
        OutputFormat::Text => {
            for op in plan.batch.ops() {
                match op {
                    WriteOp::Set { key, value } => println!("{} {key} = {value}", "set  ".green()),
                    WriteOp::Clear { key } => println!("{} {key}", "clear".yellow()),
                }
            }
            println!("{}", format!("{} operations, nothing written", plan.batch.len()).dimmed());
            Ok(())
        }
    }
}

pub fn print_line(value: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Text => {
            println!("{value}");
            Ok(())
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}
