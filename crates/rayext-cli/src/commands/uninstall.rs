//! `rayext uninstall`

use colored::Colorize;
use rayext_core::{ExtensionManager, UninstallOutcome};

use super::finish;
use crate::cli::ExtensionArg;
use crate::error::Result;

pub async fn run_uninstall(manager: &ExtensionManager, extensions: &[String]) -> Result<()> {
    let names: Vec<String> = extensions
        .iter()
        .map(|raw| ExtensionArg::parse(raw).name)
        .collect();
    let report = match manager.uninstall_all(&names).await {
        Ok(report) => report,
        Err(e) if e.is_cancelled() => {
            println!("{} nothing was removed", "-".dimmed());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for outcome in &report.completed {
        match outcome {
            UninstallOutcome::Removed {
                repository, titles, ..
            } => {
                let label = if titles.is_empty() {
                    repository.clone()
                } else {
                    titles.join(", ")
                };
                println!("{} removed {}", "✓".green().bold(), label.cyan());
                println!("  now remove {} from Raycast as well", label.bold());
            }
            UninstallOutcome::NotInstalled { name } => {
                println!("{} {name} is not installed", "-".dimmed());
            }
        }
    }
    finish("uninstalls", &report)
}
