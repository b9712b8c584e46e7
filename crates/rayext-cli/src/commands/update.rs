//! `rayext update`

use colored::Colorize;
use rayext_core::{ExtensionManager, UpdateOutcome};

use super::finish;
use crate::cli::ExtensionArg;
use crate::error::Result;

/// Update the named extensions, or every installed one when `extensions` is
/// empty.
pub async fn run_update(manager: &ExtensionManager, extensions: &[String]) -> Result<()> {
    let report = if extensions.is_empty() {
        manager.update_all().await?
    } else {
        let names: Vec<String> = extensions
            .iter()
            .map(|raw| ExtensionArg::parse(raw).name)
            .collect();
        manager.update_many(&names).await
    };

    if report.is_empty() {
        println!("no extensions installed");
    }
    for outcome in &report.completed {
        match outcome {
            UpdateOutcome::AlreadyLatest {
                repository,
                version,
            } => println!("{} {} is up to date ({version})", "=".dimmed(), repository.cyan()),
            UpdateOutcome::Updated { from, install } => {
                let from = from
                    .as_ref()
                    .map(|v| v.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "{} updated {} {from} → {}",
                    "✓".green().bold(),
                    install.repository.cyan(),
                    install.version.name()
                );
            }
        }
    }
    finish("updates", &report)
}
