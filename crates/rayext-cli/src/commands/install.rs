//! `rayext install`

use colored::Colorize;
use rayext_core::{ExtensionManager, InstallOutcome, InstallTarget, VersionHint};

use super::finish;
use crate::cli::ExtensionArg;
use crate::error::Result;

/// Install targets for `extensions`. The version part of each argument is a
/// tag hint; `branch` applies to all of them.
pub fn targets(
    extensions: &[String],
    branch: Option<&str>,
    packages: &[String],
) -> Vec<InstallTarget> {
    extensions
        .iter()
        .map(|raw| {
            let arg = ExtensionArg::parse(raw);
            InstallTarget::new(arg.name)
                .with_hint(VersionHint {
                    tag: arg.version,
                    branch: branch.map(str::to_string),
                })
                .with_packages(packages.to_vec())
        })
        .collect()
}

pub async fn run_install(
    manager: &ExtensionManager,
    extensions: &[String],
    branch: Option<&str>,
) -> Result<()> {
    let targets = targets(extensions, branch, &manager.settings().packages);
    let report = manager.install_all(targets).await;
    for outcome in &report.completed {
        print_installed(outcome);
    }
    finish("installs", &report)
}

fn print_installed(outcome: &InstallOutcome) {
    println!(
        "{} installed {} {}",
        "✓".green().bold(),
        outcome.repository.cyan(),
        outcome.version
    );
    if outcome.keys.len() > 1 {
        for key in &outcome.keys {
            println!("  {key}");
        }
    }
    for path in &outcome.stale_left {
        println!(
            "{} could not remove old version {}",
            "warning:".yellow().bold(),
            path.display()
        );
    }
}
