//! Command implementations for rayext-cli

pub mod install;
pub mod list;
pub mod uninstall;
pub mod update;
pub mod view;

pub use install::run_install;
pub use list::run_list;
pub use uninstall::run_uninstall;
pub use update::run_update;
pub use view::run_view;

use colored::Colorize;
use rayext_core::BatchReport;

use crate::error::{CliError, Result};

/// Print per-target failures and aborts. Failures make the command fail;
/// targets the user aborted do not.
fn finish<T>(verb: &str, report: &BatchReport<T>) -> Result<()> {
    for name in &report.aborted {
        println!("{} {name}: aborted", "-".dimmed());
    }
    for (name, error) in &report.failed {
        eprintln!("{} {name}: {error}", "✗".red().bold());
    }
    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} of {} {verb} failed",
            report.failed.len(),
            report.len()
        )))
    }
}
