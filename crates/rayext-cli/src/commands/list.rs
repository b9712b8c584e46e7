//! `rayext list`

use colored::Colorize;
use rayext_core::ExtensionManager;
use rayext_manifest::ExtensionRecord;

use crate::error::Result;

pub fn run_list(manager: &ExtensionManager) -> Result<()> {
    let records = manager.list()?;
    print!("{}", render(&manager.layout().root().display().to_string(), &records));
    Ok(())
}

fn render(root: &str, records: &[(String, ExtensionRecord)]) -> String {
    let mut out = format!(
        "{} {}\n",
        root.bold(),
        format!("({} installed)", records.len()).dimmed()
    );
    if records.is_empty() {
        out.push_str("no extensions installed\n");
    }
    for (key, record) in records {
        let version = record.version_name();
        let target = if version.is_empty() {
            key.clone()
        } else {
            format!("{key}@{version}")
        };
        out.push_str(&format!("{} → {}\n", record.title.green(), target.cyan()));
    }
    out
}
