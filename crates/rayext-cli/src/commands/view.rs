//! `rayext view`

use std::collections::BTreeMap;

use colored::Colorize;
use rayext_core::ExtensionManager;
use rayext_manifest::{ExtensionRecord, Person};

use crate::cli::ExtensionArg;
use crate::error::Result;

pub async fn run_view(manager: &ExtensionManager, extensions: &[String]) -> Result<()> {
    for (i, raw) in extensions.iter().enumerate() {
        let arg = ExtensionArg::parse(raw);
        let (_, record) = manager.view(&arg.name).await?;
        if i > 0 {
            println!();
        }
        print!("{}", render(&record));
    }
    Ok(())
}

fn person(person: &Person) -> String {
    match person {
        Person::Name(name) => name.clone(),
        Person::Detailed { name, email, url } => {
            let mut parts = vec![name.clone()];
            parts.extend(email.iter().map(|e| format!("<{e}>")));
            parts.extend(url.iter().map(|u| format!("({u})")));
            parts.join(" ")
        }
    }
}

fn section(out: &mut String, heading: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}\n", heading.bold()));
    for line in lines {
        out.push_str(&format!("  {line}\n"));
    }
}

fn described(name: &str, description: Option<&str>) -> String {
    match description {
        Some(description) => format!("{}: {description}", name.cyan()),
        None => name.cyan().to_string(),
    }
}

fn dependencies(record: &ExtensionRecord) -> Vec<String> {
    let all: BTreeMap<&String, &String> = record
        .dependencies
        .iter()
        .chain(&record.peer_dependencies)
        .chain(&record.optional_dependencies)
        .collect();
    all.into_iter()
        .map(|(name, range)| format!("{name} {}", range.dimmed()))
        .collect()
}

fn render(record: &ExtensionRecord) -> String {
    let version = match record.version_name() {
        "" => "unknown",
        v => v,
    };
    let deps = dependencies(record);
    let mut out = format!(
        "{}@{} | {} | deps: {} | cmds: {} | preferences: {}\n",
        record.title.green().bold(),
        version,
        record.license.as_deref().unwrap_or("UNLICENSED").to_uppercase(),
        deps.len(),
        record.commands.len(),
        record.preferences.len(),
    );
    if let Some(url) = &record.url {
        out.push_str(&format!("{}\n", url.blue()));
    }
    if let Some(description) = &record.description {
        out.push_str(&format!("{description}\n"));
    }
    if let Some(commit) = &record.commit {
        out.push_str(&format!("{} {}\n", "commit:".dimmed(), commit.sha));
    }

    if let Some(author) = &record.author {
        out.push_str(&format!("\n{} {}\n", "author:".bold(), person(author)));
    }
    let contributors: Vec<String> = record.contributors.iter().map(person).collect();
    section(&mut out, "contributors:", &contributors);
    let categories: Vec<String> = record.categories.iter().cloned().collect();
    section(&mut out, "categories:", &categories);
    let commands: Vec<String> = record
        .commands
        .iter()
        .map(|c| described(c.display_name(), c.description.as_deref()))
        .collect();
    section(&mut out, "commands:", &commands);
    let preferences: Vec<String> = record
        .preferences
        .iter()
        .map(|p| described(p.display_name(), p.description.as_deref()))
        .collect();
    section(&mut out, "preferences:", &preferences);
    section(&mut out, "dependencies:", &deps);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rayext_manifest::{CommandDescriptor, PreferenceDescriptor};

    #[test]
    fn test_render_full_record() {
        colored::control::set_override(false);
        let record = ExtensionRecord {
            repository: "owner/demo".into(),
            title: "Demo".into(),
            url: Some("https://github.com/owner/demo".into()),
            description: Some("Does demo things".into()),
            license: Some("mit".into()),
            author: Some(Person::Detailed {
                name: "Jane".into(),
                email: Some("jane@example.com".into()),
                url: None,
            }),
            contributors: vec![Person::Name("bob".into())],
            categories: ["Productivity".to_string()].into(),
            commands: vec![CommandDescriptor {
                name: "index".into(),
                title: Some("Open Demo".into()),
                description: Some("Opens it".into()),
                extra: Default::default(),
            }],
            preferences: vec![PreferenceDescriptor {
                name: "token".into(),
                kind: Some("password".into()),
                default: None,
                required: true,
                title: Some("Token".into()),
                label: None,
                description: None,
                extra: Default::default(),
            }],
            dependencies: [("@raycast/api".to_string(), "^1.70.0".to_string())].into(),
            tag: Some("v2.0".into()),
            ..Default::default()
        };

        let expected = "\
Demo@v2.0 | MIT | deps: 1 | cmds: 1 | preferences: 1
https://github.com/owner/demo
Does demo things

author: Jane <jane@example.com>

contributors:
  bob

categories:
  Productivity

commands:
  Open Demo: Opens it

preferences:
  Token

dependencies:
  @raycast/api ^1.70.0
";
        assert_eq!(render(&record), expected);
    }

    #[test]
    fn test_render_minimal_record() {
        colored::control::set_override(false);
        let record = ExtensionRecord {
            title: "Bare".into(),
            ..Default::default()
        };
        assert_eq!(
            render(&record),
            "Bare@unknown | UNLICENSED | deps: 0 | cmds: 0 | preferences: 0\n"
        );
    }
}
