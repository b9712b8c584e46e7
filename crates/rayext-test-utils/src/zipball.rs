//! Host-style zip archives: every entry under one `owner-name-sha/` folder.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const ROOT: &str = "owner-repo-0123abc";

/// Zip `files` beneath a single top-level directory.
pub fn zipball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.add_directory(format!("{ROOT}/"), options).unwrap();
    for (path, content) in files {
        writer.start_file(format!("{ROOT}/{path}"), options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn package_json(name: &str, title: &str) -> String {
    serde_json::json!({
        "name": name,
        "title": title,
        "description": format!("{title} extension"),
        "license": "MIT",
        "author": "jane",
        "categories": ["Productivity"],
        "commands": [{"name": "index", "title": format!("Open {title}"), "mode": "view"}],
        "preferences": [{"name": "token", "type": "password", "title": "Token"}],
        "dependencies": {"@raycast/api": "^1.70.0"}
    })
    .to_string()
}

/// A single extension with a `package.json` at the archive root.
pub fn extension_zipball(name: &str, title: &str) -> Vec<u8> {
    let package = package_json(name, title);
    zipball(&[
        ("package.json", package.as_str()),
        ("src/index.tsx", "export default function Command() {}"),
    ])
}

/// A workspace with one extension per `(path, title)`.
pub fn monorepo_zipball(packages: &[(&str, &str)]) -> Vec<u8> {
    let descriptors: Vec<(String, String)> = packages
        .iter()
        .map(|&(path, title)| {
            let name = path.rsplit('/').next().unwrap_or(path);
            (format!("{path}/package.json"), package_json(name, title))
        })
        .collect();
    let mut files: Vec<(&str, &str)> = vec![("package.json", r#"{"private": true}"#)];
    files.extend(descriptors.iter().map(|(p, c)| (p.as_str(), c.as_str())));
    zipball(&files)
}
