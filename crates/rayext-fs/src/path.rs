//! Path identifier validation and version directory naming

use crate::{Error, Result};

/// Validate a repository identifier of the form `owner/name`.
///
/// Both segments must be non-empty, must not be `.` or `..`, and may only
/// contain ASCII alphanumerics, `-`, `_` and `.`. Identifiers that pass are
/// safe to join onto a filesystem root.
pub fn validate_repository_id(id: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidRepositoryId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = id.split('/');
    let (Some(owner), Some(name), None) = (segments.next(), segments.next(), segments.next())
    else {
        return Err(invalid("expected the form owner/name"));
    };

    for segment in [owner, name] {
        if segment.is_empty() {
            return Err(invalid("segments must not be empty"));
        }
        if segment == "." || segment == ".." {
            return Err(invalid("segments must not be relative path components"));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(invalid(
                "only alphanumeric characters, '-', '_' and '.' are allowed",
            ));
        }
    }

    Ok(())
}

/// Encode a tag or branch name as a single directory name.
///
/// `/` becomes `%2F` (and `%` becomes `%25`) so that `feature/x` does not
/// create nested directories.
pub fn encode_version_dir(version: &str) -> String {
    let mut out = String::with_capacity(version.len());
    for c in version.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            _ => out.push(c),
        }
    }
    if out == "." || out == ".." {
        out = out.replace('.', "%2E");
    }
    out
}

/// Inverse of [`encode_version_dir`].
pub fn decode_version_dir(dir: &str) -> String {
    dir.replace("%2F", "/")
        .replace("%5C", "\\")
        .replace("%2E", ".")
        .replace("%25", "%")
}
