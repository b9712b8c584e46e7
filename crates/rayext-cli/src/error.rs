//! Error types for rayext-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] rayext_core::Error),

    #[error(transparent)]
    Github(#[from] rayext_github::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_displays_message() {
        assert_eq!(CliError::user("2 of 3 failed").to_string(), "2 of 3 failed");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err = CliError::from(rayext_core::Error::NotInstalled("owner/demo".into()));
        assert_eq!(
            err.to_string(),
            rayext_core::Error::NotInstalled("owner/demo".into()).to_string()
        );
    }
}
