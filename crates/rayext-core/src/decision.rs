//! Decision sources
//!
//! Resolution and lifecycle steps never prompt directly. They ask a
//! [`Decider`], which is either a terminal UI or a fixed policy.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Source of user decisions.
///
/// Returning `Err(Error::Cancelled)` aborts the current target.
#[async_trait]
pub trait Decider: Send + Sync {
    /// Pick one of `options`; `default` is the preselected index.
    async fn select(&self, prompt: &str, options: &[String], default: usize) -> Result<usize>;

    /// Yes or no.
    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Ask for confirmation and turn a "no" into [`Error::Cancelled`].
pub async fn require(decider: &dyn Decider, prompt: &str, default: bool) -> Result<()> {
    if decider.confirm(prompt, default).await? {
        Ok(())
    } else {
        Err(Error::Cancelled)
    }
}

/// Non-interactive decider: always takes the default option.
///
/// With `assume_yes`, every confirmation is answered yes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyDecider {
    assume_yes: bool,
}

impl PolicyDecider {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl Decider for PolicyDecider {
    async fn select(&self, prompt: &str, options: &[String], default: usize) -> Result<usize> {
        let Some(choice) = options.get(default) else {
            return Err(Error::Cancelled);
        };
        tracing::info!(prompt, %choice, "selected default");
        Ok(default)
    }

    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        let answer = self.assume_yes || default;
        tracing::info!(prompt, answer, "confirmed by policy");
        Ok(answer)
    }
}
