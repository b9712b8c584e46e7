//! Interactive prompts for CLI commands
//!
//! Uses dialoguer for terminal-based selection. Prompts from concurrent
//! batch targets are asked one at a time.

use async_trait::async_trait;
use dialoguer::{Confirm, Select};
use rayext_core::{Decider, Error, Result};
use tokio::sync::Mutex;

/// [`Decider`] backed by the terminal.
pub struct DialoguerDecider {
    assume_yes: bool,
    terminal: Mutex<()>,
}

impl DialoguerDecider {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            terminal: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Decider for DialoguerDecider {
    async fn select(&self, prompt: &str, options: &[String], default: usize) -> Result<usize> {
        let _terminal = self.terminal.lock().await;
        let prompt = prompt.to_string();
        let options = options.to_vec();
        let choice = tokio::task::spawn_blocking(move || {
            Select::new()
                .with_prompt(prompt)
                .items(&options)
                .default(default)
                .interact_opt()
        })
        .await?;
        // Esc, Ctrl-C and a closed terminal all cancel
        match choice {
            Ok(Some(index)) => Ok(index),
            Ok(None) | Err(_) => Err(Error::Cancelled),
        }
    }

    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        let _terminal = self.terminal.lock().await;
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(prompt)
                .default(default)
                .interact_opt()
        })
        .await?;
        match answer {
            Ok(Some(answer)) => Ok(answer),
            Ok(None) | Err(_) => Err(Error::Cancelled),
        }
    }
}
