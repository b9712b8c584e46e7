//! Scripted [`Decider`]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use rayext_core::{Decider, Error, Result};

/// A canned answer, consumed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Select(usize),
    Confirm(bool),
    Cancel,
}

/// A prompt the code under test asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Select {
        message: String,
        options: Vec<String>,
        default: usize,
    },
    Confirm {
        message: String,
        default: bool,
    },
}

/// Replays answers and records every prompt. When the script runs out, the
/// default is taken.
#[derive(Debug, Default)]
pub struct ScriptedDecider {
    answers: Mutex<VecDeque<Answer>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedDecider {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn select_prompts(&self) -> usize {
        self.prompts()
            .iter()
            .filter(|p| matches!(p, Prompt::Select { .. }))
            .count()
    }

    pub fn confirm_prompts(&self) -> usize {
        self.prompts()
            .iter()
            .filter(|p| matches!(p, Prompt::Confirm { .. }))
            .count()
    }

    fn next(&self) -> Option<Answer> {
        self.answers.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl Decider for ScriptedDecider {
    async fn select(&self, prompt: &str, options: &[String], default: usize) -> Result<usize> {
        self.prompts.lock().unwrap().push(Prompt::Select {
            message: prompt.to_string(),
            options: options.to_vec(),
            default,
        });
        match self.next() {
            None => Ok(default),
            Some(Answer::Select(index)) => Ok(index),
            Some(Answer::Cancel) => Err(Error::Cancelled),
            Some(other) => panic!("select prompt {prompt:?} got scripted answer {other:?}"),
        }
    }

    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        self.prompts.lock().unwrap().push(Prompt::Confirm {
            message: prompt.to_string(),
            default,
        });
        match self.next() {
            None => Ok(default),
            Some(Answer::Confirm(answer)) => Ok(answer),
            Some(Answer::Cancel) => Err(Error::Cancelled),
            Some(other) => panic!("confirm prompt {prompt:?} got scripted answer {other:?}"),
        }
    }
}
