//! Recording [`PackageRunner`]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use rayext_core::{Error, PackageRunner, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerCall {
    Install(PathBuf),
    Build(PathBuf),
}

/// Records calls instead of spawning a package manager.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<RunnerCall>>,
    fail_builds: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every build fails.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_builds: true,
        }
    }

    pub fn calls(&self) -> Vec<RunnerCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageRunner for RecordingRunner {
    async fn install(&self, dir: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(RunnerCall::Install(dir.to_path_buf()));
        Ok(())
    }

    async fn build(&self, dir: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(RunnerCall::Build(dir.to_path_buf()));
        if self.fail_builds {
            return Err(Error::Runner {
                command: "ray develop".into(),
                message: "exited with code 1".into(),
            });
        }
        Ok(())
    }
}
