//! Package install and develop build for unpacked extensions

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use rayext_manifest::{PACKAGE_FILENAME, PackageMetadata};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::decision::{Decider, require};
use crate::error::{Error, Result};

/// Printed by the develop command once the extension is built.
pub const BUILD_SUCCESS_MESSAGE: &str = "built extension successfully";

/// Runs the extension's package manager.
#[async_trait]
pub trait PackageRunner: Send + Sync {
    /// Install dependencies in `dir`.
    async fn install(&self, dir: &Path) -> Result<()>;

    /// Build and register the extension in `dir`.
    async fn build(&self, dir: &Path) -> Result<()>;
}

/// Supported JavaScript package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "npm" => Some(Self::Npm),
            "pnpm" => Some(Self::Pnpm),
            "yarn" => Some(Self::Yarn),
            "bun" => Some(Self::Bun),
            _ => None,
        }
    }

    pub fn binary(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }

    /// Program and arguments that run `ray develop` through this manager.
    pub fn develop_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Npm => ("npx", &["ray", "develop"]),
            Self::Pnpm => ("pnpm", &["exec", "ray", "develop"]),
            Self::Yarn => ("yarn", &["ray", "develop"]),
            Self::Bun => ("bunx", &["ray", "develop"]),
        }
    }

    /// Detect from `dir`'s `packageManager` field or lock files.
    fn detect_in(dir: &Path) -> Option<Self> {
        if let Ok(package) = PackageMetadata::from_path(&dir.join(PACKAGE_FILENAME)) {
            if let Some(pm) = package.package_manager_name().and_then(Self::from_name) {
                return Some(pm);
            }
        }
        const LOCKFILES: &[(&str, PackageManager)] = &[
            ("pnpm-lock.yaml", PackageManager::Pnpm),
            ("yarn.lock", PackageManager::Yarn),
            ("bun.lockb", PackageManager::Bun),
            ("bun.lock", PackageManager::Bun),
            ("package-lock.json", PackageManager::Npm),
        ];
        LOCKFILES
            .iter()
            .find(|(file, _)| dir.join(file).is_file())
            .map(|(_, pm)| *pm)
    }

    /// Detect for `dir`, walking up through enclosing packages so a
    /// workspace member uses the workspace root's manager.
    pub fn detect(dir: &Path) -> Option<Self> {
        for candidate in dir.ancestors() {
            if let Some(pm) = Self::detect_in(candidate) {
                return Some(pm);
            }
            if !candidate.join(PACKAGE_FILENAME).is_file() {
                break;
            }
        }
        None
    }
}

/// [`PackageRunner`] for npm, pnpm, yarn and bun projects.
pub struct NodePackageRunner {
    decider: Arc<dyn Decider>,
}

impl NodePackageRunner {
    pub fn new(decider: Arc<dyn Decider>) -> Self {
        Self { decider }
    }

    /// Make sure `tool` is on `PATH`, offering a global npm install.
    async fn ensure_tool(&self, tool: &str, dir: &Path) -> Result<()> {
        if which::which(tool).is_ok() {
            return Ok(());
        }
        require(
            self.decider.as_ref(),
            &format!("{tool} not found, install it with npm?"),
            true,
        )
        .await?;
        run_status(Command::new("npm").args(["install", "--global", tool]), dir).await
    }
}

async fn run_status(command: &mut Command, dir: &Path) -> Result<()> {
    let description = format!("{command:?}");
    tracing::debug!(command = %description, dir = %dir.display(), "running");
    let status = command
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| Error::Runner {
            command: description.clone(),
            message: e.to_string(),
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::Runner {
            command: description,
            message: match status.code() {
                Some(code) => format!("exited with code {code}"),
                None => "terminated by signal".to_string(),
            },
        })
    }
}

#[async_trait]
impl PackageRunner for NodePackageRunner {
    async fn install(&self, dir: &Path) -> Result<()> {
        let Some(pm) = PackageManager::detect(dir) else {
            tracing::warn!(dir = %dir.display(), "unknown package manager, skipping install");
            return Ok(());
        };
        self.ensure_tool(pm.binary(), dir).await?;
        run_status(Command::new(pm.binary()).arg("install"), dir).await
    }

    async fn build(&self, dir: &Path) -> Result<()> {
        let Some(pm) = PackageManager::detect(dir) else {
            tracing::warn!(dir = %dir.display(), "unknown package manager, skipping build");
            return Ok(());
        };
        let (program, args) = pm.develop_command();
        let description = format!("{program} {}", args.join(" "));
        let runner_error = |message: String| Error::Runner {
            command: description.clone(),
            message,
        };

        tracing::debug!(command = %description, dir = %dir.display(), "running");
        let mut child = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| runner_error(e.to_string()))?;

        let Some(stdout) = child.stdout.take() else {
            return Err(runner_error("stdout not captured".into()));
        };
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| runner_error(e.to_string()))?
        {
            tracing::info!(target: "rayext::build", "{line}");
            if line.contains(BUILD_SUCCESS_MESSAGE) {
                // the develop server keeps watching; stop it once built
                let _ = child.kill().await;
                return Ok(());
            }
        }

        let status = child.wait().await.map_err(|e| runner_error(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(runner_error(format!("exited with {status}")))
        }
    }
}
