//! Settings and collaborators for one invocation

use std::path::Path;
use std::sync::Arc;

use rayext_core::{Decider, ExtensionManager, NodePackageRunner, PolicyDecider, Settings};
use rayext_github::GithubClient;

use crate::cli::GlobalArgs;
use crate::error::Result;
use crate::interactive::DialoguerDecider;

/// Defaults, then the config file, then command-line flags.
pub fn load_settings(cwd: &Path, args: &GlobalArgs, terminal: bool) -> Result<Settings> {
    let mut settings = Settings::load(cwd, args.config.as_deref())?;
    if let Some(root) = &args.root {
        settings.root = cwd.join(root);
    }
    if let Some(retries) = args.retries {
        settings.retries = retries;
    }
    if args.token.is_some() {
        settings.token = args.token.clone();
    }
    if args.yes {
        settings.assume_yes = true;
    }
    if !args.packages.is_empty() {
        settings.packages = args.packages.clone();
    }
    if args.skip_build {
        settings.run_build = false;
    }
    settings.interactive = settings.interactive && terminal && !args.non_interactive;
    Ok(settings)
}

pub fn build_manager(settings: Settings, api_base: Option<&str>) -> Result<ExtensionManager> {
    let mut client = GithubClient::new(settings.token.clone(), settings.retries)?;
    if let Some(api_base) = api_base {
        client = client.with_api_base(api_base);
    }

    let decider: Arc<dyn Decider> = if settings.interactive {
        Arc::new(DialoguerDecider::new(settings.assume_yes))
    } else {
        Arc::new(PolicyDecider::new(settings.assume_yes))
    };
    let runner = Arc::new(NodePackageRunner::new(decider.clone()));
    tracing::debug!(
        root = %settings.root.display(),
        interactive = settings.interactive,
        "settings resolved"
    );
    Ok(ExtensionManager::new(settings, Arc::new(client), decider, runner))
}
