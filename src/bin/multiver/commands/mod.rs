//! Command implementations

pub mod build;
pub mod build_all;
pub mod clean;
pub mod completions;
pub mod targets;

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use multiver::core::Workspace;
use multiver::util::config::Config;
use multiver::util::diagnostic::suggestions;
use multiver::util::GlobalContext;

/// Flags shared by every command.
pub struct Global {
    pub verbose: bool,
    pub color: bool,
    pub manifest_path: Option<PathBuf>,
}

impl Global {
    pub fn context(&self) -> Result<GlobalContext> {
        let mut ctx = GlobalContext::new()?;
        ctx.set_verbose(self.verbose);
        ctx.set_color(self.color);
        Ok(ctx)
    }

    /// Load the workspace and its merged configuration.
    pub fn workspace(&self) -> Result<(GlobalContext, Workspace, Config)> {
        let ctx = self.context()?;
        let manifest_path = match &self.manifest_path {
            Some(path) => ctx.cwd().join(path),
            None => ctx
                .find_manifest()
                .map_err(|e| anyhow!("{}\nhelp: {}", e, suggestions::NO_MANIFEST))?,
        };
        let ws = Workspace::new(&manifest_path)?;
        let config = ctx.load_config(ws.root());
        Ok((ctx, ws, config))
    }
}
