//! `multiver build` command

use anyhow::Result;

use super::Global;
use crate::cli::BuildArgs;
use multiver::builder::TargetOptions;
use multiver::ops::multiver_build::{build, BuildOptions};

pub fn execute(args: BuildArgs, global: &Global) -> Result<()> {
    let (_ctx, ws, config) = global.workspace()?;

    // Flags override project and global configuration
    let opts = BuildOptions {
        target: TargetOptions {
            mapping_id: args.mapping_id,
            companion_version: args.companion_version,
            optional_dep: args
                .optional
                .optional_dep
                .clone()
                .or(config.optional_dependency.path.clone()),
            runtime_link: args
                .optional
                .runtime_link()
                .unwrap_or_else(|| config.runtime_link()),
        },
        plan_only: args.plan,
    };

    let plan = build(&ws, &args.target, &opts)?;

    if args.plan {
        println!("{}", plan.to_json()?);
    } else {
        eprintln!("    Finished `{}` ({})", plan.target, plan.version);
    }

    Ok(())
}
