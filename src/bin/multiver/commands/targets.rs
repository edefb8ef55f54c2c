//! `multiver targets` command

use anyhow::Result;

use super::Global;
use crate::cli::TargetsArgs;
use multiver::ops::targets::{format_targets, list_targets};

pub fn execute(args: TargetsArgs, global: &Global) -> Result<()> {
    let (_ctx, ws, _config) = global.workspace()?;
    let targets = list_targets(&ws);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }

    print!("{}", format_targets(&targets));
    match ws.manifest().registry.supported_range() {
        Some(range) => println!("\nsupported: {} ({} targets)", range, targets.len()),
        None => println!("\nno targets declared"),
    }

    Ok(())
}
