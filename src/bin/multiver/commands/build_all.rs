//! `multiver build-all` command

use std::time::Duration;

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};

use super::Global;
use crate::cli::{BuildAllArgs, MessageFormat};
use multiver::builder::{BuildAllReport, BuildEvent, FailurePolicy, JobError};
use multiver::ops::multiver_build_all::{build_all, BuildAllOptions};
use multiver::util::diagnostic::{emit, suggestions, Diagnostic};
use multiver::util::process::CancellationToken;

pub fn execute(args: BuildAllArgs, global: &Global) -> Result<()> {
    let (ctx, ws, config) = global.workspace()?;

    let json = match args.message_format {
        Some(format) => format == MessageFormat::Json,
        None => config.json_messages(),
    };
    let policy = if args.continue_on_error {
        FailurePolicy::ContinueOnError
    } else if args.fail_fast {
        FailurePolicy::FailFast
    } else {
        config.failure_policy()
    };

    let opts = BuildAllOptions {
        policy,
        optional_dep: args
            .optional
            .optional_dep
            .clone()
            .or(config.optional_dependency.path.clone()),
        runtime_link: args
            .optional
            .runtime_link()
            .unwrap_or_else(|| config.runtime_link()),
        verbose: ctx.is_verbose(),
        cancellation: CancellationToken::from_interrupts(),
    };

    // Create progress bar
    let total = ws.manifest().registry.len() as u64;
    let pb = if !json && !ctx.is_verbose() && total > 1 {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let report = build_all(&ws, &opts, |event| {
        if json {
            println!("{}", event.to_json());
            return;
        }
        match event {
            BuildEvent::JobStarted { target, .. } => {
                if let Some(pb) = &pb {
                    pb.set_message(format!("building {}", target));
                } else {
                    eprintln!("    Building `{}`", target);
                }
            }
            BuildEvent::JobFinished {
                target,
                success,
                duration_ms,
                ..
            } => {
                if let Some(pb) = &pb {
                    pb.inc(1);
                } else if *success {
                    eprintln!(
                        "    Finished `{}` in {:.2}s",
                        target,
                        *duration_ms as f64 / 1000.0
                    );
                }
            }
            _ => {}
        }
    })?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if !json {
        print_summary(&report, &ws.output_root(), ctx.color());
    }

    if !report.success() {
        let failed: Vec<String> = report
            .failed_targets()
            .iter()
            .map(|t| t.to_string())
            .collect();
        bail!("build-all failed for target(s): {}", failed.join(", "));
    }

    Ok(())
}

fn print_summary(report: &BuildAllReport, output_root: &std::path::Path, color: bool) {
    for job in &report.jobs {
        if let Some(err) = job.error() {
            emit(&job_diagnostic(err, &job.output_dir), color);
        }
    }

    let skipped = report.skipped_targets();
    if !skipped.is_empty() {
        let names: Vec<String> = skipped.iter().map(|t| t.to_string()).collect();
        emit(
            &Diagnostic::note(format!("not started: {}", names.join(", ")))
                .with_suggestion("Pass --continue-on-error to build the remaining targets"),
            color,
        );
    }

    eprintln!(
        "    Finished {} of {} target(s) in {:.2}s -> {}",
        report.succeeded_targets().len(),
        report.jobs.len(),
        report.duration.as_secs_f64(),
        output_root.display()
    );
}

fn job_diagnostic(err: &JobError, output_dir: &std::path::Path) -> Diagnostic {
    let diag = Diagnostic::error(err.to_string()).with_location(output_dir);
    match err {
        JobError::SubprocessFailure { stderr_tail, .. } => stderr_tail
            .lines()
            .fold(diag, |d, line| d.with_context(line))
            .with_suggestion(suggestions::BUILD_FAILED),
        JobError::ArtifactNotFound { searched, .. } => diag
            .with_context(format!("searched {}", searched.display()))
            .with_suggestion(suggestions::ARTIFACT_NOT_FOUND),
        JobError::Cancelled { .. } | JobError::Io { .. } => diag,
    }
}
