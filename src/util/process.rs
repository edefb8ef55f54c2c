//! Subprocess execution utilities.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

/// How often a running child is polled for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long output is still collected from a killed process tree.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Shared flag used to request cancellation of in-flight work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    on_interrupt: bool,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    /// A token that is also cancelled by SIGINT or SIGTERM.
    ///
    /// Cancellable children run in their own process group and never see
    /// a terminal Ctrl-C, so the signal has to reach them through a token.
    pub fn from_interrupts() -> Self {
        CancellationToken {
            cancelled: Arc::default(),
            on_interrupt: interrupt::install(),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || (self.on_interrupt && interrupt::received())
    }
}

#[cfg(unix)]
mod interrupt {
    use std::sync::atomic::{AtomicBool, Ordering};

    static RECEIVED: AtomicBool = AtomicBool::new(false);

    extern "C" fn on_signal(_: libc::c_int) {
        RECEIVED.store(true, Ordering::SeqCst);
    }

    /// Install the handler; false if the OS refused it.
    pub fn install() -> bool {
        let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        [libc::SIGINT, libc::SIGTERM]
            .into_iter()
            .all(|sig| unsafe { libc::signal(sig, handler) } != libc::SIG_ERR)
    }

    pub fn received() -> bool {
        RECEIVED.load(Ordering::SeqCst)
    }
}

#[cfg(not(unix))]
mod interrupt {
    pub fn install() -> bool {
        false
    }

    pub fn received() -> bool {
        false
    }
}

/// Result of a cancellable execution.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The process ran to completion (successfully or not).
    Exited(Output),
    /// The process was killed after cancellation was requested.
    Cancelled { stdout: Vec<u8>, stderr: Vec<u8> },
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
    env_remove: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
            env_remove: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Remove an environment variable.
    pub fn env_remove(mut self, key: impl AsRef<str>) -> Self {
        self.env_remove.push(key.as_ref().to_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the explicitly set environment.
    pub fn get_env(&self) -> &HashMap<String, String> {
        &self.env
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        for key in &self.env_remove {
            cmd.env_remove(key);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command and wait for completion, capturing output.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))
    }

    /// Execute with inherited stdio and return status only.
    pub fn status(&self) -> Result<ExitStatus> {
        let mut cmd = self.build_command();
        cmd.status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))
    }

    /// Execute, capturing output, and kill the child if `token` is cancelled.
    pub fn exec_cancellable(&self, token: &CancellationToken) -> Result<ProcessOutcome> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        // Own process group, so cancellation reaches every descendant.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        // Drain pipes on their own threads so a chatty child never blocks.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if token.is_cancelled() {
                tracing::debug!("Killing `{}` after cancellation", self.display_command());
                kill_tree(&mut child);
                // A descendant outside the group may still hold the pipes.
                return Ok(ProcessOutcome::Cancelled {
                    stdout: collect_within(stdout, DRAIN_GRACE),
                    stderr: collect_within(stderr, DRAIN_GRACE),
                });
            }

            match child
                .try_wait()
                .with_context(|| format!("failed to wait for `{}`", self.program.display()))?
            {
                Some(status) => break status,
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        Ok(ProcessOutcome::Exited(Output {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        }))
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    })
}

fn collect(rx: Option<Receiver<Vec<u8>>>) -> Vec<u8> {
    rx.and_then(|rx| rx.recv().ok()).unwrap_or_default()
}

fn collect_within(rx: Option<Receiver<Vec<u8>>>, timeout: Duration) -> Vec<u8> {
    rx.and_then(|rx| rx.recv_timeout(timeout).ok())
        .unwrap_or_default()
}

/// Kill `child` and everything in its process group.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        // The child leads its own group; a negative pid signals all of it.
        let pgid = child.id() as libc::pid_t;
        if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
            tracing::warn!(
                "failed to kill process group {}: {}",
                pgid,
                std::io::Error::last_os_error()
            );
        }
    }

    if let Err(e) = child.kill() {
        // Expected when the group kill already ended it.
        tracing::debug!("failed to kill child process: {}", e);
    }
    let _ = child.wait();
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Resolve a configured program name.
///
/// Names containing a path separator are used as given; bare names are
/// looked up in PATH and fall back to the bare name.
pub fn resolve_program(name: &str) -> PathBuf {
    if name.contains('/') || name.contains('\\') {
        PathBuf::from(name)
    } else {
        find_executable(name).unwrap_or_else(|| PathBuf::from(name))
    }
}
