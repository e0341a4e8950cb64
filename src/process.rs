//! External command execution.
//!
//! Every tool the pipeline drives (distribution generator, `buildinstall`,
//! `rpm`, `cp`, `mount`, `umount`) is described by a [`Cmd`] and executed
//! through a [`Runner`]. [`HostRunner`] spawns real processes; tests swap in
//! a runner that records invocations instead.
//!
//! ```rust,ignore
//! use initrd_prep::process::Cmd;
//!
//! Cmd::new("cp")
//!     .arg("-f")
//!     .arg_path(&src)
//!     .arg_path(&dest)
//!     .error_msg("copying initrd failed")
//!     .run()?;
//! ```

use anyhow::{Context, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::BuildError;

/// Captured outcome of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes a described command and captures its outcome.
///
/// Implementations only report what happened; exit status policy lives in
/// [`Cmd::run_with`].
pub trait Runner {
    fn execute(&self, cmd: &Cmd) -> Result<CommandResult>;
}

/// Runs commands on the build host, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostRunner;

impl Runner for HostRunner {
    fn execute(&self, cmd: &Cmd) -> Result<CommandResult> {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .with_context(|| format!("spawning '{}'", cmd))?;

        Ok(CommandResult {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Builder for an external command.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    error_msg: Option<String>,
    allow_fail: bool,
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            current_dir: None,
            error_msg: None,
            allow_fail: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Working directory of the child process only; the caller's directory
    /// is never changed.
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Context attached to the error when the command fails.
    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error_msg = Some(msg.into());
        self
    }

    /// Return the result instead of an error on nonzero exit.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Program name as given, lossily converted.
    pub fn program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Final path component of the program, used to name the tool in errors.
    pub fn tool_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program())
    }

    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Run on the build host.
    pub fn run(&self) -> Result<CommandResult> {
        self.run_with(&HostRunner)
    }

    /// Run through `runner`; nonzero exit becomes
    /// [`BuildError::ExternalToolFailure`] unless [`Cmd::allow_fail`] was set.
    pub fn run_with(&self, runner: &dyn Runner) -> Result<CommandResult> {
        let result = runner.execute(self)?;
        if result.success() || self.allow_fail {
            return Ok(result);
        }

        let failure = BuildError::ExternalToolFailure {
            tool: self.tool_name(),
            status: result.code,
            stderr: result.stderr.trim().to_string(),
        };
        let msg = self
            .error_msg
            .clone()
            .unwrap_or_else(|| format!("running '{}'", self));
        Err(anyhow::Error::new(failure).context(msg))
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
