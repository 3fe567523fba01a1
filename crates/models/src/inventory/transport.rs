use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

/// Remote execution backend. Every operation is addressed by the hostname of
/// the target; translating that name into a reachable endpoint is up to the
/// implementation.
///
/// Errors are whatever the backend produces and are handed back to callers
/// untouched.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Run a shell command on `target`.
    fn run(&self, target: &str, cmd: &str, options: &RunOptions) -> anyhow::Result<CommandOutput>;

    /// Copy `remote` from `target` to `local`, returning the local path written.
    fn get(&self, target: &str, remote: &str, local: &Path) -> anyhow::Result<PathBuf>;

    /// Copy `local` to `remote` on `target`, returning the remote path written.
    fn put(
        &self,
        target: &str,
        local: &Path,
        remote: &str,
        options: &PutOptions,
    ) -> anyhow::Result<String>;
}

/// Knobs for a single command. Forwarded to the transport as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Treat a non-zero exit status as a normal result instead of an error.
    pub warn_only: bool,
    /// Request a pseudo terminal for the command.
    pub pty: bool,
    /// Directory to run the command from.
    pub cwd: Option<String>,
    /// Extra environment for the command.
    pub env: BTreeMap<String, String>,
    /// Upper bound enforced by the transport, if any.
    pub timeout: Option<Duration>,
}

impl RunOptions {
    pub fn warn_only(mut self) -> Self {
        self.warn_only = true;
        self
    }

    pub fn with_pty(mut self) -> Self {
        self.pty = true;
        self
    }

    pub fn in_dir(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Permission bits for the uploaded file, e.g. `0o644`.
    pub mode: Option<u32>,
}

/// Result of a remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}
