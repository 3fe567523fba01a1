use anyhow::Context;
use models::inventory::CommandOutput;
use std::{fmt, path::Path, process::Command};

/// Runs local programs. Tests swap in a runner with canned output instead
/// of spawning processes.
pub trait CommandRunner: Send + Sync + fmt::Debug {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> anyhow::Result<CommandOutput>;
}

/// Production runner backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> anyhow::Result<CommandOutput> {
        let mut command = Command::new(program);
        command.args(args);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        tracing::debug!("Spawning {program} {}", args.join(" "));
        let output = command
            .output()
            .with_context(|| format!("failed to spawn {program}"))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // killed by a signal
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}
