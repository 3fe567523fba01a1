use anyhow::Context;
use models::inventory::Provisioner;
use settings::VagrantConfig;
use std::path::PathBuf;

use crate::{CommandRunner, RemoteError, SystemCommandRunner};

/// The parts of `vagrant ssh-config <machine>` needed to reach a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshConfigEntry {
    pub host_name: String,
    pub user: String,
    pub port: u16,
    pub identity_file: PathBuf,
}

impl SshConfigEntry {
    /// Parses the OpenSSH style block printed by `vagrant ssh-config`.
    /// Keys are matched case-insensitively and the first occurrence wins.
    pub fn parse(machine: &str, output: &str) -> Result<Self, RemoteError> {
        let field = |name: &'static str| {
            output
                .lines()
                .filter_map(|line| line.trim().split_once(char::is_whitespace))
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.trim().trim_matches('"').to_owned())
                .ok_or_else(|| RemoteError::MissingSshConfigField {
                    machine: machine.to_owned(),
                    field: name,
                })
        };

        let port = field("Port")?;
        let port = port
            .parse()
            .map_err(|_| RemoteError::InvalidSshConfigPort {
                machine: machine.to_owned(),
                value: port.clone(),
            })?;

        Ok(Self {
            host_name: field("HostName")?,
            user: field("User")?,
            port,
            identity_file: PathBuf::from(field("IdentityFile")?),
        })
    }

    pub fn host_string(&self) -> String {
        format!("{}@{}:{}", self.user, self.host_name, self.port)
    }
}

/// Asks Vagrant where a machine is every time it is asked, since forwarded
/// ports change when machines are recreated.
#[derive(Debug)]
pub struct VagrantProvisioner<R: CommandRunner = SystemCommandRunner> {
    runner: R,
    config: VagrantConfig,
}

impl VagrantProvisioner<SystemCommandRunner> {
    pub fn from_settings(config: VagrantConfig) -> Self {
        Self::new(SystemCommandRunner, config)
    }
}

impl<R: CommandRunner> VagrantProvisioner<R> {
    pub fn new(runner: R, config: VagrantConfig) -> Self {
        Self { runner, config }
    }

    pub fn ssh_config(&self, machine: &str) -> anyhow::Result<SshConfigEntry> {
        let binary = &self.config.binary;
        let output = self
            .runner
            .run(binary, &["ssh-config", machine], self.config.working_dir.as_deref())
            .with_context(|| format!("failed to query {binary} for machine {machine}"))?;

        if !output.is_success() {
            return Err(RemoteError::CommandFailed {
                command: format!("{binary} ssh-config {machine}"),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_owned(),
            }
            .into());
        }

        Ok(SshConfigEntry::parse(machine, &output.stdout)?)
    }
}

impl<R: CommandRunner> Provisioner for VagrantProvisioner<R> {
    fn ssh_host_string(&self, machine: &str) -> anyhow::Result<String> {
        Ok(self.ssh_config(machine)?.host_string())
    }

    fn ssh_key(&self, machine: &str) -> anyhow::Result<PathBuf> {
        Ok(self.ssh_config(machine)?.identity_file)
    }
}
