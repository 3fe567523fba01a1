use anyhow::Context;
use models::inventory::{CommandOutput, Provisioner, PutOptions, RunOptions, Transport};
use settings::SshConfig;
use ssh2::{FileStat, Session};
use std::{
    fmt,
    fs::File,
    io::{self, Read},
    net::{TcpStream, ToSocketAddrs},
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use crate::RemoteError;

/// A parsed `user@host:port` host string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshEndpoint {
    pub user: String,
    pub host: String,
    pub port: u16,
}

impl SshEndpoint {
    /// Parses `[user@]host[:port]`, taking missing parts from `defaults`.
    /// IPv6 hosts with a port must be bracketed, e.g. `root@[fe80::1]:22`.
    pub fn parse(value: &str, defaults: &SshConfig) -> Result<Self, RemoteError> {
        let invalid = |reason: &str| RemoteError::InvalidHostString {
            value: value.to_owned(),
            reason: reason.to_owned(),
        };

        let (user, rest) = match value.split_once('@') {
            Some((user, rest)) if !user.is_empty() => (user.to_owned(), rest),
            Some(_) => return Err(invalid("empty user")),
            None => (defaults.default_user.clone(), value),
        };

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("unclosed `[`"))?;
            match tail {
                "" => (host, None),
                tail => (
                    host,
                    Some(tail.strip_prefix(':').ok_or_else(|| invalid("junk after `]`"))?),
                ),
            }
        } else {
            match rest.split_once(':') {
                // a bare IPv6 address
                Some((_, tail)) if tail.contains(':') => (rest, None),
                Some((host, port)) => (host, Some(port)),
                None => (rest, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        let port = match port {
            Some(port) => port.parse().map_err(|_| invalid("bad port"))?,
            None => defaults.default_port,
        };

        Ok(Self {
            user,
            host: host.to_owned(),
            port,
        })
    }
}

impl fmt::Display for SshEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}@[{}]:{}", self.user, self.host, self.port)
        } else {
            write!(f, "{}@{}:{}", self.user, self.host, self.port)
        }
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Prefixes `cmd` with the environment and working directory from `options`.
pub fn compose_command(cmd: &str, options: &RunOptions) -> String {
    let mut parts: Vec<String> = options
        .env
        .iter()
        .map(|(key, value)| format!("export {key}={}", shell_quote(value)))
        .collect();

    if let Some(cwd) = &options.cwd {
        parts.push(format!("cd {}", shell_quote(cwd)));
    }

    parts.push(cmd.to_owned());
    parts.join(" && ")
}

/// Reads `stdout` and `stderr` in turns until both report end of file.
///
/// The streams must be non-blocking: a stream with nothing to offer returns
/// `WouldBlock` and the other one is read instead, so a peer stuck writing
/// to one stream never stalls the other. Gives up with `TimedOut` once
/// `deadline` passes without both streams closing.
pub(crate) fn drain_streams(
    stdout: &mut impl Read,
    stderr: &mut impl Read,
    deadline: Option<Instant>,
) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let (mut out_open, mut err_open) = (true, true);
    let mut buffer = [0u8; 8192];

    while out_open || err_open {
        let mut progressed = false;

        for (stream, sink, open) in [
            (&mut *stdout as &mut dyn Read, &mut out, &mut out_open),
            (&mut *stderr as &mut dyn Read, &mut err, &mut err_open),
        ] {
            if !*open {
                continue;
            }
            match stream.read(&mut buffer) {
                Ok(0) => *open = false,
                Ok(n) => {
                    sink.extend_from_slice(&buffer[..n]);
                    progressed = true;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        if !progressed && (out_open || err_open) {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "command output did not finish in time",
                ));
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    Ok((out, err))
}

/// Copies `source` into a new file at `destination`, removing the file again
/// if the copy fails partway.
pub(crate) fn copy_to_local(source: &mut impl Read, destination: &Path) -> anyhow::Result<()> {
    let mut file = File::create(destination)
        .with_context(|| format!("failed to create {}", destination.display()))?;

    if let Err(e) = io::copy(source, &mut file) {
        drop(file);
        if let Err(cleanup) = std::fs::remove_file(destination) {
            tracing::warn!("couldn't remove partial download {}: {cleanup}", destination.display());
        }
        return Err(e).with_context(|| format!("failed to write {}", destination.display()));
    }

    Ok(())
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

/// [`Transport`] over SSH. Each operation asks the resolver for the target's
/// current coordinates and opens a fresh session.
#[derive(Debug)]
pub struct SshTransport {
    resolver: Arc<dyn Provisioner>,
    config: SshConfig,
}

impl SshTransport {
    pub fn new(resolver: Arc<dyn Provisioner>, config: SshConfig) -> Self {
        Self { resolver, config }
    }

    fn connect(&self, target: &str, timeout: Option<Duration>) -> anyhow::Result<Session> {
        let endpoint = SshEndpoint::parse(&self.resolver.ssh_host_string(target)?, &self.config)?;
        let key = self.resolver.ssh_key(target)?;

        tracing::debug!("Connecting to {target} at {endpoint}");

        let addr = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .with_context(|| format!("failed to resolve {endpoint}"))?
            .next()
            .ok_or_else(|| RemoteError::Unresolvable(endpoint.to_string()))?;

        let tcp = TcpStream::connect_timeout(
            &addr,
            Duration::from_secs(self.config.connect_timeout_secs),
        )
        .with_context(|| format!("failed to connect to {endpoint}"))?;

        let mut session = Session::new()?;
        // bounds the handshake and authentication too
        session.set_timeout(millis(Duration::from_secs(self.config.connect_timeout_secs)));
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .with_context(|| format!("SSH handshake with {endpoint} failed"))?;
        session
            .userauth_pubkey_file(&endpoint.user, None, &key, None)
            .with_context(|| format!("key {} rejected by {endpoint}", key.display()))?;

        // zero disables the timeout
        session.set_timeout(timeout.map(millis).unwrap_or(0));

        Ok(session)
    }
}

impl Transport for SshTransport {
    fn run(&self, target: &str, cmd: &str, options: &RunOptions) -> anyhow::Result<CommandOutput> {
        let session = self.connect(target, options.timeout)?;
        let mut channel = session.channel_session()?;

        if options.pty {
            channel.request_pty("xterm", None, None)?;
        }

        channel.exec(&compose_command(cmd, options))?;

        let deadline = options.timeout.map(|timeout| Instant::now() + timeout);
        session.set_blocking(false);
        let drained = drain_streams(&mut channel.stream(0), &mut channel.stderr(), deadline);
        session.set_blocking(true);
        let (stdout, stderr) = drained.with_context(|| format!("reading output of `{cmd}` on {target}"))?;
        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        channel.wait_close()?;
        let exit_code = channel.exit_status()?;

        tracing::debug!("`{cmd}` on {target} exited with {exit_code}");

        if exit_code != 0 && !options.warn_only {
            return Err(RemoteError::NonZeroExit {
                target: target.to_owned(),
                cmd: cmd.to_owned(),
                exit_code,
                stderr: stderr.trim().to_owned(),
            }
            .into());
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
        })
    }

    fn get(&self, target: &str, remote: &str, local: &Path) -> anyhow::Result<PathBuf> {
        let session = self.connect(target, None)?;
        let sftp = session.sftp()?;

        let destination = if local.is_dir() {
            let name = Path::new(remote)
                .file_name()
                .with_context(|| format!("remote path {remote} names no file"))?;
            local.join(name)
        } else {
            local.to_path_buf()
        };

        let mut source = sftp
            .open(Path::new(remote))
            .with_context(|| format!("failed to open {remote} on {target}"))?;
        copy_to_local(&mut source, &destination)?;

        Ok(destination)
    }

    fn put(
        &self,
        target: &str,
        local: &Path,
        remote: &str,
        options: &PutOptions,
    ) -> anyhow::Result<String> {
        let session = self.connect(target, None)?;
        let sftp = session.sftp()?;

        let destination = match (remote.ends_with('/'), local.file_name()) {
            (true, Some(name)) => format!("{remote}{}", name.to_string_lossy()),
            _ => remote.to_owned(),
        };

        let mut source =
            File::open(local).with_context(|| format!("failed to open {}", local.display()))?;
        let mut file = sftp
            .create(Path::new(&destination))
            .with_context(|| format!("failed to create {destination} on {target}"))?;
        io::copy(&mut source, &mut file)?;

        if let Some(mode) = options.mode {
            sftp.setstat(
                Path::new(&destination),
                FileStat {
                    size: None,
                    uid: None,
                    gid: None,
                    perm: Some(mode),
                    atime: None,
                    mtime: None,
                },
            )?;
        }

        Ok(destination)
    }
}
