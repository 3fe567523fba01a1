use clap::{ArgGroup, Parser, Subcommand};
use colored::Colorize;
use models::inventory::{Host, HostType, Infra, InfraError, Provisioner, PutOptions, RemoteHost, RunOptions};
use remote::{SshTransport, StaticProvisioner, VagrantProvisioner};
use settings::{ConfigError, InfraSettings};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use topology::{load_topology, load_topology_dir, Collaborators, NtcTopology, TopologyError, TopologyFactory};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "ant-infra", author, version, about = "Inspect and drive the test bed")]
struct Cli {
    /// Settings file (YAML)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Topology file or directory. Defaults to the built-in NTC topology
    #[clap(short, long, global = true)]
    topology: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every host with its role and addresses
    Hosts,

    /// List every network
    Networks,

    /// Print the provisioned SSH coordinates of a cmc
    SshConfig { host: String },

    /// Run a shell command on one host
    #[command(group(ArgGroup::new("target").required(true).args(["host", "role"])))]
    Run {
        /// Host to run on
        #[clap(long)]
        host: Option<String>,
        /// Run on the first host with this role
        #[clap(long)]
        role: Option<HostType>,
        /// Report a non-zero exit status instead of failing
        #[clap(long, default_value = "false")]
        warn_only: bool,
        #[clap(last = true, required = true)]
        cmd: Vec<String>,
    },

    /// Fetch a file from a host
    Get {
        #[clap(long)]
        host: String,
        remote: String,
        local: PathBuf,
    },

    /// Push a file to a host
    Put {
        #[clap(long)]
        host: String,
        local: PathBuf,
        remote: String,
        /// Octal permissions for the uploaded file, e.g. 644
        #[clap(long, value_parser = parse_mode)]
        mode: Option<u32>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("loading settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("opening log file `{path}`: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("setting up tracing: {0}")]
    Tracing(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

fn parse_mode(value: &str) -> Result<u32, String> {
    let digits = value.strip_prefix("0o").unwrap_or(value);
    // from_str_radix would accept a leading sign
    if digits.is_empty() || !digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return Err(format!("`{value}` is not an octal mode"));
    }

    match u32::from_str_radix(digits, 8) {
        Ok(mode) if mode <= 0o7777 => Ok(mode),
        _ => Err(format!("`{value}` is out of range for a file mode")),
    }
}

fn init_tracing(settings: &InfraSettings) -> Result<(), CliError> {
    let subscriber = tracing_subscriber::fmt::fmt()
        .pretty()
        .with_max_level(LevelFilter::from(settings.logging.max_level));

    if let Some(output_file) = settings.logging.log_file.clone() {
        let file = std::fs::File::create(&output_file).map_err(|source| CliError::LogFile {
            path: output_file,
            source,
        })?;
        let file = std::sync::Mutex::new(file);

        tracing::subscriber::set_global_default(subscriber.with_writer(file).finish())?;
    } else {
        tracing::subscriber::set_global_default(subscriber.finish())?;
    }

    tracing::debug!("tracing has been started");
    Ok(())
}

fn collaborators(settings: &InfraSettings) -> Collaborators {
    let vagrant: Arc<dyn Provisioner> =
        Arc::new(VagrantProvisioner::from_settings(settings.vagrant.clone()));

    let provisioner: Arc<dyn Provisioner> = if settings.static_hosts.is_empty() {
        vagrant
    } else {
        Arc::new(StaticProvisioner::new(settings.static_hosts.clone()).with_fallback(vagrant))
    };

    let transport = Arc::new(SshTransport::new(provisioner.clone(), settings.ssh.clone()));

    Collaborators::new(transport, provisioner)
}

fn load_infra(path: Option<&Path>, collaborators: &Collaborators) -> Result<Infra, TopologyError> {
    match path {
        Some(dir) if dir.is_dir() => load_topology_dir(dir)?.build(collaborators),
        Some(file) => load_topology(file)?.build(collaborators),
        None => NtcTopology.build(collaborators),
    }
}

fn run_command(infra: &Infra, command: Command) -> Result<(), CliError> {
    match command {
        Command::Hosts => {
            for host in infra.hosts() {
                println!("{host}");
            }
        }
        Command::Networks => {
            for network in infra.networks() {
                println!("{} {}", network.name().bold(), network.cidr());
            }
        }
        Command::SshConfig { host } => {
            let controller = infra
                .get_host(&host)?
                .as_controller()
                .ok_or_else(|| InfraError::NotController(host.clone()))?;

            println!("{} {}", "Host:".bold(), controller.ssh_host_string()?);
            println!("{} {}", "Key: ".bold(), controller.ssh_key()?.display());
        }
        Command::Run {
            host,
            role,
            warn_only,
            cmd,
        } => {
            let target: &Host = match (host, role) {
                (Some(host), _) => infra.get_host(&host)?,
                (None, Some(HostType::Cmc)) => infra.get_cmc(None)?,
                (None, Some(HostType::Slave)) | (None, None) => infra.get_slave(None)?,
            };

            let options = RunOptions {
                warn_only,
                ..Default::default()
            };
            let output = target.run(&cmd.join(" "), &options)?;

            print!("{}", output.stdout);
            eprint!("{}", output.stderr);
            if !output.is_success() {
                eprintln!(
                    "{}",
                    format!("{} exited with status {}", target.hostname(), output.exit_code)
                        .yellow()
                );
            }
        }
        Command::Get {
            host,
            remote,
            local,
        } => {
            let written = infra.get_host(&host)?.get(&remote, &local)?;
            println!("{}", written.display());
        }
        Command::Put {
            host,
            local,
            remote,
            mode,
        } => {
            let written = infra
                .get_host(&host)?
                .put(&local, &remote, &PutOptions { mode })?;
            println!("{written}");
        }
    }

    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = settings::init(cli.config.as_deref())?;
    init_tracing(settings)?;

    let collaborators = collaborators(settings);
    let topology = cli.topology.as_deref().or(settings.topology.as_deref());
    let infra = load_infra(topology, &collaborators)?;

    run_command(&infra, cli.command)
}

fn match_and_print(result: Result<(), CliError>) {
    match result {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!(
                "{}{}",
                "Error encountered: ".red().bold(),
                e.to_string().red()
            );
            std::process::exit(1);
        }
    }
}

fn main() {
    match_and_print(run(Cli::parse()));
}
