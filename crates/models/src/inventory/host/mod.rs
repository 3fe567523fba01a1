use enum_dispatch::enum_dispatch;
use itertools::Itertools;
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

mod controller;
mod port;
mod worker;

pub use controller::ControllerHost;
pub use port::Port;
pub use worker::WorkerHost;

use crate::inventory::{
    CommandOutput, HostType, InfraError, Network, Provisioner, PutOptions, RunOptions, Task,
    TaskContext, Transport,
};

/// Remote-execution contract shared by every kind of host.
///
/// All operations are routed to the transport with the hostname as the only
/// addressing key. Failures from the transport come back unchanged.
#[enum_dispatch]
pub trait RemoteHost {
    fn base(&self) -> &HostBase;

    fn host_type(&self) -> HostType;

    fn hostname(&self) -> &str {
        self.base().hostname()
    }

    /// Copy of the host's ports, keyed by network name.
    fn ports(&self) -> BTreeMap<String, Port> {
        self.base().ports.clone()
    }

    /// Copy of the networks this host is attached to, keyed by name.
    fn networks(&self) -> BTreeMap<String, Network> {
        self.base()
            .ports
            .iter()
            .map(|(name, port)| (name.clone(), Network::clone(port.network())))
            .collect()
    }

    fn port(&self, network: &str) -> Option<&Port> {
        self.base().ports.get(network)
    }

    /// Run `task` with every remote operation it makes addressed to this host.
    fn execute<T: Task>(&self, task: &mut T) -> anyhow::Result<T::Output> {
        let base = self.base();
        tracing::info!("Executing task {} on {}", task.identifier(), base.hostname);

        let context = TaskContext::new(&base.hostname, base.transport.as_ref());
        task.run(&context)
    }

    fn run(&self, cmd: &str, options: &RunOptions) -> anyhow::Result<CommandOutput> {
        let base = self.base();
        tracing::info!("Running command '{cmd}' on {}", base.hostname);

        base.transport.run(&base.hostname, cmd, options)
    }

    fn get(&self, remote: &str, local: &Path) -> anyhow::Result<PathBuf> {
        let base = self.base();
        tracing::info!(
            "Fetching {remote} from {} to {}",
            base.hostname,
            local.display()
        );

        base.transport.get(&base.hostname, remote, local)
    }

    fn put(&self, local: &Path, remote: &str, options: &PutOptions) -> anyhow::Result<String> {
        let base = self.base();
        tracing::info!(
            "Pushing {} to {remote} on {}",
            local.display(),
            base.hostname
        );

        base.transport.put(&base.hostname, local, remote, options)
    }
}

/// A machine of the test bed. The variant decides the role.
#[derive(Debug, Clone)]
#[enum_dispatch(RemoteHost)]
pub enum Host {
    Controller(ControllerHost),
    Worker(WorkerHost),
}

impl Host {
    pub fn cmc(
        hostname: impl Into<String>,
        ports: Vec<Port>,
        transport: Arc<dyn Transport>,
        provisioner: Arc<dyn Provisioner>,
    ) -> Result<Self, InfraError> {
        Ok(ControllerHost::new(hostname, ports, transport, provisioner)?.into())
    }

    pub fn slave(
        hostname: impl Into<String>,
        ports: Vec<Port>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, InfraError> {
        Ok(WorkerHost::new(hostname, ports, transport)?.into())
    }

    pub fn as_controller(&self) -> Option<&ControllerHost> {
        match self {
            Host::Controller(host) => Some(host),
            Host::Worker(_) => None,
        }
    }

    pub fn is(&self, host_type: HostType) -> bool {
        self.host_type() == host_type
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ports = self
            .base()
            .ports
            .values()
            .map(|port| format!("{}={}", port.network().name(), port.ip()))
            .join(", ");

        write!(f, "{} ({}) [{}]", self.hostname(), self.host_type(), ports)
    }
}

/// Identity and wiring every host variant carries.
#[derive(Clone)]
pub struct HostBase {
    hostname: String,
    ports: BTreeMap<String, Port>,
    transport: Arc<dyn Transport>,
}

impl HostBase {
    pub fn new(
        hostname: impl Into<String>,
        ports: Vec<Port>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, InfraError> {
        let hostname = hostname.into();

        let mut by_network = BTreeMap::new();
        for port in ports {
            let network = port.network().name().to_owned();
            if by_network.contains_key(&network) {
                return Err(InfraError::DuplicatePort { hostname, network });
            }
            by_network.insert(network, port);
        }

        Ok(Self {
            hostname,
            ports: by_network,
            transport,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn ports_by_network(&self) -> &BTreeMap<String, Port> {
        &self.ports
    }
}

impl fmt::Debug for HostBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBase")
            .field("hostname", &self.hostname)
            .field("ports", &self.ports)
            .finish_non_exhaustive()
    }
}
