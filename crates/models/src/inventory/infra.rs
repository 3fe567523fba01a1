use itertools::Itertools;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use crate::inventory::{Host, HostType, InfraError, Network, RecordKind, RemoteHost};

/// A set of test infrastructure: every host and network of one test bed.
///
/// Built once from the full host and network lists and read-only after
/// that. Both lists keep their input order, which is the order used when a
/// caller asks for "any" host of a role.
#[derive(Debug, Clone)]
pub struct Infra {
    hosts: Vec<Host>,
    host_index: HashMap<String, usize>,
    networks: Vec<Arc<Network>>,
    network_index: HashMap<String, usize>,
}

impl Infra {
    /// Validates and indexes the test bed.
    ///
    /// Fails on duplicate network names or hostnames, and on any port that
    /// points at a network which is not one of `networks`.
    pub fn new<N>(
        hosts: Vec<Host>,
        networks: impl IntoIterator<Item = N>,
    ) -> Result<Self, InfraError>
    where
        N: Into<Arc<Network>>,
    {
        let networks: Vec<Arc<Network>> = networks.into_iter().map(Into::into).collect();

        let mut network_index = HashMap::with_capacity(networks.len());
        for (i, network) in networks.iter().enumerate() {
            if network_index.insert(network.name().to_owned(), i).is_some() {
                return Err(InfraError::duplicate(RecordKind::Network, network.name()));
            }
        }

        let mut host_index = HashMap::with_capacity(hosts.len());
        for (i, host) in hosts.iter().enumerate() {
            if host_index.insert(host.hostname().to_owned(), i).is_some() {
                return Err(InfraError::duplicate(RecordKind::Host, host.hostname()));
            }

            for (name, port) in host.base().ports_by_network() {
                let registered = network_index.get(name).map(|&i| &networks[i]);
                match registered {
                    Some(network) if **network == **port.network() => {}
                    _ => {
                        return Err(InfraError::DanglingNetworkReference {
                            hostname: host.hostname().to_owned(),
                            network: name.clone(),
                        });
                    }
                }
            }
        }

        tracing::debug!(
            "Built infra with hosts [{}] and networks [{}]",
            hosts.iter().map(|h| h.hostname()).join(", "),
            networks.iter().map(|n| n.name()).join(", ")
        );

        Ok(Self {
            hosts,
            host_index,
            networks,
            network_index,
        })
    }

    /// Hosts in input order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.iter()
    }

    /// Networks in input order.
    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.networks.iter().map(|n| n.as_ref())
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn get_hosts(&self) -> BTreeMap<String, Host> {
        self.hosts
            .iter()
            .map(|host| (host.hostname().to_owned(), host.clone()))
            .collect()
    }

    pub fn get_host(&self, hostname: &str) -> Result<&Host, InfraError> {
        self.host_index
            .get(hostname)
            .map(|&i| &self.hosts[i])
            .ok_or_else(|| InfraError::lookup(RecordKind::Host, hostname))
    }

    pub fn get_cmcs(&self) -> BTreeMap<String, Host> {
        self.by_role(HostType::Cmc)
    }

    /// The cmc named `hostname`, or the first cmc if no name is given.
    ///
    /// `Some("")` is an exact lookup like any other name and fails with
    /// [`InfraError::Lookup`]; only `None` picks a host.
    pub fn get_cmc(&self, hostname: Option<&str>) -> Result<&Host, InfraError> {
        self.pick(HostType::Cmc, hostname)
    }

    pub fn get_slaves(&self) -> BTreeMap<String, Host> {
        self.by_role(HostType::Slave)
    }

    /// The slave named `hostname`, or the first slave if no name is given.
    ///
    /// `Some("")` is an exact lookup like any other name and fails with
    /// [`InfraError::Lookup`]; only `None` picks a host.
    pub fn get_slave(&self, hostname: Option<&str>) -> Result<&Host, InfraError> {
        self.pick(HostType::Slave, hostname)
    }

    pub fn get_networks(&self) -> BTreeMap<String, Network> {
        self.networks
            .iter()
            .map(|network| (network.name().to_owned(), Network::clone(network)))
            .collect()
    }

    pub fn get_network(&self, name: &str) -> Result<&Network, InfraError> {
        self.network_index
            .get(name)
            .map(|&i| self.networks[i].as_ref())
            .ok_or_else(|| InfraError::lookup(RecordKind::Network, name))
    }

    /// Hosts with a port on `network`, in input order.
    pub fn hosts_on(&self, network: &str) -> Result<Vec<&Host>, InfraError> {
        self.get_network(network)?;

        Ok(self
            .hosts
            .iter()
            .filter(|host| host.port(network).is_some())
            .collect())
    }

    fn role(&self, host_type: HostType) -> impl Iterator<Item = &Host> {
        self.hosts.iter().filter(move |host| host.is(host_type))
    }

    fn by_role(&self, host_type: HostType) -> BTreeMap<String, Host> {
        self.role(host_type)
            .map(|host| (host.hostname().to_owned(), host.clone()))
            .collect()
    }

    fn pick(&self, host_type: HostType, hostname: Option<&str>) -> Result<&Host, InfraError> {
        match hostname {
            Some(hostname) => self
                .role(host_type)
                .find(|host| host.hostname() == hostname)
                .ok_or_else(|| InfraError::lookup(host_type, hostname)),
            None => self
                .role(host_type)
                .next()
                .ok_or(InfraError::EmptyRoleSet(host_type)),
        }
    }
}
