use models::inventory::{Host, HostType, Infra, Network, Port};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

use crate::{Collaborators, TopologyError, TopologyFactory};

mod parse;

pub use parse::{load_topology, load_topology_dir};

/// A test bed as written in a topology file.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct TopologyYaml {
    #[serde(default)]
    pub networks: Vec<NetworkYaml>,

    #[serde(default)]
    pub hosts: Vec<HostYaml>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct NetworkYaml {
    pub name: String,
    pub cidr: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct HostYaml {
    pub hostname: String,
    #[serde(rename = "type")]
    pub host_type: HostType,
    #[serde(default)]
    pub ports: Vec<PortYaml>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PortYaml {
    pub network: String,
    pub ip: String,
}

impl TopologyYaml {
    /// Appends the contents of another file.
    pub fn merge(&mut self, other: TopologyYaml) {
        self.networks.extend(other.networks);
        self.hosts.extend(other.hosts);
    }
}

impl TopologyFactory for TopologyYaml {
    fn build(&self, collaborators: &Collaborators) -> Result<Infra, TopologyError> {
        let networks = self
            .networks
            .iter()
            .map(|n| Ok(Arc::new(Network::new(n.name.as_str(), &n.cidr)?)))
            .collect::<Result<Vec<_>, TopologyError>>()?;

        // duplicates are left for Infra::new to report
        let mut by_name: HashMap<&str, &Arc<Network>> = HashMap::new();
        for network in &networks {
            by_name.entry(network.name()).or_insert(network);
        }

        let mut hosts = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            let ports = host
                .ports
                .iter()
                .map(|port| {
                    let network = by_name.get(port.network.as_str()).ok_or_else(|| {
                        TopologyError::UnknownNetwork {
                            hostname: host.hostname.clone(),
                            network: port.network.clone(),
                        }
                    })?;
                    Ok(Port::parse((*network).clone(), &port.ip)?)
                })
                .collect::<Result<Vec<_>, TopologyError>>()?;

            let transport = collaborators.transport.clone();
            hosts.push(match host.host_type {
                HostType::Cmc => Host::cmc(
                    host.hostname.as_str(),
                    ports,
                    transport,
                    collaborators.provisioner.clone(),
                )?,
                HostType::Slave => Host::slave(host.hostname.as_str(), ports, transport)?,
            });
        }

        Ok(Infra::new(hosts, networks)?)
    }
}
