use std::{net::IpAddr, sync::Arc};

use crate::inventory::{InfraError, Network};

/// Attachment of a host to one network at a given address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    network: Arc<Network>,
    ip: IpAddr,
}

impl Port {
    pub fn new(network: Arc<Network>, ip: IpAddr) -> Self {
        if !network.cidr().contains(ip) {
            tracing::warn!(
                "Port address {ip} lies outside network {} ({})",
                network.name(),
                network.cidr()
            );
        }

        Self { network, ip }
    }

    pub fn parse(network: Arc<Network>, ip: &str) -> Result<Self, InfraError> {
        let ip = ip.parse::<IpAddr>().map_err(|e| InfraError::InvalidAddress {
            value: ip.to_owned(),
            source: e,
        })?;

        Ok(Self::new(network, ip))
    }

    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }
}
