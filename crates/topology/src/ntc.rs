use models::inventory::{Host, Infra, Network, Port};
use std::sync::Arc;

use crate::{Collaborators, TopologyError, TopologyFactory};

/// One controller and one worker sharing the `site` network, with the
/// controller also on `mgmt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NtcTopology;

impl NtcTopology {
    pub const CMC: &'static str = "cmc1";
    pub const SLAVE: &'static str = "slave1";
}

impl TopologyFactory for NtcTopology {
    fn build(&self, collaborators: &Collaborators) -> Result<Infra, TopologyError> {
        let site = Arc::new(Network::new("site", "10.0.2.0/24")?);
        let mgmt = Arc::new(Network::new("mgmt", "10.142.0.0/24")?);

        let cmc = Host::cmc(
            Self::CMC,
            vec![
                Port::parse(site.clone(), "10.0.2.15")?,
                Port::parse(mgmt.clone(), "10.142.0.1")?,
            ],
            collaborators.transport.clone(),
            collaborators.provisioner.clone(),
        )?;

        let slave = Host::slave(
            Self::SLAVE,
            vec![Port::parse(site.clone(), "10.0.2.16")?],
            collaborators.transport.clone(),
        )?;

        Ok(Infra::new(vec![cmc, slave], [site, mgmt])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::inventory::{HostType, RemoteHost};
    use pretty_assertions::assert_eq;
    use testing_utils::{FakeProvisioner, RecordingTransport};

    fn ntc() -> Infra {
        let collaborators = Collaborators::new(RecordingTransport::new(), FakeProvisioner::new());
        NtcTopology.build(&collaborators).unwrap()
    }

    #[test]
    fn one_controller_one_worker() {
        let infra = ntc();

        assert_eq!(infra.len(), 2);
        assert_eq!(infra.get_cmc(None).unwrap().hostname(), "cmc1");
        assert_eq!(infra.get_slave(None).unwrap().hostname(), "slave1");
        assert_eq!(
            infra.get_host("cmc1").unwrap().host_type(),
            HostType::Cmc
        );
    }

    #[test]
    fn networks_and_addresses() {
        let infra = ntc();

        let networks = infra.get_networks();
        assert_eq!(networks.keys().collect::<Vec<_>>(), ["mgmt", "site"]);
        assert_eq!(networks["site"].cidr(), "10.0.2.0/24");
        assert_eq!(networks["mgmt"].cidr(), "10.142.0.0/24");

        let cmc = infra.get_cmc(Some("cmc1")).unwrap();
        assert_eq!(cmc.port("site").unwrap().ip().to_string(), "10.0.2.15");
        assert_eq!(cmc.port("mgmt").unwrap().ip().to_string(), "10.142.0.1");

        let slave = infra.get_slave(Some("slave1")).unwrap();
        assert_eq!(slave.port("site").unwrap().ip().to_string(), "10.0.2.16");
        assert!(slave.port("mgmt").is_none());
    }

    #[test]
    fn every_port_lies_inside_its_network() {
        let infra = ntc();
        for host in infra.hosts() {
            for port in host.ports().values() {
                assert!(port.network().cidr().contains(port.ip()), "{host}");
            }
        }
    }
}
