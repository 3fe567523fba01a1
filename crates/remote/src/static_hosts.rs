use models::inventory::Provisioner;
use settings::StaticHostConfig;
use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::RemoteError;

/// Serves fixed SSH coordinates from configuration, deferring to another
/// provisioner for machines it does not know.
#[derive(Debug, Default)]
pub struct StaticProvisioner {
    hosts: HashMap<String, StaticHostConfig>,
    fallback: Option<Arc<dyn Provisioner>>,
}

impl StaticProvisioner {
    pub fn new(hosts: HashMap<String, StaticHostConfig>) -> Self {
        Self {
            hosts,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn Provisioner>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn fallback(&self, machine: &str) -> anyhow::Result<&dyn Provisioner> {
        self.fallback
            .as_deref()
            .ok_or_else(|| RemoteError::UnknownMachine(machine.to_owned()).into())
    }
}

impl Provisioner for StaticProvisioner {
    fn ssh_host_string(&self, machine: &str) -> anyhow::Result<String> {
        match self.hosts.get(machine) {
            Some(host) => Ok(host.host_string.clone()),
            None => self.fallback(machine)?.ssh_host_string(machine),
        }
    }

    fn ssh_key(&self, machine: &str) -> anyhow::Result<PathBuf> {
        match self.hosts.get(machine) {
            Some(host) => Ok(host.ssh_key.clone()),
            None => self.fallback(machine)?.ssh_key(machine),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testing_utils::FakeProvisioner;

    fn slave1() -> HashMap<String, StaticHostConfig> {
        HashMap::from([(
            "slave1".to_owned(),
            StaticHostConfig {
                host_string: "vagrant@10.0.2.16:22".to_owned(),
                ssh_key: PathBuf::from("/keys/slave1"),
            },
        )])
    }

    #[test]
    fn serves_configured_hosts() {
        let provisioner = StaticProvisioner::new(slave1());
        assert_eq!(
            provisioner.ssh_host_string("slave1").unwrap(),
            "vagrant@10.0.2.16:22"
        );
        assert_eq!(
            provisioner.ssh_key("slave1").unwrap(),
            PathBuf::from("/keys/slave1")
        );
    }

    #[test]
    fn unknown_machine_without_fallback() {
        let err = StaticProvisioner::new(slave1())
            .ssh_host_string("cmc1")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RemoteError>(),
            Some(RemoteError::UnknownMachine(m)) if m == "cmc1"
        ));
    }

    #[test]
    fn defers_to_fallback() {
        let fake = FakeProvisioner::new();
        fake.set("cmc1", "vagrant@127.0.0.1:2222", "/keys/cmc1");

        let provisioner = StaticProvisioner::new(slave1()).with_fallback(fake.clone());

        assert_eq!(
            provisioner.ssh_host_string("cmc1").unwrap(),
            "vagrant@127.0.0.1:2222"
        );
        assert_eq!(
            provisioner.ssh_host_string("slave1").unwrap(),
            "vagrant@10.0.2.16:22"
        );
        assert_eq!(fake.lookups(), 1);
    }
}
