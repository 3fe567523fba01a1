use std::{fmt, path::PathBuf, sync::Arc};

use crate::inventory::{
    HostBase, HostType, InfraError, Port, Provisioner, RemoteHost, Transport,
};

/// A controller (cmc) node. Its SSH coordinates are owned by the
/// provisioning backend and resolved on every request.
#[derive(Clone)]
pub struct ControllerHost {
    base: HostBase,
    provisioner: Arc<dyn Provisioner>,
}

impl ControllerHost {
    pub fn new(
        hostname: impl Into<String>,
        ports: Vec<Port>,
        transport: Arc<dyn Transport>,
        provisioner: Arc<dyn Provisioner>,
    ) -> Result<Self, InfraError> {
        Ok(Self {
            base: HostBase::new(hostname, ports, transport)?,
            provisioner,
        })
    }

    /// `user@host:port` for this machine, as the provisioner currently sees it.
    pub fn ssh_host_string(&self) -> anyhow::Result<String> {
        tracing::debug!("Resolving ssh host string for {}", self.base.hostname());
        self.provisioner.ssh_host_string(self.base.hostname())
    }

    pub fn ssh_key(&self) -> anyhow::Result<PathBuf> {
        tracing::debug!("Resolving ssh key for {}", self.base.hostname());
        self.provisioner.ssh_key(self.base.hostname())
    }
}

impl RemoteHost for ControllerHost {
    fn base(&self) -> &HostBase {
        &self.base
    }

    fn host_type(&self) -> HostType {
        HostType::Cmc
    }
}

impl fmt::Debug for ControllerHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerHost")
            .field("base", &self.base)
            .field("provisioner", &self.provisioner)
            .finish()
    }
}
