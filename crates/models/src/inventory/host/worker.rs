use std::sync::Arc;

use crate::inventory::{HostBase, HostType, InfraError, Port, RemoteHost, Transport};

/// A worker (slave) node. Uses the transport as-is.
#[derive(Debug, Clone)]
pub struct WorkerHost {
    base: HostBase,
}

impl WorkerHost {
    pub fn new(
        hostname: impl Into<String>,
        ports: Vec<Port>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, InfraError> {
        Ok(Self {
            base: HostBase::new(hostname, ports, transport)?,
        })
    }
}

impl RemoteHost for WorkerHost {
    fn base(&self) -> &HostBase {
        &self.base
    }

    fn host_type(&self) -> HostType {
        HostType::Slave
    }
}
