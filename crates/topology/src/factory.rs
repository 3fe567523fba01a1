use models::inventory::{Infra, Provisioner, Transport};
use std::sync::Arc;

use crate::TopologyError;

/// The collaborators every host of a topology is wired to.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub provisioner: Arc<dyn Provisioner>,
}

impl Collaborators {
    pub fn new(transport: Arc<dyn Transport>, provisioner: Arc<dyn Provisioner>) -> Self {
        Self {
            transport,
            provisioner,
        }
    }
}

/// Something that knows which networks and hosts make up a test bed.
pub trait TopologyFactory {
    fn build(&self, collaborators: &Collaborators) -> Result<Infra, TopologyError>;
}
