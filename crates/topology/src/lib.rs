//! Builders that turn a description of a test bed into an [`Infra`].

mod error;
mod factory;
mod ntc;
mod schema;

pub use error::{MultipleErrors, TopologyError};
pub use factory::{Collaborators, TopologyFactory};
pub use ntc::NtcTopology;
pub use schema::{load_topology, load_topology_dir, HostYaml, NetworkYaml, PortYaml, TopologyYaml};

pub use models::inventory::Infra;
