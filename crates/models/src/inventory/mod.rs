mod error;
mod host;
mod infra;
mod network;
mod provision;
mod task;
mod transport;
mod types;

pub use error::{InfraError, RecordKind};
pub use host::{ControllerHost, Host, HostBase, Port, RemoteHost, WorkerHost};
pub use infra::Infra;
pub use network::Network;
pub use provision::Provisioner;
pub use task::{FnTask, Task, TaskContext};
pub use transport::{CommandOutput, PutOptions, RunOptions, Transport};
pub use types::{Cidr, HostType};
