//! Concrete collaborators for the inventory: an SSH transport and the
//! provisioners that tell it where machines live.

mod command_runner;
mod error;
mod ssh;
mod static_hosts;
mod vagrant;

pub use command_runner::{CommandRunner, SystemCommandRunner};
pub use error::RemoteError;
pub use ssh::{compose_command, SshEndpoint, SshTransport};
pub use static_hosts::StaticProvisioner;
pub use vagrant::{SshConfigEntry, VagrantProvisioner};
