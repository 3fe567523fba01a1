use std::{fmt, path::PathBuf};

/// Source of SSH coordinates for provisioned machines, e.g. a VM manager.
///
/// Lookups are made on every request, so a backend whose machines move
/// around is always asked for the current answer.
pub trait Provisioner: Send + Sync + fmt::Debug {
    /// Connection string for `machine`, in `user@host:port` form.
    fn ssh_host_string(&self, machine: &str) -> anyhow::Result<String>;

    /// Path to the private key that authenticates against `machine`.
    fn ssh_key(&self, machine: &str) -> anyhow::Result<PathBuf>;
}
