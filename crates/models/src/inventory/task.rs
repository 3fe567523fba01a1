use std::{
    any::type_name,
    fmt,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use crate::inventory::{CommandOutput, PutOptions, RunOptions, Transport};

/// A named unit of remote work, run against one host at a time.
pub trait Task: fmt::Debug {
    type Output;

    /// Human readable name used in logs.
    fn identifier(&self) -> String {
        type_name::<Self>().to_owned()
    }

    fn run(&mut self, context: &TaskContext<'_>) -> anyhow::Result<Self::Output>;
}

/// Handle a task uses to reach the host it was dispatched to. Every
/// operation is addressed to that host.
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    hostname: &'a str,
    transport: &'a dyn Transport,
}

impl<'a> TaskContext<'a> {
    pub fn new(hostname: &'a str, transport: &'a dyn Transport) -> Self {
        Self {
            hostname,
            transport,
        }
    }

    pub fn hostname(&self) -> &str {
        self.hostname
    }

    pub fn run(&self, cmd: &str, options: &RunOptions) -> anyhow::Result<CommandOutput> {
        self.transport.run(self.hostname, cmd, options)
    }

    pub fn get(&self, remote: &str, local: &Path) -> anyhow::Result<PathBuf> {
        self.transport.get(self.hostname, remote, local)
    }

    pub fn put(&self, local: &Path, remote: &str, options: &PutOptions) -> anyhow::Result<String> {
        self.transport.put(self.hostname, local, remote, options)
    }
}

impl fmt::Debug for TaskContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("hostname", &self.hostname)
            .finish_non_exhaustive()
    }
}

/// Adapts a closure into a [`Task`].
pub struct FnTask<F, O> {
    name: String,
    body: F,
    output: PhantomData<fn() -> O>,
}

impl<F, O> FnTask<F, O>
where
    F: FnMut(&TaskContext<'_>) -> anyhow::Result<O>,
{
    pub fn new(name: impl Into<String>, body: F) -> Self {
        Self {
            name: name.into(),
            body,
            output: PhantomData,
        }
    }
}

impl<F, O> fmt::Debug for FnTask<F, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask").field("name", &self.name).finish()
    }
}

impl<F, O> Task for FnTask<F, O>
where
    F: FnMut(&TaskContext<'_>) -> anyhow::Result<O>,
{
    type Output = O;

    fn identifier(&self) -> String {
        self.name.clone()
    }

    fn run(&mut self, context: &TaskContext<'_>) -> anyhow::Result<O> {
        (self.body)(context)
    }
}
