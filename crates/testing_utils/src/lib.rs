use anyhow::anyhow;
use models::inventory::{
    CommandOutput, Host, HostType, Infra, Network, Port, Provisioner, PutOptions, RunOptions,
    Transport,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::{
    collections::{BTreeSet, HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

// This magic library called `ctor` somehow runs before any other step in the test binary
// we use it to install color_eyre for prettier panic messages (we can't do this in each test
// because they run in parallel)
#[ctor::ctor]
fn init() {
    let _ = color_eyre::install();
}

/// One operation seen by a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Run {
        target: String,
        cmd: String,
        options: RunOptions,
    },
    Get {
        target: String,
        remote: String,
        local: PathBuf,
    },
    Put {
        target: String,
        local: PathBuf,
        remote: String,
        options: PutOptions,
    },
}

impl Call {
    pub fn target(&self) -> &str {
        match self {
            Call::Run { target, .. } | Call::Get { target, .. } | Call::Put { target, .. } => {
                target
            }
        }
    }
}

/// Transport double that records every call and answers from a script.
///
/// Commands without a scripted answer succeed with empty output. Targets
/// marked unreachable fail every operation.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<HashMap<String, CommandOutput>>,
    unreachable: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, cmd: impl Into<String>, output: CommandOutput) {
        self.responses.lock().insert(cmd.into(), output);
    }

    pub fn make_unreachable(&self, target: impl Into<String>) {
        self.unreachable.lock().insert(target.into());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn targets(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|c| c.target().to_owned())
            .collect()
    }

    fn record(&self, call: Call) -> anyhow::Result<()> {
        let target = call.target().to_owned();
        self.calls.lock().push(call);

        if self.unreachable.lock().contains(&target) {
            return Err(anyhow!("connection to {target} refused"));
        }
        Ok(())
    }
}

impl Transport for RecordingTransport {
    fn run(&self, target: &str, cmd: &str, options: &RunOptions) -> anyhow::Result<CommandOutput> {
        self.record(Call::Run {
            target: target.to_owned(),
            cmd: cmd.to_owned(),
            options: options.clone(),
        })?;

        Ok(self
            .responses
            .lock()
            .get(cmd)
            .cloned()
            .unwrap_or_default())
    }

    fn get(&self, target: &str, remote: &str, local: &Path) -> anyhow::Result<PathBuf> {
        self.record(Call::Get {
            target: target.to_owned(),
            remote: remote.to_owned(),
            local: local.to_path_buf(),
        })?;

        Ok(local.to_path_buf())
    }

    fn put(
        &self,
        target: &str,
        local: &Path,
        remote: &str,
        options: &PutOptions,
    ) -> anyhow::Result<String> {
        self.record(Call::Put {
            target: target.to_owned(),
            local: local.to_path_buf(),
            remote: remote.to_owned(),
            options: *options,
        })?;

        Ok(remote.to_owned())
    }
}

/// Provisioner double backed by a mutable table. Counts lookups so tests can
/// check nothing is cached.
#[derive(Debug, Default)]
pub struct FakeProvisioner {
    machines: Mutex<HashMap<String, (String, PathBuf)>>,
    lookups: AtomicUsize,
}

impl FakeProvisioner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, machine: &str, host_string: &str, key: impl Into<PathBuf>) {
        self.machines
            .lock()
            .insert(machine.to_owned(), (host_string.to_owned(), key.into()));
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn entry(&self, machine: &str) -> anyhow::Result<(String, PathBuf)> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.machines
            .lock()
            .get(machine)
            .cloned()
            .ok_or_else(|| anyhow!("machine {machine} is not provisioned"))
    }
}

impl Provisioner for FakeProvisioner {
    fn ssh_host_string(&self, machine: &str) -> anyhow::Result<String> {
        Ok(self.entry(machine)?.0)
    }

    fn ssh_key(&self, machine: &str) -> anyhow::Result<PathBuf> {
        Ok(self.entry(machine)?.1)
    }
}

/// The `site` network most fixtures attach to.
pub fn site_network() -> Arc<Network> {
    Arc::new(Network::new("site", "10.0.2.0/24").expect("static CIDR is valid"))
}

/// Builds an infra on the `site` network with the given hosts, addressing
/// them sequentially from `10.0.2.10`.
pub fn site_infra(
    hosts: &[(&str, HostType)],
    transport: Arc<RecordingTransport>,
    provisioner: Arc<FakeProvisioner>,
) -> Result<Infra, models::inventory::InfraError> {
    let site = site_network();

    let hosts = hosts
        .iter()
        .enumerate()
        .map(|(i, (name, ty))| {
            let port = Port::parse(site.clone(), &format!("10.0.2.{}", 10 + i))?;
            match ty {
                HostType::Cmc => Host::cmc(*name, vec![port], transport.clone(), provisioner.clone()),
                HostType::Slave => Host::slave(*name, vec![port], transport.clone()),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Infra::new(hosts, [site])
}

/// Generates a valid hostname for property testing.
pub fn hostname_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}"
}

/// Generates a role for property testing.
pub fn host_type_strategy() -> impl Strategy<Value = HostType> {
    prop_oneof![Just(HostType::Cmc), Just(HostType::Slave)]
}

/// Generates up to `max` hosts with unique names and random roles.
pub fn roster_strategy(max: usize) -> impl Strategy<Value = Vec<(String, HostType)>> {
    proptest::collection::btree_set(hostname_strategy(), 0..=max).prop_flat_map(
        |names: BTreeSet<String>| {
            let len = names.len();
            (
                Just(names.into_iter().collect::<Vec<_>>()),
                proptest::collection::vec(host_type_strategy(), len),
            )
                .prop_map(|(names, roles)| names.into_iter().zip(roles).collect())
        },
    )
}
