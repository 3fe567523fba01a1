use models::inventory::{
    CommandOutput, FnTask, Host, HostType, InfraError, Network, Port, PutOptions, RemoteHost,
    RunOptions, Task, TaskContext,
};
use pretty_assertions::assert_eq;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use testing_utils::{site_network, Call, FakeProvisioner, RecordingTransport};

fn mgmt_network() -> Arc<Network> {
    Arc::new(Network::new("mgmt", "10.142.0.0/24").unwrap())
}

fn cmc1(transport: Arc<RecordingTransport>, provisioner: Arc<FakeProvisioner>) -> Host {
    Host::cmc(
        "cmc1",
        vec![
            Port::parse(site_network(), "10.0.2.15").unwrap(),
            Port::parse(mgmt_network(), "10.142.0.1").unwrap(),
        ],
        transport,
        provisioner,
    )
    .unwrap()
}

#[test]
fn role_follows_variant() {
    let transport = RecordingTransport::new();
    let cmc = cmc1(transport.clone(), FakeProvisioner::new());
    let slave = Host::slave("slave1", vec![], transport).unwrap();

    assert_eq!(cmc.host_type(), HostType::Cmc);
    assert_eq!(slave.host_type(), HostType::Slave);
    assert!(cmc.as_controller().is_some());
    assert!(slave.as_controller().is_none());
}

#[test]
fn ports_and_networks_are_keyed_by_network_name() {
    let host = cmc1(RecordingTransport::new(), FakeProvisioner::new());

    let ports = host.ports();
    assert_eq!(ports.keys().cloned().collect::<Vec<_>>(), vec!["mgmt", "site"]);
    assert_eq!(ports["site"].ip().to_string(), "10.0.2.15");

    let networks = host.networks();
    assert_eq!(networks["mgmt"].cidr().to_string(), "10.142.0.0/24");
    assert_eq!(host.port("site").map(|p| p.ip().to_string()).as_deref(), Some("10.0.2.15"));
    assert!(host.port("storage").is_none());
}

#[test]
fn returned_ports_are_copies() {
    let host = cmc1(RecordingTransport::new(), FakeProvisioner::new());

    let mut ports = host.ports();
    ports.remove("site");
    let mut networks = host.networks();
    networks.clear();

    assert_eq!(host.ports().len(), 2);
    assert_eq!(host.networks().len(), 2);
}

#[test]
fn second_port_on_same_network_is_rejected() {
    let err = Host::slave(
        "slave1",
        vec![
            Port::parse(site_network(), "10.0.2.16").unwrap(),
            Port::parse(site_network(), "10.0.2.17").unwrap(),
        ],
        RecordingTransport::new(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        InfraError::DuplicatePort { ref hostname, ref network } if hostname == "slave1" && network == "site"
    ));
}

#[test]
fn run_is_addressed_by_hostname_and_forwards_options() {
    let transport = RecordingTransport::new();
    transport.respond(
        "uname -r",
        CommandOutput {
            stdout: "6.1.0\n".to_owned(),
            ..Default::default()
        },
    );
    let host = Host::slave("slave1", vec![], transport.clone()).unwrap();

    let options = RunOptions::default().warn_only().in_dir("/tmp");
    let output = host.run("uname -r", &options).unwrap();

    assert_eq!(output.stdout, "6.1.0\n");
    assert_eq!(
        transport.calls(),
        vec![Call::Run {
            target: "slave1".to_owned(),
            cmd: "uname -r".to_owned(),
            options,
        }]
    );
}

#[test]
fn file_transfers_are_addressed_by_hostname() {
    let transport = RecordingTransport::new();
    let host = cmc1(transport.clone(), FakeProvisioner::new());

    let local = host.get("/var/log/ant.log", Path::new("out/ant.log")).unwrap();
    assert_eq!(local, PathBuf::from("out/ant.log"));

    let options = PutOptions { mode: Some(0o600) };
    let remote = host
        .put(Path::new("fixtures/ant.conf"), "/etc/ant.conf", &options)
        .unwrap();
    assert_eq!(remote, "/etc/ant.conf");

    assert_eq!(
        transport.calls(),
        vec![
            Call::Get {
                target: "cmc1".to_owned(),
                remote: "/var/log/ant.log".to_owned(),
                local: PathBuf::from("out/ant.log"),
            },
            Call::Put {
                target: "cmc1".to_owned(),
                local: PathBuf::from("fixtures/ant.conf"),
                remote: "/etc/ant.conf".to_owned(),
                options,
            },
        ]
    );
}

#[test]
fn transport_failures_pass_through() {
    let transport = RecordingTransport::new();
    transport.make_unreachable("slave1");
    let host = Host::slave("slave1", vec![], transport).unwrap();

    let err = host.run("true", &RunOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "connection to slave1 refused");
}

#[derive(Debug)]
struct CollectHostnames {
    commands: Vec<&'static str>,
}

impl Task for CollectHostnames {
    type Output = Vec<String>;

    fn run(&mut self, context: &TaskContext<'_>) -> anyhow::Result<Self::Output> {
        self.commands
            .iter()
            .map(|cmd| -> anyhow::Result<String> {
                context.run(cmd, &RunOptions::default())?;
                Ok(context.hostname().to_owned())
            })
            .collect()
    }
}

#[test]
fn execute_binds_every_task_operation_to_the_host() {
    let transport = RecordingTransport::new();
    let host = cmc1(transport.clone(), FakeProvisioner::new());

    let mut task = CollectHostnames {
        commands: vec!["hostname", "uptime"],
    };
    let seen = host.execute(&mut task).unwrap();

    assert_eq!(seen, vec!["cmc1", "cmc1"]);
    assert_eq!(transport.targets(), vec!["cmc1", "cmc1"]);
    assert!(task.identifier().ends_with("CollectHostnames"));
}

#[test]
fn closure_tasks_run_and_propagate_errors() {
    let transport = RecordingTransport::new();
    transport.make_unreachable("slave1");
    let host = Host::slave("slave1", vec![], transport).unwrap();

    let mut task = FnTask::new("restart-agent", |ctx: &TaskContext<'_>| {
        ctx.run("systemctl restart ant-agent", &RunOptions::default())
    });
    assert_eq!(task.identifier(), "restart-agent");

    let err = host.execute(&mut task).unwrap_err();
    assert_eq!(err.to_string(), "connection to slave1 refused");
}

#[test]
fn controller_coordinates_are_resolved_on_every_call() {
    let provisioner = FakeProvisioner::new();
    provisioner.set("cmc1", "vagrant@127.0.0.1:2222", "/keys/cmc1");
    let host = cmc1(RecordingTransport::new(), provisioner.clone());
    let cmc = host.as_controller().unwrap();

    assert_eq!(cmc.ssh_host_string().unwrap(), "vagrant@127.0.0.1:2222");
    assert_eq!(cmc.ssh_key().unwrap(), PathBuf::from("/keys/cmc1"));

    // the VM came back on another forwarded port
    provisioner.set("cmc1", "vagrant@127.0.0.1:2200", "/keys/cmc1");
    assert_eq!(cmc.ssh_host_string().unwrap(), "vagrant@127.0.0.1:2200");
    assert_eq!(provisioner.lookups(), 3);
}

#[test]
fn provisioning_failures_pass_through() {
    let host = cmc1(RecordingTransport::new(), FakeProvisioner::new());
    let err = host.as_controller().unwrap().ssh_key().unwrap_err();
    assert_eq!(err.to_string(), "machine cmc1 is not provisioned");
}

#[test]
fn display_lists_role_and_ports() {
    let host = cmc1(RecordingTransport::new(), FakeProvisioner::new());
    assert_eq!(
        host.to_string(),
        "cmc1 (cmc) [mgmt=10.142.0.1, site=10.0.2.15]"
    );
}
