//! Integration tests for the orchestration pipeline.
//!
//! These tests verify end-to-end scenarios including:
//! - Address routing through an interconnect between a host and a memory
//!   device
//! - Socket role assignment across simulator processes
//! - Command composition for every simulator kind
//! - Checkpoint create/restore passes and their effect on synchronization

use std::sync::Arc;

use simweave::{
    prepare_all, ComponentClass, DiskLibrary, Env, HostSpec, ImageFormat, Instantiation,
    InterfaceKind, MemDeviceSpec, NicSpec, OrchestrationError, PrebuiltDiskImage,
    RecordingExecutor, Simulation, SimulatorId, SimulatorKind, TopologyBuilder,
};

const MEM_SIZE: u64 = 0x40_0000;
const MEM_BASE: u64 = 0x3FC_0000;

// ============================================================================
// Scenario Builders
// ============================================================================

/// One host reaching one memory device through an address-routing
/// interconnect, each in its own simulator process.
struct MemTest {
    inst: Instantiation,
    host_sim: SimulatorId,
    ic_sim: SimulatorId,
    mem_sim: SimulatorId,
}

fn memtest(workdir: &str, host_spec: HostSpec) -> MemTest {
    let mut b = TopologyBuilder::new();
    let host = b.add_component("host0", ComponentClass::Host(host_spec));
    let ic = b.add_component("ic0", ComponentClass::Interconnect);
    let mem = b.add_component(
        "mem0",
        ComponentClass::MemDevice(MemDeviceSpec::new(MEM_SIZE, MEM_BASE, 0)),
    );

    let mem_if = b.add_interface(mem, InterfaceKind::MemDevice).unwrap();
    let port = b.connect_device(ic, mem_if, 500, 500).unwrap();
    let host_if = b.add_interface(host, InterfaceKind::MemHost).unwrap();
    b.connect_host(ic, host_if, 500, 500).unwrap();
    b.add_route(ic, port, MEM_BASE, MEM_SIZE, 0).unwrap();

    let mut sim = Simulation::new("memtest", b.freeze());
    let host_sim = sim.add_simulator("host_sim", SimulatorKind::host(), vec![host]);
    let ic_sim = sim.add_simulator("ic_sim", SimulatorKind::interconnect(), vec![ic]);
    let mem_sim = sim.add_simulator("mem_sim", SimulatorKind::mem(), vec![mem]);

    let mut inst = Instantiation::new(sim, Env::new(workdir));
    inst.assign_sockets().unwrap();
    MemTest {
        inst,
        host_sim,
        ic_sim,
        mem_sim,
    }
}

fn flag_parts(cmd: &str) -> Vec<&str> {
    cmd.split_whitespace().collect()
}

// ============================================================================
// Routing
// ============================================================================

#[test]
fn test_route_resolution_end_to_end() {
    let t = memtest("/tmp/memtest", HostSpec::default());
    let topology = t.inst.simulation.topology();
    let ic = topology
        .components()
        .find(|c| c.name == "ic0")
        .unwrap()
        .id;

    let (target, offset) = topology.resolve(ic, MEM_BASE).unwrap();
    assert_eq!(offset, 0);
    // The route forwards to the interconnect's device-facing port, whose
    // peer is the memory device itself.
    let device_if = topology.peer_of(target).unwrap();
    let device = topology.interface(device_if).unwrap().component;
    assert_eq!(topology.component(device).unwrap().name, "mem0");

    let (_, offset) = topology.resolve(ic, MEM_BASE + 0x1000).unwrap();
    assert_eq!(offset, 0x1000);
    assert!(topology.resolve(ic, MEM_BASE + MEM_SIZE).is_err());
}

// ============================================================================
// Command Composition
// ============================================================================

#[test]
fn test_host_command_carries_memory_window() {
    let t = memtest("/tmp/memtest", HostSpec::default());
    let cmd = t.inst.compose_command(t.host_sim).unwrap();

    // The window spans the interconnect's route table, expressed decimally.
    let mem_flag = flag_parts(&cmd)
        .into_iter()
        .find(|p| p.starts_with("--simbricks-mem="))
        .expect("memory socket flag present");
    assert!(mem_flag.starts_with(&format!(
        "--simbricks-mem={MEM_SIZE}@{MEM_BASE}@0@connect:"
    )));
    assert!(mem_flag.ends_with(":latency=500ns:sync_interval=500ns:sync"));

    assert!(cmd.contains("--mem-size=1024MB"));
    assert!(cmd.contains("--num-cpus=1"));
    assert!(cmd.contains("--cpu-type=TimingCPU"));
    assert!(!cmd.contains("--max-checkpoints"));
}

#[test]
fn test_interconnect_command_ports_and_routes() {
    let t = memtest("/tmp/memtest", HostSpec::default());
    let cmd = t.inst.compose_command(t.ic_sim).unwrap();
    let parts = flag_parts(&cmd);

    // Two ports in creation order: device-facing then host-facing.
    assert!(parts.iter().any(|p| p.starts_with("--port=0:")));
    assert!(parts.iter().any(|p| p.starts_with("--port=1:")));
    assert!(parts.contains(&format!("--route={MEM_BASE}@{MEM_SIZE}@0@0").as_str()));
}

#[test]
fn test_mem_command_listens() {
    let t = memtest("/tmp/memtest", HostSpec::default());
    let cmd = t.inst.compose_command(t.mem_sim).unwrap();

    // Both endpoint kinds can listen; the lower interface id (the device's)
    // takes the listening side.
    let mem_flag = flag_parts(&cmd)
        .into_iter()
        .find(|p| p.starts_with("--simbricks-mem="))
        .expect("memory socket flag present");
    assert!(mem_flag.contains("@listen:"));
}

#[test]
fn test_socket_paths_shared_per_channel() {
    let t = memtest("/tmp/memtest", HostSpec::default());
    let topology = t.inst.simulation.topology();
    for channel in topology.channels() {
        let (a, b) = channel.endpoints();
        let sa = t.inst.get_socket(a).unwrap();
        let sb = t.inst.get_socket(b).unwrap();
        assert_eq!(sa.path, sb.path);
        assert_ne!(sa.role, sb.role);
    }
}

// ============================================================================
// Checkpointing
// ============================================================================

#[test]
fn test_checkpoint_create_pass() {
    let mut t = memtest("/tmp/memtest", HostSpec::default());
    t.inst.create_checkpoint = true;

    let cmd = t.inst.compose_command(t.host_sim).unwrap();
    assert!(cmd.contains("--cpu-type=KvmCPU"));
    assert!(cmd.contains("--max-checkpoints=1"));
    // Boot runs unsynchronized: no flag carries the lock-step marker.
    for part in flag_parts(&cmd) {
        assert!(!part.ends_with(":sync"), "unexpected sync suffix in {part}");
    }
}

#[test]
fn test_checkpoint_restore_pass() {
    let mut t = memtest("/tmp/memtest", HostSpec::default());
    t.inst.restore_checkpoint = true;

    let cmd = t.inst.compose_command(t.host_sim).unwrap();
    assert!(cmd.contains("-r 1"));
    assert!(cmd.contains("--cpu-type=TimingCPU"));
    for part in flag_parts(&cmd) {
        assert!(!part.ends_with(":sync"), "unexpected sync suffix in {part}");
    }
}

#[test]
fn test_normal_pass_keeps_sync() {
    let t = memtest("/tmp/memtest", HostSpec::default());
    for id in [t.host_sim, t.ic_sim, t.mem_sim] {
        let cmd = t.inst.compose_command(id).unwrap();
        assert!(
            flag_parts(&cmd).iter().any(|p| p.ends_with(":sync")),
            "simulator {id} lost its sync suffix: {cmd}"
        );
    }
}

// ============================================================================
// Error Paths
// ============================================================================

#[test]
fn test_two_hosts_in_one_simulator_rejected() {
    let mut b = TopologyBuilder::new();
    let h0 = b.add_component("h0", ComponentClass::Host(HostSpec::default()));
    let h1 = b.add_component("h1", ComponentClass::Host(HostSpec::default()));
    let mut sim = Simulation::new("t", b.freeze());
    let id = sim.add_simulator("both", SimulatorKind::host(), vec![h0, h1]);

    let mut inst = Instantiation::new(sim, Env::new("/tmp/t"));
    inst.assign_sockets().unwrap();
    let err = inst.compose_command(id).unwrap_err();
    assert!(matches!(err, OrchestrationError::Cardinality(_)));
}

#[test]
fn test_inconsistent_timing_rejected() {
    let mut b = TopologyBuilder::new();
    let host = b.add_component("h0", ComponentClass::Host(HostSpec::default()));
    let nic = b.add_component("nic0", ComponentClass::Nic(NicSpec::default()));
    let mem = b.add_component(
        "mem0",
        ComponentClass::MemDevice(MemDeviceSpec::new(0x1000, 0, 0)),
    );

    let pci_h = b.add_interface(host, InterfaceKind::PcieHost).unwrap();
    let pci_d = b.add_interface(nic, InterfaceKind::PcieDevice).unwrap();
    b.connect(pci_h, pci_d, 500, 500).unwrap();
    let mem_h = b.add_interface(host, InterfaceKind::MemHost).unwrap();
    let mem_d = b.add_interface(mem, InterfaceKind::MemDevice).unwrap();
    b.connect(mem_h, mem_d, 900, 900).unwrap();

    let mut sim = Simulation::new("t", b.freeze());
    let id = sim.add_simulator("host_sim", SimulatorKind::host(), vec![host]);
    sim.add_simulator("nic_sim", SimulatorKind::nic(), vec![nic]);
    sim.add_simulator("mem_sim", SimulatorKind::mem(), vec![mem]);

    let mut inst = Instantiation::new(sim, Env::new("/tmp/t"));
    inst.assign_sockets().unwrap();
    let err = inst.compose_command(id).unwrap_err();
    assert!(matches!(err, OrchestrationError::Timing(_)));
}

#[test]
fn test_unplaced_peer_skipped() {
    // The NIC belongs to no simulator, so its channel gets no sockets and
    // the host composes without a PCI flag.
    let mut b = TopologyBuilder::new();
    let host = b.add_component("h0", ComponentClass::Host(HostSpec::default()));
    let nic = b.add_component("nic0", ComponentClass::Nic(NicSpec::default()));
    let pci_h = b.add_interface(host, InterfaceKind::PcieHost).unwrap();
    let pci_d = b.add_interface(nic, InterfaceKind::PcieDevice).unwrap();
    b.connect(pci_h, pci_d, 500, 500).unwrap();

    let mut sim = Simulation::new("t", b.freeze());
    let id = sim.add_simulator("host_sim", SimulatorKind::host(), vec![host]);

    let mut inst = Instantiation::new(sim, Env::new("/tmp/t"));
    inst.assign_sockets().unwrap();
    assert!(inst.get_socket(pci_h).is_none());

    let cmd = inst.compose_command(id).unwrap();
    assert!(!cmd.contains("--simbricks-pci="));
}

// ============================================================================
// Preparation and Persistence
// ============================================================================

#[test]
fn test_disks_require_preparation_then_appear() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().to_str().unwrap();
    let mut t = memtest(workdir, HostSpec::default().with_disk("base"));

    let err = t.inst.compose_command(t.host_sim).unwrap_err();
    assert!(matches!(err, OrchestrationError::Lifecycle(_)));

    let mut library = DiskLibrary::new();
    library.add(Arc::new(PrebuiltDiskImage::new(
        "base",
        vec![ImageFormat::Raw],
        false,
    )));
    let source = t.inst.env.image_path("base", ImageFormat::Raw);
    std::fs::create_dir_all(source.parent().unwrap()).unwrap();
    std::fs::write(&source, b"img").unwrap();

    prepare_all(&mut t.inst, &library, &RecordingExecutor::new()).unwrap();
    let cmd = t.inst.compose_command(t.host_sim).unwrap();
    assert!(cmd.contains(&format!("--disk-image={}", source.display())));
}

#[test]
fn test_persisted_instantiation_composes_identically() {
    let t = memtest("/tmp/memtest", HostSpec::default());
    let before = t.inst.compose_command(t.ic_sim).unwrap();

    let json = t.inst.to_json().unwrap();
    let restored = Instantiation::from_json(&json).unwrap();
    let after = restored.compose_command(t.ic_sim).unwrap();
    assert_eq!(before, after);
}
