//! Simulators: the unit of process-level execution.
//!
//! A simulator owns one or more components of the topology and ultimately
//! corresponds to one external OS process. This module defines the simulator
//! kinds and their capabilities, the per-simulator lifecycle state machine,
//! and launch-command composition.
//!
//! Command composition turns the derived timing contract into socket flags of
//! the form `role:path:latency=<L>ns:sync_interval=<S>ns[:sync]`; the `:sync`
//! suffix is dropped while a checkpoint is being created or restored, so the
//! boot/restore pass runs unsynchronized.

use serde::{Deserialize, Serialize};

use crate::disk::ImageFormat;
use crate::error::{CardinalityError, LifecycleError, OrchestrationError};
use crate::instantiation::{ArtifactCache, Env};
use crate::socket::{SockRole, Socket, SocketMap};
use crate::sync::{derive_timing, SyncParams};
use crate::topology::{ComponentClass, ComponentSpec, InterfaceKind, Topology};
use crate::types::{ComponentId, SimulatorId};

/// Lifecycle state of one simulator.
///
/// Transitions follow `Created -> Prepared -> Running -> {Checkpointed |
/// Terminated}`; termination is additionally reachable from every state so
/// cleanup can always run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Created,
    Prepared,
    Running,
    Checkpointed,
    Terminated,
}

impl LifecycleState {
    /// Short state name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Prepared => "prepared",
            LifecycleState::Running => "running",
            LifecycleState::Checkpointed => "checkpointed",
            LifecycleState::Terminated => "terminated",
        }
    }

    fn can_transition(self, to: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, to),
            (Created, Prepared)
                | (Prepared, Running)
                | (Running, Checkpointed)
                | (_, Terminated)
        )
    }
}

/// Attributes of a full-system host simulator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSimSpec {
    /// Executable path relative to the installation tree.
    pub executable: String,
    /// Build variant suffix appended to the executable.
    pub variant: String,
    /// CPU model used for normal execution.
    pub cpu_type: String,
    /// Faster CPU model used while booting to create a checkpoint.
    pub cpu_type_checkpoint: String,
    /// System clock passed to the simulator.
    pub sys_clock: String,
    /// Extra arguments inserted right after the executable.
    #[serde(default)]
    pub extra_main_args: Vec<String>,
    /// Extra arguments appended at the end of the command.
    #[serde(default)]
    pub extra_config_args: Vec<String>,
}

impl Default for HostSimSpec {
    fn default() -> Self {
        Self {
            executable: "sims/host/fullsys".to_string(),
            variant: "fast".to_string(),
            cpu_type: "TimingCPU".to_string(),
            cpu_type_checkpoint: "KvmCPU".to_string(),
            sys_clock: "1GHz".to_string(),
            extra_main_args: Vec::new(),
            extra_config_args: Vec::new(),
        }
    }
}

/// The kind of a simulator, with per-kind attributes.
///
/// Kind capabilities (accepted image formats, checkpoint support, socket
/// roles) are answered by `match` rather than trait dispatch, mirroring the
/// typed component queries of the topology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatorKind {
    /// Full-system host simulator booting a guest OS.
    Host(HostSimSpec),
    /// Memory device simulator backing one or more address ranges.
    Mem { executable: String },
    /// Address-routing interconnect simulator.
    Interconnect { executable: String },
    /// NIC behavioral simulator.
    Nic { executable: String },
    /// Network fabric simulator.
    Net { executable: String },
}

impl SimulatorKind {
    /// Host kind with default attributes.
    pub fn host() -> Self {
        SimulatorKind::Host(HostSimSpec::default())
    }

    /// Memory device kind with the default executable.
    pub fn mem() -> Self {
        SimulatorKind::Mem {
            executable: "sims/mem/basicmem".to_string(),
        }
    }

    /// Interconnect kind with the default executable.
    pub fn interconnect() -> Self {
        SimulatorKind::Interconnect {
            executable: "sims/mem/interconnect".to_string(),
        }
    }

    /// NIC kind with the default executable.
    pub fn nic() -> Self {
        SimulatorKind::Nic {
            executable: "sims/nic/i40e_bm".to_string(),
        }
    }

    /// Network kind with the default executable.
    pub fn net() -> Self {
        SimulatorKind::Net {
            executable: "sims/net/switch".to_string(),
        }
    }

    /// Short kind name used in config files and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SimulatorKind::Host(_) => "host",
            SimulatorKind::Mem { .. } => "mem",
            SimulatorKind::Interconnect { .. } => "interconnect",
            SimulatorKind::Nic { .. } => "nic",
            SimulatorKind::Net { .. } => "net",
        }
    }

    /// Executable path relative to the installation tree.
    pub fn executable(&self) -> &str {
        match self {
            SimulatorKind::Host(h) => &h.executable,
            SimulatorKind::Mem { executable }
            | SimulatorKind::Interconnect { executable }
            | SimulatorKind::Nic { executable }
            | SimulatorKind::Net { executable } => executable,
        }
    }

    /// Image formats this kind accepts, in preference order.
    pub fn supported_image_formats(&self) -> &'static [ImageFormat] {
        match self {
            SimulatorKind::Host(_) => &[ImageFormat::Raw, ImageFormat::Qcow2],
            _ => &[],
        }
    }

    /// Whether this kind can take and restore checkpoints.
    pub fn supports_checkpointing(&self) -> bool {
        matches!(self, SimulatorKind::Host(_))
    }

    /// Socket roles this kind can take on its interfaces.
    ///
    /// Host simulators dial into their peers; device and network simulators
    /// can do either.
    pub fn supported_socket_roles(&self) -> &'static [SockRole] {
        match self {
            SimulatorKind::Host(_) => &[SockRole::Connect],
            _ => &[SockRole::Listen, SockRole::Connect],
        }
    }

    /// Cores reserved for this simulator process on its machine.
    pub fn resreq_cores(&self) -> u32 {
        1
    }

    /// Memory (MB) reserved for this simulator process on its machine.
    pub fn resreq_mem(&self) -> u64 {
        match self {
            SimulatorKind::Host(_) => 1024,
            SimulatorKind::Nic { .. } => 256,
            SimulatorKind::Net { .. } => 128,
            _ => 64,
        }
    }
}

/// A simulator: a named process-level execution unit owning components.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Simulator {
    /// Unique simulator id.
    pub id: SimulatorId,
    /// Human-readable name, used in errors and output paths.
    pub name: String,
    /// The simulator kind and attributes.
    pub kind: SimulatorKind,
    /// Components this simulator is responsible for. References, not
    /// ownership: components live in the topology.
    pub components: Vec<ComponentId>,
    /// Lifecycle state.
    pub state: LifecycleState,
}

impl Simulator {
    /// Moves the simulator to a new lifecycle state, rejecting transitions
    /// the state machine does not allow.
    pub fn transition_to(&mut self, to: LifecycleState) -> Result<(), LifecycleError> {
        if !self.state.can_transition(to) {
            return Err(LifecycleError::InvalidTransition {
                simulator: self.name.clone(),
                from: self.state.name(),
                to: to.name(),
            });
        }
        tracing::debug!(simulator = %self.name, from = self.state.name(), to = to.name(), "lifecycle transition");
        self.state = to;
        Ok(())
    }

    /// Commands a running simulator consumes to take a checkpoint.
    pub fn checkpoint_commands(&self) -> Vec<String> {
        if self.kind.supports_checkpointing() {
            vec!["checkpoint".to_string()]
        } else {
            Vec::new()
        }
    }

    /// Commands emitted at cleanup to terminate the guest.
    pub fn cleanup_commands(&self) -> Vec<String> {
        match self.kind {
            SimulatorKind::Host(_) => vec!["exit".to_string()],
            _ => Vec::new(),
        }
    }

    /// Composes the process invocation for this simulator.
    pub fn compose_command(&self, ctx: &ComposeCtx) -> Result<String, OrchestrationError> {
        let params = derive_timing(ctx.topology, &self.name, &self.components)?;
        let parts = match &self.kind {
            SimulatorKind::Host(spec) => self.compose_host(ctx, spec, params)?,
            SimulatorKind::Mem { executable } => self.compose_mem(ctx, executable, params)?,
            SimulatorKind::Interconnect { executable } => {
                self.compose_interconnect(ctx, executable, params)?
            }
            SimulatorKind::Nic { executable } => self.compose_nic(ctx, executable, params)?,
            SimulatorKind::Net { executable } => self.compose_net(ctx, executable, params)?,
        };
        Ok(parts.join(" "))
    }

    fn owned<'a>(&'a self, topo: &'a Topology) -> impl Iterator<Item = &'a ComponentSpec> + 'a {
        self.components
            .iter()
            .filter_map(move |&c| topo.component(c).ok())
    }

    fn compose_host(
        &self,
        ctx: &ComposeCtx,
        spec: &HostSimSpec,
        params: Option<SyncParams>,
    ) -> Result<Vec<String>, OrchestrationError> {
        let hosts: Vec<&ComponentSpec> = self
            .owned(ctx.topology)
            .filter(|c| c.class.is_host())
            .collect();
        if hosts.len() != 1 {
            return Err(CardinalityError::MultipleHostsUnsupported {
                simulator: self.name.clone(),
                count: hosts.len(),
            }
            .into());
        }
        let host = hosts[0];
        let host_spec = match &host.class {
            ComponentClass::Host(h) => h,
            // hosts was filtered on is_host above
            _ => unreachable!(),
        };

        let cpu_type = if ctx.create_checkpoint {
            &spec.cpu_type_checkpoint
        } else {
            &spec.cpu_type
        };

        let mut parts = vec![format!(
            "{}.{}",
            ctx.env.repo_base(&spec.executable).display(),
            spec.variant
        )];
        parts.push(format!(
            "--outdir={}",
            ctx.env.output_dir(&self.name).display()
        ));
        parts.extend(spec.extra_main_args.iter().cloned());
        parts.push(format!(
            "--checkpoint-dir={}",
            ctx.env.cpdir_sim(&self.name).display()
        ));

        if !host_spec.disks.is_empty() {
            let staged = ctx.artifacts.get(self.id, host.id).ok_or_else(|| {
                LifecycleError::NotPrepared {
                    simulator: self.name.clone(),
                }
            })?;
            for path in staged {
                parts.push(format!("--disk-image={}", path.display()));
            }
        }

        parts.push(format!("--cpu-type={cpu_type}"));
        parts.push(format!("--cpu-clock={}", host_spec.cpu_freq));
        parts.push(format!("--sys-clock={}", spec.sys_clock));
        parts.push(format!("--mem-size={}MB", host_spec.memory_mb));
        parts.push(format!("--num-cpus={}", host_spec.cores));
        if let Some(kcmd) = &host_spec.kcmd_append {
            parts.push(format!("--command-line-append=\"{kcmd}\""));
        }
        if ctx.create_checkpoint {
            parts.push("--max-checkpoints=1".to_string());
        }
        if ctx.restore_checkpoint {
            parts.push("-r 1".to_string());
        }

        if let Some(params) = params {
            for iface in ctx.topology.interfaces_of_kind(host.id, InterfaceKind::PcieHost) {
                let Some(sock) = ctx.sockets.get(iface.id) else {
                    continue;
                };
                debug_assert_eq!(sock.role, SockRole::Connect);
                parts.push(socket_flag("--simbricks-pci", sock, params, ctx.suppress_sync()));
            }
            for iface in ctx.topology.interfaces_of_kind(host.id, InterfaceKind::MemHost) {
                let Some(sock) = ctx.sockets.get(iface.id) else {
                    continue;
                };
                let Some(window) = mem_window(ctx.topology, iface.id) else {
                    continue;
                };
                parts.push(mem_flag(&window, sock, params, ctx.suppress_sync()));
            }
            // Co-located memory devices (e.g. a proxy sharing the host's
            // process) also speak through their own sockets.
            for comp in self.owned(ctx.topology) {
                let ComponentClass::MemDevice(dev) = &comp.class else {
                    continue;
                };
                for iface in ctx
                    .topology
                    .interfaces_of_kind(comp.id, InterfaceKind::MemDevice)
                {
                    let Some(sock) = ctx.sockets.get(iface.id) else {
                        continue;
                    };
                    let window = MemWindow {
                        size: dev.size,
                        addr: dev.base_addr,
                        as_id: dev.as_id,
                    };
                    parts.push(mem_flag(&window, sock, params, ctx.suppress_sync()));
                }
            }
        }

        parts.extend(spec.extra_config_args.iter().cloned());
        Ok(parts)
    }

    fn compose_mem(
        &self,
        ctx: &ComposeCtx,
        executable: &str,
        params: Option<SyncParams>,
    ) -> Result<Vec<String>, OrchestrationError> {
        let mut parts = vec![ctx.env.repo_base(executable).display().to_string()];
        let Some(params) = params else {
            return Ok(parts);
        };
        for comp in self.owned(ctx.topology) {
            let ComponentClass::MemDevice(dev) = &comp.class else {
                continue;
            };
            for iface in ctx
                .topology
                .interfaces_of_kind(comp.id, InterfaceKind::MemDevice)
            {
                let Some(sock) = ctx.sockets.get(iface.id) else {
                    continue;
                };
                let window = MemWindow {
                    size: dev.size,
                    addr: dev.base_addr,
                    as_id: dev.as_id,
                };
                parts.push(mem_flag(&window, sock, params, ctx.suppress_sync()));
            }
        }
        Ok(parts)
    }

    fn compose_interconnect(
        &self,
        ctx: &ComposeCtx,
        executable: &str,
        params: Option<SyncParams>,
    ) -> Result<Vec<String>, OrchestrationError> {
        let mut parts = vec![ctx.env.repo_base(executable).display().to_string()];
        let Some(params) = params else {
            return Ok(parts);
        };
        for comp in self.owned(ctx.topology) {
            if !matches!(comp.class, ComponentClass::Interconnect) {
                continue;
            }
            let ports: Vec<_> = ctx.topology.interfaces_of(comp.id).collect();
            for (idx, iface) in ports.iter().enumerate() {
                let Some(sock) = ctx.sockets.get(iface.id) else {
                    continue;
                };
                parts.push(format!(
                    "--port={idx}:{}{}",
                    sock.endpoint(),
                    timing_suffix(params, ctx.suppress_sync())
                ));
            }
            if let Some(table) = ctx.topology.route_table(comp.id) {
                for route in table.routes() {
                    let Some(port_idx) = ports.iter().position(|p| p.id == route.target) else {
                        continue;
                    };
                    parts.push(format!(
                        "--route={}@{}@{}@{port_idx}",
                        route.vaddr, route.len, route.paddr
                    ));
                }
            }
        }
        Ok(parts)
    }

    fn compose_nic(
        &self,
        ctx: &ComposeCtx,
        executable: &str,
        params: Option<SyncParams>,
    ) -> Result<Vec<String>, OrchestrationError> {
        let mut parts = vec![ctx.env.repo_base(executable).display().to_string()];
        for comp in self.owned(ctx.topology) {
            let ComponentClass::Nic(nic) = &comp.class else {
                continue;
            };
            if let Some(ipv4) = &nic.ipv4 {
                parts.push(format!("--ip={ipv4}"));
            }
            let Some(params) = params else {
                continue;
            };
            for iface in ctx
                .topology
                .interfaces_of_kind(comp.id, InterfaceKind::PcieDevice)
            {
                if let Some(sock) = ctx.sockets.get(iface.id) {
                    parts.push(socket_flag("--simbricks-pci", sock, params, ctx.suppress_sync()));
                }
            }
            for iface in ctx.topology.interfaces_of_kind(comp.id, InterfaceKind::Eth) {
                if let Some(sock) = ctx.sockets.get(iface.id) {
                    parts.push(socket_flag("--simbricks-eth", sock, params, ctx.suppress_sync()));
                }
            }
        }
        Ok(parts)
    }

    fn compose_net(
        &self,
        ctx: &ComposeCtx,
        executable: &str,
        params: Option<SyncParams>,
    ) -> Result<Vec<String>, OrchestrationError> {
        let mut parts = vec![ctx.env.repo_base(executable).display().to_string()];
        let Some(params) = params else {
            return Ok(parts);
        };
        for comp in self.owned(ctx.topology) {
            for iface in ctx.topology.interfaces_of_kind(comp.id, InterfaceKind::Eth) {
                if let Some(sock) = ctx.sockets.get(iface.id) {
                    parts.push(socket_flag("--simbricks-eth", sock, params, ctx.suppress_sync()));
                }
            }
        }
        Ok(parts)
    }
}

/// Context shared by command composition: the frozen topology plus everything
/// the run binds to it.
pub struct ComposeCtx<'a> {
    pub topology: &'a Topology,
    pub env: &'a Env,
    pub sockets: &'a SocketMap,
    pub create_checkpoint: bool,
    pub restore_checkpoint: bool,
    pub artifacts: &'a ArtifactCache,
}

impl ComposeCtx<'_> {
    /// Lock-step is suspended while a checkpoint is created or restored; the
    /// flags of that pass must not carry the `:sync` suffix.
    fn suppress_sync(&self) -> bool {
        self.create_checkpoint || self.restore_checkpoint
    }
}

/// The address window a memory socket flag advertises.
struct MemWindow {
    size: u64,
    addr: u64,
    as_id: u32,
}

/// Derives the address window behind a host-side memory interface.
///
/// A directly attached memory device contributes its own range; an
/// interconnect contributes the span covered by its route table (with the
/// address space of the first route's target device).
fn mem_window(topo: &Topology, iface: crate::types::InterfaceId) -> Option<MemWindow> {
    let peer = topo.peer_of(iface)?;
    let peer_comp = topo.interface(peer).ok()?.component;
    match &topo.component(peer_comp).ok()?.class {
        ComponentClass::MemDevice(dev) => Some(MemWindow {
            size: dev.size,
            addr: dev.base_addr,
            as_id: dev.as_id,
        }),
        ComponentClass::Interconnect => {
            let routes = topo.route_table(peer_comp)?.routes();
            let first = routes.first()?;
            let last = routes.last()?;
            let as_id = topo
                .peer_of(first.target)
                .and_then(|dev_if| topo.interface(dev_if).ok())
                .and_then(|spec| topo.component(spec.component).ok())
                .and_then(|comp| comp.as_mem_device())
                .map(|dev| dev.as_id)
                .unwrap_or(0);
            Some(MemWindow {
                size: last.end() - first.vaddr,
                addr: first.vaddr,
                as_id,
            })
        }
        _ => None,
    }
}

fn timing_suffix(params: SyncParams, suppress_sync: bool) -> String {
    let mut s = format!(
        ":latency={}ns:sync_interval={}ns",
        params.latency, params.sync_interval
    );
    if params.synchronous && !suppress_sync {
        s.push_str(":sync");
    }
    s
}

fn socket_flag(prefix: &str, sock: &Socket, params: SyncParams, suppress_sync: bool) -> String {
    format!(
        "{prefix}={}{}",
        sock.endpoint(),
        timing_suffix(params, suppress_sync)
    )
}

fn mem_flag(window: &MemWindow, sock: &Socket, params: SyncParams, suppress_sync: bool) -> String {
    format!(
        "--simbricks-mem={}@{}@{}@{}{}",
        window.size,
        window.addr,
        window.as_id,
        sock.endpoint(),
        timing_suffix(params, suppress_sync)
    )
}

/// A simulation: the frozen topology plus the simulators mapped onto it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Simulation {
    name: String,
    topology: Topology,
    simulators: Vec<Simulator>,
}

impl Simulation {
    /// Creates a simulation over a frozen topology.
    pub fn new(name: impl Into<String>, topology: Topology) -> Self {
        Self {
            name: name.into(),
            topology,
            simulators: Vec::new(),
        }
    }

    /// The simulation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The frozen topology.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Adds a simulator responsible for the given components.
    pub fn add_simulator(
        &mut self,
        name: impl Into<String>,
        kind: SimulatorKind,
        components: Vec<ComponentId>,
    ) -> SimulatorId {
        let id = self.simulators.len() as SimulatorId;
        self.simulators.push(Simulator {
            id,
            name: name.into(),
            kind,
            components,
            state: LifecycleState::Created,
        });
        id
    }

    /// Looks up a simulator by id.
    pub fn simulator(&self, id: SimulatorId) -> Result<&Simulator, LifecycleError> {
        self.simulators
            .get(id as usize)
            .ok_or(LifecycleError::UnknownSimulator(id))
    }

    /// Looks up a simulator by id, mutably.
    pub fn simulator_mut(&mut self, id: SimulatorId) -> Result<&mut Simulator, LifecycleError> {
        self.simulators
            .get_mut(id as usize)
            .ok_or(LifecycleError::UnknownSimulator(id))
    }

    /// Iterates over all simulators.
    pub fn simulators(&self) -> impl Iterator<Item = &Simulator> {
        self.simulators.iter()
    }

    /// Returns the number of simulators.
    pub fn simulator_count(&self) -> usize {
        self.simulators.len()
    }

    /// Returns the simulator responsible for a component, if any.
    pub fn simulator_owning(&self, component: ComponentId) -> Option<SimulatorId> {
        self.simulators
            .iter()
            .find(|s| s.components.contains(&component))
            .map(|s| s.id)
    }

    /// Finds a simulator by name.
    pub fn find_simulator(&self, name: &str) -> Option<&Simulator> {
        self.simulators.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{HostSpec, MemDeviceSpec, TopologyBuilder};

    #[test]
    fn test_lifecycle_transitions() {
        let mut b = TopologyBuilder::new();
        let host = b.add_component("h", ComponentClass::Host(HostSpec::default()));
        let mut sim = Simulation::new("t", b.freeze());
        let id = sim.add_simulator("host0", SimulatorKind::host(), vec![host]);

        let s = sim.simulator_mut(id).unwrap();
        assert_eq!(s.state, LifecycleState::Created);
        s.transition_to(LifecycleState::Prepared).unwrap();
        s.transition_to(LifecycleState::Running).unwrap();
        s.transition_to(LifecycleState::Checkpointed).unwrap();
        s.transition_to(LifecycleState::Terminated).unwrap();
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let b = TopologyBuilder::new();
        let mut sim = Simulation::new("t", b.freeze());
        let id = sim.add_simulator("host0", SimulatorKind::host(), vec![]);

        let s = sim.simulator_mut(id).unwrap();
        let err = s.transition_to(LifecycleState::Running).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
        // Cleanup is reachable from anywhere.
        s.transition_to(LifecycleState::Terminated).unwrap();
    }

    #[test]
    fn test_kind_capabilities() {
        let host = SimulatorKind::host();
        assert!(host.supports_checkpointing());
        assert_eq!(host.supported_socket_roles(), &[SockRole::Connect]);
        assert_eq!(
            host.supported_image_formats(),
            &[ImageFormat::Raw, ImageFormat::Qcow2]
        );

        let mem = SimulatorKind::mem();
        assert!(!mem.supports_checkpointing());
        assert!(mem.supported_socket_roles().contains(&SockRole::Listen));
        assert!(mem.supported_image_formats().is_empty());
        assert!(host.resreq_mem() > mem.resreq_mem());
    }

    #[test]
    fn test_checkpoint_and_cleanup_commands() {
        let b = TopologyBuilder::new();
        let mut sim = Simulation::new("t", b.freeze());
        let h = sim.add_simulator("host0", SimulatorKind::host(), vec![]);
        let m = sim.add_simulator("mem0", SimulatorKind::mem(), vec![]);

        assert_eq!(
            sim.simulator(h).unwrap().checkpoint_commands(),
            vec!["checkpoint"]
        );
        assert_eq!(sim.simulator(h).unwrap().cleanup_commands(), vec!["exit"]);
        assert!(sim.simulator(m).unwrap().checkpoint_commands().is_empty());
        assert!(sim.simulator(m).unwrap().cleanup_commands().is_empty());
    }

    #[test]
    fn test_simulator_owning() {
        let mut b = TopologyBuilder::new();
        let host = b.add_component("h", ComponentClass::Host(HostSpec::default()));
        let mem = b.add_component(
            "m",
            ComponentClass::MemDevice(MemDeviceSpec::new(0x1000, 0, 0)),
        );
        let mut sim = Simulation::new("t", b.freeze());
        let hs = sim.add_simulator("host0", SimulatorKind::host(), vec![host]);
        assert_eq!(sim.simulator_owning(host), Some(hs));
        assert_eq!(sim.simulator_owning(mem), None);
    }
}
