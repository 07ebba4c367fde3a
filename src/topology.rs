//! Topology model: components, interfaces, and channels.
//!
//! The simulated system is described as a graph. Components are the nodes
//! (hosts, memory devices, NICs, switches, interconnects), interfaces are
//! typed attachment points on exactly one component, and channels are timed
//! links between two interfaces. Cross-process timing is declared only on
//! channels.
//!
//! The graph is assembled through [`TopologyBuilder`] and then frozen into an
//! immutable [`Topology`] snapshot. Everything downstream (routing queries,
//! timing derivation, socket assignment, command composition) consumes the
//! frozen snapshot; nothing mutates the graph after construction.
//!
//! # Example
//!
//! ```
//! use simweave::topology::{ComponentClass, HostSpec, InterfaceKind, MemDeviceSpec, TopologyBuilder};
//!
//! let mut b = TopologyBuilder::new();
//! let host = b.add_component("host0", ComponentClass::Host(HostSpec::default()));
//! let mem = b.add_component(
//!     "mem0",
//!     ComponentClass::MemDevice(MemDeviceSpec::new(4 * 1024 * 1024, 0x3FC0000, 0)),
//! );
//! let host_if = b.add_interface(host, InterfaceKind::MemHost).unwrap();
//! let mem_if = b.add_interface(mem, InterfaceKind::MemDevice).unwrap();
//! let chan = b.connect(host_if, mem_if, 500, 500).unwrap();
//!
//! let topo = b.freeze();
//! assert_eq!(topo.peer_of(host_if), Some(mem_if));
//! assert_eq!(topo.channel(chan).unwrap().latency, 500);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;
use crate::interconnect::{InterconnectState, RouteTable};
use crate::types::{Address, AddressSpaceId, ChannelId, ComponentId, InterfaceId, TimeNs};

/// The kind of an interface, determining what traffic it terminates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceKind {
    /// Memory requester side (a CPU or proxy issuing loads/stores).
    MemHost,
    /// Memory responder side (a device backing an address range).
    MemDevice,
    /// PCIe root-port side.
    PcieHost,
    /// PCIe endpoint side.
    PcieDevice,
    /// Ethernet link endpoint.
    Eth,
}

impl InterfaceKind {
    /// Returns true for memory-protocol interfaces (either direction).
    pub fn is_mem(&self) -> bool {
        matches!(self, InterfaceKind::MemHost | InterfaceKind::MemDevice)
    }

    /// Returns true for PCIe-protocol interfaces (either direction).
    pub fn is_pcie(&self) -> bool {
        matches!(self, InterfaceKind::PcieHost | InterfaceKind::PcieDevice)
    }
}

/// Attributes of a full-system host component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    /// Guest memory size in MB.
    pub memory_mb: u64,
    /// Guest core count.
    pub cores: u32,
    /// Guest CPU frequency (e.g. "3GHz").
    pub cpu_freq: String,
    /// Extra kernel command line, appended verbatim.
    #[serde(default)]
    pub kcmd_append: Option<String>,
    /// Names of disk images attached to this host, in drive order.
    #[serde(default)]
    pub disks: Vec<String>,
}

impl Default for HostSpec {
    fn default() -> Self {
        Self {
            memory_mb: 1024,
            cores: 1,
            cpu_freq: "3GHz".to_string(),
            kcmd_append: None,
            disks: Vec::new(),
        }
    }
}

impl HostSpec {
    /// Sets the guest memory size in MB.
    pub fn with_memory_mb(mut self, mb: u64) -> Self {
        self.memory_mb = mb;
        self
    }

    /// Sets the guest core count.
    pub fn with_cores(mut self, cores: u32) -> Self {
        self.cores = cores;
        self
    }

    /// Sets the guest CPU frequency string.
    pub fn with_cpu_freq(mut self, freq: impl Into<String>) -> Self {
        self.cpu_freq = freq.into();
        self
    }

    /// Appends a disk image by name.
    pub fn with_disk(mut self, image: impl Into<String>) -> Self {
        self.disks.push(image.into());
        self
    }

    /// Sets the kernel command line append string.
    pub fn with_kcmd_append(mut self, kcmd: impl Into<String>) -> Self {
        self.kcmd_append = Some(kcmd.into());
        self
    }
}

/// Attributes of a memory device component backing an address range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemDeviceSpec {
    /// Size of the backed range in bytes.
    pub size: u64,
    /// Guest-visible base address.
    pub base_addr: Address,
    /// Address space this range lives in.
    pub as_id: AddressSpaceId,
}

impl MemDeviceSpec {
    /// Creates a new memory device spec.
    pub fn new(size: u64, base_addr: Address, as_id: AddressSpaceId) -> Self {
        Self {
            size,
            base_addr,
            as_id,
        }
    }
}

/// Attributes of a NIC component.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicSpec {
    /// IPv4 address assigned to the NIC, if any.
    #[serde(default)]
    pub ipv4: Option<String>,
}

/// The class of a component, carrying its typed attributes.
///
/// Downstream code filters components by class instead of dispatching through
/// a type hierarchy; see [`Topology::hosts`] and friends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentClass {
    /// A full-system host (CPU, memory, disks) booting a guest OS.
    Host(HostSpec),
    /// A memory device backing a guest-visible address range.
    MemDevice(MemDeviceSpec),
    /// A network interface card.
    Nic(NicSpec),
    /// An Ethernet switch.
    Switch,
    /// An address-routing interconnect (see the `interconnect` module).
    Interconnect,
}

impl ComponentClass {
    /// Short class name used in logs and config files.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ComponentClass::Host(_) => "host",
            ComponentClass::MemDevice(_) => "mem_device",
            ComponentClass::Nic(_) => "nic",
            ComponentClass::Switch => "switch",
            ComponentClass::Interconnect => "interconnect",
        }
    }

    /// Returns true if this is a full-system host.
    pub fn is_host(&self) -> bool {
        matches!(self, ComponentClass::Host(_))
    }
}

/// A component: a named, uniquely identified node in the topology.
///
/// Identity is immutable after creation. Simulators reference components by
/// id; they never own them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Unique component id (index into the topology arena).
    pub id: ComponentId,
    /// Human-readable name, unique within the topology.
    pub name: String,
    /// The component class and its attributes.
    pub class: ComponentClass,
}

impl ComponentSpec {
    /// Returns the host attributes if this component is a host.
    pub fn as_host(&self) -> Option<&HostSpec> {
        match &self.class {
            ComponentClass::Host(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns the memory device attributes if this component is one.
    pub fn as_mem_device(&self) -> Option<&MemDeviceSpec> {
        match &self.class {
            ComponentClass::MemDevice(spec) => Some(spec),
            _ => None,
        }
    }
}

/// An interface: a typed attachment point on exactly one component.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct InterfaceSpec {
    /// Unique interface id (index into the topology arena).
    pub id: InterfaceId,
    /// The owning component.
    pub component: ComponentId,
    /// The interface kind.
    pub kind: InterfaceKind,
}

/// A channel: an unordered pair of interfaces plus the timing contract of the
/// link between them.
///
/// A channel is the only place cross-process timing is declared.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Unique channel id (index into the topology arena).
    pub id: ChannelId,
    /// One endpoint.
    pub a: InterfaceId,
    /// The other endpoint.
    pub b: InterfaceId,
    /// One-way propagation delay in nanoseconds.
    pub latency: TimeNs,
    /// Maximum time between mandatory synchronization points, in nanoseconds.
    pub sync_interval: TimeNs,
    /// Whether the link requires lock-step synchronization.
    pub synchronous: bool,
}

impl ChannelSpec {
    /// Returns both endpoints.
    pub fn endpoints(&self) -> (InterfaceId, InterfaceId) {
        (self.a, self.b)
    }

    /// Returns the opposite endpoint, or `None` if `iface` is not on this
    /// channel.
    pub fn peer_of(&self, iface: InterfaceId) -> Option<InterfaceId> {
        if iface == self.a {
            Some(self.b)
        } else if iface == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    /// Returns the `(latency, sync_interval)` pair.
    pub fn timing(&self) -> (TimeNs, TimeNs) {
        (self.latency, self.sync_interval)
    }

    /// Returns true if `iface` terminates this channel.
    pub fn touches(&self, iface: InterfaceId) -> bool {
        iface == self.a || iface == self.b
    }
}

/// Incremental builder for a [`Topology`].
///
/// The builder is the only mutable view of the graph. Invariants are enforced
/// at call time: an interface may join at most one channel, channel endpoints
/// must be distinct, and interconnect wiring follows its two-phase protocol
/// (see the `interconnect` module).
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    pub(crate) components: Vec<ComponentSpec>,
    pub(crate) interfaces: Vec<InterfaceSpec>,
    pub(crate) channels: Vec<ChannelSpec>,
    /// Channel membership per interface, `None` while unconnected.
    pub(crate) membership: Vec<Option<ChannelId>>,
    /// Wiring and routing state per interconnect component.
    pub(crate) interconnects: HashMap<ComponentId, InterconnectState>,
}

impl TopologyBuilder {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component and returns its id.
    pub fn add_component(&mut self, name: impl Into<String>, class: ComponentClass) -> ComponentId {
        let id = self.components.len() as ComponentId;
        if matches!(class, ComponentClass::Interconnect) {
            self.interconnects.insert(id, InterconnectState::new());
        }
        self.components.push(ComponentSpec {
            id,
            name: name.into(),
            class,
        });
        id
    }

    /// Adds an interface of the given kind to a component.
    pub fn add_interface(
        &mut self,
        component: ComponentId,
        kind: InterfaceKind,
    ) -> Result<InterfaceId, TopologyError> {
        if component as usize >= self.components.len() {
            return Err(TopologyError::UnknownComponent(component));
        }
        let id = self.interfaces.len() as InterfaceId;
        self.interfaces.push(InterfaceSpec {
            id,
            component,
            kind,
        });
        self.membership.push(None);
        Ok(id)
    }

    /// Connects two interfaces with a synchronous channel.
    ///
    /// Fails with [`TopologyError::AlreadyConnected`] if either interface is
    /// already part of a channel.
    pub fn connect(
        &mut self,
        a: InterfaceId,
        b: InterfaceId,
        latency: TimeNs,
        sync_interval: TimeNs,
    ) -> Result<ChannelId, TopologyError> {
        self.connect_with_mode(a, b, latency, sync_interval, true)
    }

    /// Connects two interfaces with a free-running (non-lock-step) channel.
    pub fn connect_async(
        &mut self,
        a: InterfaceId,
        b: InterfaceId,
        latency: TimeNs,
        sync_interval: TimeNs,
    ) -> Result<ChannelId, TopologyError> {
        self.connect_with_mode(a, b, latency, sync_interval, false)
    }

    fn connect_with_mode(
        &mut self,
        a: InterfaceId,
        b: InterfaceId,
        latency: TimeNs,
        sync_interval: TimeNs,
        synchronous: bool,
    ) -> Result<ChannelId, TopologyError> {
        if a as usize >= self.interfaces.len() {
            return Err(TopologyError::UnknownInterface(a));
        }
        if b as usize >= self.interfaces.len() {
            return Err(TopologyError::UnknownInterface(b));
        }
        if a == b {
            return Err(TopologyError::SelfConnect(a));
        }
        if self.membership[a as usize].is_some() {
            return Err(TopologyError::AlreadyConnected(a));
        }
        if self.membership[b as usize].is_some() {
            return Err(TopologyError::AlreadyConnected(b));
        }

        let id = self.channels.len() as ChannelId;
        self.channels.push(ChannelSpec {
            id,
            a,
            b,
            latency,
            sync_interval,
            synchronous,
        });
        self.membership[a as usize] = Some(id);
        self.membership[b as usize] = Some(id);
        Ok(id)
    }

    /// Returns the number of components added so far.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Freezes the builder into an immutable topology snapshot.
    pub fn freeze(self) -> Topology {
        let iface_channel = self
            .membership
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|c| (i as InterfaceId, c)))
            .collect();
        let routes = self
            .interconnects
            .into_iter()
            .map(|(id, state)| (id, state.into_table()))
            .collect();
        tracing::debug!(
            components = self.components.len(),
            interfaces = self.interfaces.len(),
            channels = self.channels.len(),
            "topology frozen"
        );
        Topology {
            components: self.components,
            interfaces: self.interfaces,
            channels: self.channels,
            iface_channel,
            routes,
        }
    }
}

/// Immutable snapshot of the system graph.
///
/// All lookups are pure and require no locking; the topology is frozen before
/// any simulator preparation begins.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Topology {
    components: Vec<ComponentSpec>,
    interfaces: Vec<InterfaceSpec>,
    channels: Vec<ChannelSpec>,
    iface_channel: HashMap<InterfaceId, ChannelId>,
    routes: HashMap<ComponentId, RouteTable>,
}

impl Topology {
    /// Looks up a component by id.
    pub fn component(&self, id: ComponentId) -> Result<&ComponentSpec, TopologyError> {
        self.components
            .get(id as usize)
            .ok_or(TopologyError::UnknownComponent(id))
    }

    /// Looks up an interface by id.
    pub fn interface(&self, id: InterfaceId) -> Result<&InterfaceSpec, TopologyError> {
        self.interfaces
            .get(id as usize)
            .ok_or(TopologyError::UnknownInterface(id))
    }

    /// Looks up a channel by id.
    pub fn channel(&self, id: ChannelId) -> Option<&ChannelSpec> {
        self.channels.get(id as usize)
    }

    /// Iterates over all components.
    pub fn components(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components.iter()
    }

    /// Iterates over all interfaces.
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceSpec> {
        self.interfaces.iter()
    }

    /// Iterates over all channels.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelSpec> {
        self.channels.iter()
    }

    /// Iterates over all host components.
    pub fn hosts(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components.iter().filter(|c| c.class.is_host())
    }

    /// Iterates over all memory device components.
    pub fn mem_devices(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components
            .iter()
            .filter(|c| matches!(c.class, ComponentClass::MemDevice(_)))
    }

    /// Iterates over components matching a class predicate.
    pub fn components_where<'a>(
        &'a self,
        pred: impl Fn(&ComponentClass) -> bool + 'a,
    ) -> impl Iterator<Item = &'a ComponentSpec> {
        self.components.iter().filter(move |c| pred(&c.class))
    }

    /// Iterates over the interfaces owned by a component.
    pub fn interfaces_of(&self, component: ComponentId) -> impl Iterator<Item = &InterfaceSpec> {
        self.interfaces
            .iter()
            .filter(move |i| i.component == component)
    }

    /// Iterates over the interfaces of a component with a given kind.
    pub fn interfaces_of_kind(
        &self,
        component: ComponentId,
        kind: InterfaceKind,
    ) -> impl Iterator<Item = &InterfaceSpec> {
        self.interfaces_of(component).filter(move |i| i.kind == kind)
    }

    /// Returns the channel an interface participates in, if any.
    pub fn channel_of(&self, iface: InterfaceId) -> Option<&ChannelSpec> {
        self.iface_channel
            .get(&iface)
            .and_then(|&c| self.channels.get(c as usize))
    }

    /// Returns the interface on the far side of `iface`'s channel, if any.
    pub fn peer_of(&self, iface: InterfaceId) -> Option<InterfaceId> {
        self.channel_of(iface).and_then(|c| c.peer_of(iface))
    }

    /// Returns the component owning an interface.
    pub fn owner_of(&self, iface: InterfaceId) -> Result<ComponentId, TopologyError> {
        Ok(self.interface(iface)?.component)
    }

    /// Returns all channels with at least one endpoint on `component`.
    pub fn channels_touching(&self, component: ComponentId) -> Vec<&ChannelSpec> {
        self.interfaces_of(component)
            .filter_map(|i| self.channel_of(i.id))
            .collect()
    }

    /// Returns the route table of an interconnect component, if any.
    pub fn route_table(&self, interconnect: ComponentId) -> Option<&RouteTable> {
        self.routes.get(&interconnect)
    }

    /// Resolves an address through an interconnect's route table.
    ///
    /// Pure function of the frozen table; see [`RouteTable::resolve`].
    pub fn resolve(
        &self,
        interconnect: ComponentId,
        addr: Address,
    ) -> Result<(InterfaceId, u64), crate::error::RoutingError> {
        match self.routes.get(&interconnect) {
            Some(table) => table.resolve(addr),
            None => Err(crate::error::RoutingError::Unmapped(addr)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_mem_pair() -> (TopologyBuilder, InterfaceId, InterfaceId) {
        let mut b = TopologyBuilder::new();
        let host = b.add_component("host0", ComponentClass::Host(HostSpec::default()));
        let mem = b.add_component(
            "mem0",
            ComponentClass::MemDevice(MemDeviceSpec::new(0x1000, 0x8000, 0)),
        );
        let host_if = b.add_interface(host, InterfaceKind::MemHost).unwrap();
        let mem_if = b.add_interface(mem, InterfaceKind::MemDevice).unwrap();
        (b, host_if, mem_if)
    }

    #[test]
    fn test_connect_creates_channel() {
        let (mut b, host_if, mem_if) = host_mem_pair();
        let chan = b.connect(host_if, mem_if, 500, 1000).unwrap();

        let topo = b.freeze();
        let spec = topo.channel(chan).unwrap();
        assert_eq!(spec.timing(), (500, 1000));
        assert!(spec.synchronous);
        assert_eq!(topo.peer_of(host_if), Some(mem_if));
        assert_eq!(topo.peer_of(mem_if), Some(host_if));
    }

    #[test]
    fn test_connect_async_clears_sync_mode() {
        let (mut b, host_if, mem_if) = host_mem_pair();
        let chan = b.connect_async(host_if, mem_if, 500, 1000).unwrap();
        let topo = b.freeze();
        assert!(!topo.channel(chan).unwrap().synchronous);
    }

    #[test]
    fn test_double_connect_rejected() {
        let (mut b, host_if, mem_if) = host_mem_pair();
        let extra = b.add_interface(0, InterfaceKind::PcieHost).unwrap();
        b.connect(host_if, mem_if, 500, 500).unwrap();

        let err = b.connect(mem_if, extra, 500, 500).unwrap_err();
        assert_eq!(err, TopologyError::AlreadyConnected(mem_if));
    }

    #[test]
    fn test_self_connect_rejected() {
        let (mut b, host_if, _) = host_mem_pair();
        let err = b.connect(host_if, host_if, 0, 0).unwrap_err();
        assert_eq!(err, TopologyError::SelfConnect(host_if));
    }

    #[test]
    fn test_unknown_interface_rejected() {
        let (mut b, host_if, _) = host_mem_pair();
        let err = b.connect(host_if, 99, 0, 0).unwrap_err();
        assert_eq!(err, TopologyError::UnknownInterface(99));
    }

    #[test]
    fn test_interface_on_unknown_component() {
        let mut b = TopologyBuilder::new();
        let err = b.add_interface(7, InterfaceKind::Eth).unwrap_err();
        assert_eq!(err, TopologyError::UnknownComponent(7));
    }

    #[test]
    fn test_typed_queries() {
        let mut b = TopologyBuilder::new();
        b.add_component("h0", ComponentClass::Host(HostSpec::default()));
        b.add_component("h1", ComponentClass::Host(HostSpec::default()));
        b.add_component("sw", ComponentClass::Switch);
        let nic = b.add_component("nic0", ComponentClass::Nic(NicSpec::default()));
        b.add_interface(nic, InterfaceKind::Eth).unwrap();
        b.add_interface(nic, InterfaceKind::PcieDevice).unwrap();

        let topo = b.freeze();
        assert_eq!(topo.hosts().count(), 2);
        assert_eq!(topo.mem_devices().count(), 0);
        assert_eq!(
            topo.components_where(|c| matches!(c, ComponentClass::Nic(_)))
                .count(),
            1
        );
        assert_eq!(topo.interfaces_of(nic).count(), 2);
        assert_eq!(topo.interfaces_of_kind(nic, InterfaceKind::Eth).count(), 1);
    }

    #[test]
    fn test_channels_touching_component() {
        let mut b = TopologyBuilder::new();
        let host = b.add_component("h", ComponentClass::Host(HostSpec::default()));
        let nic = b.add_component("n", ComponentClass::Nic(NicSpec::default()));
        let sw = b.add_component("s", ComponentClass::Switch);

        let h_pci = b.add_interface(host, InterfaceKind::PcieHost).unwrap();
        let n_pci = b.add_interface(nic, InterfaceKind::PcieDevice).unwrap();
        let n_eth = b.add_interface(nic, InterfaceKind::Eth).unwrap();
        let s_eth = b.add_interface(sw, InterfaceKind::Eth).unwrap();

        b.connect(h_pci, n_pci, 500, 500).unwrap();
        b.connect(n_eth, s_eth, 2_000_000, 500).unwrap();

        let topo = b.freeze();
        assert_eq!(topo.channels_touching(host).len(), 1);
        assert_eq!(topo.channels_touching(nic).len(), 2);
        assert_eq!(topo.channels_touching(sw).len(), 1);
    }

    #[test]
    fn test_disconnected_interface_has_no_peer() {
        let (mut b, host_if, mem_if) = host_mem_pair();
        b.connect(host_if, mem_if, 1, 1).unwrap();
        let lone = b.add_interface(0, InterfaceKind::PcieHost).unwrap();
        let topo = b.freeze();
        assert_eq!(topo.peer_of(lone), None);
        assert!(topo.channel_of(lone).is_none());
    }
}
