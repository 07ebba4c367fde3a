//! Address-routing interconnect: two-phase wiring and the route table.
//!
//! An interconnect is a component that forwards addressed accesses from its
//! host-facing ports to its device-facing ports according to a route table
//! keyed by address range.
//!
//! Wiring follows a two-phase protocol: ports are attached first
//! ([`TopologyBuilder::connect_device`] / [`TopologyBuilder::connect_host`]),
//! routes are added second ([`TopologyBuilder::add_route`]). The split is
//! deliberate: the topology can be wired before guest address maps are known.
//! Once routing has begun, attaching further ports is an error rather than a
//! silent reordering.
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
//!     ComponentClass::MemDevice(MemDeviceSpec::new(0x400000, 0x3FC0000, 0)),
//! );
//! let icx = b.add_component("icx", ComponentClass::Interconnect);
//!
//! let host_if = b.add_interface(host, InterfaceKind::MemHost).unwrap();
//! let mem_if = b.add_interface(mem, InterfaceKind::MemDevice).unwrap();
//!
//! let upstream = b.connect_device(icx, mem_if, 500, 500).unwrap();
//! b.connect_host(icx, host_if, 500, 500).unwrap();
//! b.add_route(icx, upstream, 0x3FC0000, 0x400000, 0x3FC0000).unwrap();
//!
//! let topo = b.freeze();
//! let (target, offset) = topo.resolve(icx, 0x3FC0000).unwrap();
//! assert_eq!(target, upstream);
//! assert_eq!(offset, 0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{OrchestrationError, RoutingError, TopologyError};
use crate::topology::{InterfaceKind, TopologyBuilder};
use crate::types::{Address, ChannelId, ComponentId, InterfaceId, TimeNs};

/// Maximum number of ports one interconnect may carry.
pub const MAX_PORTS: usize = 64;

/// One entry of an interconnect's route table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Port the matched access is forwarded to.
    pub target: InterfaceId,
    /// Base of the covered virtual address range.
    pub vaddr: Address,
    /// Length of the covered range in bytes.
    pub len: u64,
    /// Physical base address on the target side.
    pub paddr: Address,
}

impl Route {
    /// End of the covered range, exclusive.
    pub fn end(&self) -> Address {
        self.vaddr + self.len
    }

    /// Returns true if `addr` falls inside this route's range.
    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.vaddr && addr < self.end()
    }

    /// Translates `addr` to the physical address on the target side.
    pub fn translate(&self, addr: Address) -> Address {
        self.paddr + (addr - self.vaddr)
    }
}

/// An interconnect's route table, kept sorted by virtual base address.
///
/// Lookups are pure functions of the table contents: no I/O, deterministic,
/// and independent of the order routes were inserted in.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a route, keeping the table sorted.
    ///
    /// Fails with [`RoutingError::OverlappingRoute`] if the new range
    /// intersects any existing route, [`RoutingError::EmptyRoute`] for a
    /// zero-length range and [`RoutingError::WrapAround`] for a range
    /// extending past the top of the address space.
    pub fn insert(&mut self, route: Route) -> Result<(), RoutingError> {
        if route.len == 0 {
            return Err(RoutingError::EmptyRoute(route.vaddr));
        }
        // Stored routes always satisfy this, so `end()` cannot wrap later.
        let end = route
            .vaddr
            .checked_add(route.len)
            .ok_or(RoutingError::WrapAround {
                base: route.vaddr,
                len: route.len,
            })?;
        // Position of the first route with a base at or above the new one.
        let pos = self.routes.partition_point(|r| r.vaddr < route.vaddr);
        if let Some(next) = self.routes.get(pos) {
            if end > next.vaddr {
                return Err(RoutingError::OverlappingRoute {
                    new_base: route.vaddr,
                    new_end: end,
                    old_base: next.vaddr,
                    old_end: next.end(),
                });
            }
        }
        if pos > 0 {
            let prev = &self.routes[pos - 1];
            if prev.end() > route.vaddr {
                return Err(RoutingError::OverlappingRoute {
                    new_base: route.vaddr,
                    new_end: route.end(),
                    old_base: prev.vaddr,
                    old_end: prev.end(),
                });
            }
        }
        self.routes.insert(pos, route);
        Ok(())
    }

    /// Resolves an address to `(target interface, offset into the route)`.
    ///
    /// Fails with [`RoutingError::Unmapped`] if no route covers `addr`.
    pub fn resolve(&self, addr: Address) -> Result<(InterfaceId, u64), RoutingError> {
        let pos = self.routes.partition_point(|r| r.vaddr <= addr);
        if pos == 0 {
            return Err(RoutingError::Unmapped(addr));
        }
        let route = &self.routes[pos - 1];
        if !route.contains(addr) {
            return Err(RoutingError::Unmapped(addr));
        }
        Ok((route.target, addr - route.vaddr))
    }

    /// Returns the route covering `addr`, if any.
    pub fn route_for(&self, addr: Address) -> Option<&Route> {
        match self.routes.partition_point(|r| r.vaddr <= addr) {
            0 => None,
            pos => Some(&self.routes[pos - 1]).filter(|r| r.contains(addr)),
        }
    }

    /// Returns all routes in ascending virtual-base order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Build-time state of one interconnect: attached ports plus the route table.
///
/// `routing_started` records the phase transition from wiring to routing.
#[derive(Clone, Debug, Default)]
pub struct InterconnectState {
    pub(crate) ports: Vec<InterfaceId>,
    pub(crate) table: RouteTable,
    pub(crate) routing_started: bool,
}

impl InterconnectState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_table(self) -> RouteTable {
        self.table
    }
}

/// The upstream-facing counterpart of a port kind: the interconnect presents
/// a host to devices and a device to hosts.
fn mirror_kind(kind: InterfaceKind) -> InterfaceKind {
    match kind {
        InterfaceKind::MemDevice => InterfaceKind::MemHost,
        InterfaceKind::MemHost => InterfaceKind::MemDevice,
        InterfaceKind::PcieDevice => InterfaceKind::PcieHost,
        InterfaceKind::PcieHost => InterfaceKind::PcieDevice,
        InterfaceKind::Eth => InterfaceKind::Eth,
    }
}

impl TopologyBuilder {
    fn attach_port(
        &mut self,
        interconnect: ComponentId,
        remote_if: InterfaceId,
        latency: TimeNs,
        sync_interval: TimeNs,
    ) -> Result<(InterfaceId, ChannelId), TopologyError> {
        let state = self
            .interconnects
            .get(&interconnect)
            .ok_or(TopologyError::NotAnInterconnect(interconnect))?;
        if state.routing_started {
            return Err(TopologyError::WiredAfterRouting(interconnect));
        }
        if state.ports.len() >= MAX_PORTS {
            return Err(TopologyError::CapacityExceeded {
                component: interconnect,
                limit: MAX_PORTS,
            });
        }
        let remote_kind = self
            .interfaces
            .get(remote_if as usize)
            .ok_or(TopologyError::UnknownInterface(remote_if))?
            .kind;

        let port = self.add_interface(interconnect, mirror_kind(remote_kind))?;
        let channel = self.connect(remote_if, port, latency, sync_interval)?;
        self.interconnects
            .get_mut(&interconnect)
            .ok_or(TopologyError::NotAnInterconnect(interconnect))?
            .ports
            .push(port);
        Ok((port, channel))
    }

    /// Attaches a device-side interface to an interconnect.
    ///
    /// Allocates the host-facing port representing the device's upstream view,
    /// connects the two with a channel, and returns the new port (valid as a
    /// route target). Fails with [`TopologyError::CapacityExceeded`] once
    /// [`MAX_PORTS`] ports exist and with
    /// [`TopologyError::WiredAfterRouting`] after the first route.
    pub fn connect_device(
        &mut self,
        interconnect: ComponentId,
        device_if: InterfaceId,
        latency: TimeNs,
        sync_interval: TimeNs,
    ) -> Result<InterfaceId, TopologyError> {
        let (port, _) = self.attach_port(interconnect, device_if, latency, sync_interval)?;
        Ok(port)
    }

    /// Attaches something upstream of the interconnect (a CPU or a proxy).
    ///
    /// Symmetric to [`TopologyBuilder::connect_device`]: allocates the
    /// device-facing port the host talks to and returns it.
    pub fn connect_host(
        &mut self,
        interconnect: ComponentId,
        host_if: InterfaceId,
        latency: TimeNs,
        sync_interval: TimeNs,
    ) -> Result<InterfaceId, TopologyError> {
        let (port, _) = self.attach_port(interconnect, host_if, latency, sync_interval)?;
        Ok(port)
    }

    /// Adds a route forwarding `[vaddr, vaddr+len)` to a previously attached
    /// port.
    ///
    /// The target must have been produced by
    /// [`TopologyBuilder::connect_device`] or
    /// [`TopologyBuilder::connect_host`]; routes must not overlap. The first
    /// call moves the interconnect from the wiring phase to the routing
    /// phase.
    pub fn add_route(
        &mut self,
        interconnect: ComponentId,
        target: InterfaceId,
        vaddr: Address,
        len: u64,
        paddr: Address,
    ) -> Result<(), OrchestrationError> {
        let state = self
            .interconnects
            .get_mut(&interconnect)
            .ok_or(TopologyError::NotAnInterconnect(interconnect))?;
        if !state.ports.contains(&target) {
            return Err(RoutingError::UnknownInterface(target).into());
        }
        state.routing_started = true;
        state.table.insert(Route {
            target,
            vaddr,
            len,
            paddr,
        })?;
        Ok(())
    }
}
