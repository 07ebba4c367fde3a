//! Synchronization parameter derivation.
//!
//! Each simulator process runs exactly one event loop and therefore presents
//! exactly one timing contract to the outside world. This module derives that
//! contract from the union of channels incident to any interface of any
//! component the simulator owns: all of them must agree on
//! `(latency, sync_interval)`, and the process runs in lock-step if any one
//! of them does.
//!
//! Mixed-timing channels on one simulator are a documented constraint, not an
//! oversight: rejecting them keeps the per-process event loop simple.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::TimingError;
use crate::topology::Topology;
use crate::types::{ComponentId, TimeNs};

/// The single timing contract applied to every socket of one simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncParams {
    /// One-way propagation delay in nanoseconds.
    pub latency: TimeNs,
    /// Maximum time between mandatory synchronization points, in nanoseconds.
    pub sync_interval: TimeNs,
    /// Whether the process must run in lock-step with its peers.
    pub synchronous: bool,
}

/// Derives the timing contract for a simulator owning `components`.
///
/// Returns `Ok(None)` when no channel touches any owned component: the
/// simulator needs no cross-process timing at all. Otherwise every incident
/// channel must declare the same `(latency, sync_interval)` pair, or the
/// derivation fails with [`TimingError::InconsistentTiming`].
pub fn derive_timing(
    topology: &Topology,
    simulator: &str,
    components: &[ComponentId],
) -> Result<Option<SyncParams>, TimingError> {
    // A channel between two owned components is still collected once.
    let mut seen = BTreeSet::new();
    let mut params: Option<SyncParams> = None;

    for &component in components {
        for channel in topology.channels_touching(component) {
            if !seen.insert(channel.id) {
                continue;
            }
            match &mut params {
                None => {
                    params = Some(SyncParams {
                        latency: channel.latency,
                        sync_interval: channel.sync_interval,
                        synchronous: channel.synchronous,
                    });
                }
                Some(p) => {
                    if (p.latency, p.sync_interval) != channel.timing() {
                        return Err(TimingError::InconsistentTiming {
                            simulator: simulator.to_string(),
                            first_latency: p.latency,
                            first_interval: p.sync_interval,
                            second_latency: channel.latency,
                            second_interval: channel.sync_interval,
                        });
                    }
                    p.synchronous |= channel.synchronous;
                }
            }
        }
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{
        ComponentClass, HostSpec, InterfaceKind, MemDeviceSpec, NicSpec, TopologyBuilder,
    };

    fn builder_with_host() -> (TopologyBuilder, ComponentId) {
        let mut b = TopologyBuilder::new();
        let host = b.add_component("host0", ComponentClass::Host(HostSpec::default()));
        (b, host)
    }

    #[test]
    fn test_no_channels_yields_no_contract() {
        let (b, host) = builder_with_host();
        let topo = b.freeze();
        assert_eq!(derive_timing(&topo, "host0", &[host]).unwrap(), None);
    }

    #[test]
    fn test_uniform_channels_yield_contract() {
        let (mut b, host) = builder_with_host();
        let nic = b.add_component("nic0", ComponentClass::Nic(NicSpec::default()));
        let mem = b.add_component(
            "mem0",
            ComponentClass::MemDevice(MemDeviceSpec::new(0x1000, 0, 0)),
        );

        let h_pci = b.add_interface(host, InterfaceKind::PcieHost).unwrap();
        let n_pci = b.add_interface(nic, InterfaceKind::PcieDevice).unwrap();
        let h_mem = b.add_interface(host, InterfaceKind::MemHost).unwrap();
        let m_mem = b.add_interface(mem, InterfaceKind::MemDevice).unwrap();

        b.connect(h_pci, n_pci, 500, 500).unwrap();
        b.connect(h_mem, m_mem, 500, 500).unwrap();

        let topo = b.freeze();
        let params = derive_timing(&topo, "host0", &[host]).unwrap().unwrap();
        assert_eq!(params.latency, 500);
        assert_eq!(params.sync_interval, 500);
        assert!(params.synchronous);
    }

    #[test]
    fn test_inconsistent_timing_rejected() {
        let (mut b, host) = builder_with_host();
        let nic = b.add_component("nic0", ComponentClass::Nic(NicSpec::default()));
        let mem = b.add_component(
            "mem0",
            ComponentClass::MemDevice(MemDeviceSpec::new(0x1000, 0, 0)),
        );

        let h_pci = b.add_interface(host, InterfaceKind::PcieHost).unwrap();
        let n_pci = b.add_interface(nic, InterfaceKind::PcieDevice).unwrap();
        let h_mem = b.add_interface(host, InterfaceKind::MemHost).unwrap();
        let m_mem = b.add_interface(mem, InterfaceKind::MemDevice).unwrap();

        b.connect(h_pci, n_pci, 500, 500).unwrap();
        b.connect(h_mem, m_mem, 900, 500).unwrap();

        let topo = b.freeze();
        let err = derive_timing(&topo, "host0", &[host]).unwrap_err();
        match err {
            TimingError::InconsistentTiming {
                simulator,
                first_latency,
                second_latency,
                ..
            } => {
                assert_eq!(simulator, "host0");
                assert_eq!(first_latency, 500);
                assert_eq!(second_latency, 900);
            }
        }
    }

    #[test]
    fn test_synchronous_is_or_of_channel_modes() {
        let (mut b, host) = builder_with_host();
        let nic = b.add_component("nic0", ComponentClass::Nic(NicSpec::default()));
        let mem = b.add_component(
            "mem0",
            ComponentClass::MemDevice(MemDeviceSpec::new(0x1000, 0, 0)),
        );

        let h_pci = b.add_interface(host, InterfaceKind::PcieHost).unwrap();
        let n_pci = b.add_interface(nic, InterfaceKind::PcieDevice).unwrap();
        let h_mem = b.add_interface(host, InterfaceKind::MemHost).unwrap();
        let m_mem = b.add_interface(mem, InterfaceKind::MemDevice).unwrap();

        b.connect_async(h_pci, n_pci, 500, 500).unwrap();
        b.connect(h_mem, m_mem, 500, 500).unwrap();

        let topo = b.freeze();
        let params = derive_timing(&topo, "host0", &[host]).unwrap().unwrap();
        assert!(params.synchronous);

        // All channels free-running: the contract drops lock-step.
        let (mut b2, host2) = builder_with_host();
        let mem2 = b2.add_component(
            "mem0",
            ComponentClass::MemDevice(MemDeviceSpec::new(0x1000, 0, 0)),
        );
        let h_mem2 = b2.add_interface(host2, InterfaceKind::MemHost).unwrap();
        let m_mem2 = b2.add_interface(mem2, InterfaceKind::MemDevice).unwrap();
        b2.connect_async(h_mem2, m_mem2, 500, 500).unwrap();
        let topo2 = b2.freeze();
        let params = derive_timing(&topo2, "host0", &[host2]).unwrap().unwrap();
        assert!(!params.synchronous);
    }

    #[test]
    fn test_channel_between_owned_components_counted_once() {
        let (mut b, host) = builder_with_host();
        let proxy = b.add_component(
            "proxy",
            ComponentClass::MemDevice(MemDeviceSpec::new(0x1000, 0, 0)),
        );
        let h_mem = b.add_interface(host, InterfaceKind::MemHost).unwrap();
        let p_mem = b.add_interface(proxy, InterfaceKind::MemDevice).unwrap();
        b.connect(h_mem, p_mem, 500, 500).unwrap();

        let topo = b.freeze();
        // Both endpoints owned by the same simulator: the single channel still
        // produces one (consistent) contract.
        let params = derive_timing(&topo, "host0", &[host, proxy])
            .unwrap()
            .unwrap();
        assert_eq!(params.latency, 500);
    }
}
