//! Core type definitions for the orchestration layer.
//!
//! This module defines the fundamental identifier and time types used
//! throughout the topology, routing, and lifecycle modules.

/// Time quantity in nanoseconds.
///
/// Channel latencies and synchronization intervals are both expressed in
/// nanoseconds. The unsigned representation enforces the non-negativity
/// requirement on timing parameters at the type level.
pub type TimeNs = u64;

/// A guest-visible memory address.
pub type Address = u64;

/// Identifier of an address space (distinct guest physical spaces).
pub type AddressSpaceId = u32;

/// Unique identifier for a component in the topology.
///
/// Components are the nodes of the simulated system graph: hosts, memory
/// devices, NICs, switches, and interconnects.
pub type ComponentId = u64;

/// Unique identifier for an interface.
///
/// Interfaces are typed attachment points on exactly one component. Identity
/// is unique across the whole topology, not per component.
pub type InterfaceId = u64;

/// Unique identifier for a channel between two interfaces.
pub type ChannelId = u64;

/// Unique identifier for a simulator (one external OS process).
pub type SimulatorId = u64;
