//! Error taxonomy for the orchestration core.
//!
//! Every error here is fatal to the run that triggers it: the core never
//! retries, and a partially-prepared run is never launched. Errors carry the
//! simulator name or resource path needed to act on them.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Address, ChannelId, ComponentId, InterfaceId, TimeNs};

/// Errors raised while building or querying the component/interface/channel
/// graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("interface {0} is already connected to a channel")]
    AlreadyConnected(InterfaceId),

    #[error("cannot connect interface {0} to itself")]
    SelfConnect(InterfaceId),

    #[error("unknown component id {0}")]
    UnknownComponent(ComponentId),

    #[error("unknown interface id {0}")]
    UnknownInterface(InterfaceId),

    #[error("component {0} is not an interconnect")]
    NotAnInterconnect(ComponentId),

    #[error("interconnect {component} exceeds its port limit of {limit}")]
    CapacityExceeded {
        component: ComponentId,
        limit: usize,
    },

    #[error("interconnect {0} cannot accept new ports after routing has begun")]
    WiredAfterRouting(ComponentId),

    #[error("channel {0} has no endpoint able to listen (both sides connect-only)")]
    UnsatisfiableSocketRoles(ChannelId),
}

/// Errors raised by the address-routing interconnect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error(
        "route [{new_base:#x}, {new_end:#x}) overlaps existing route [{old_base:#x}, {old_end:#x})"
    )]
    OverlappingRoute {
        new_base: Address,
        new_end: Address,
        old_base: Address,
        old_end: Address,
    },

    #[error("address {0:#x} is not covered by any route")]
    Unmapped(Address),

    #[error("route target interface {0} was not wired through this interconnect")]
    UnknownInterface(InterfaceId),

    #[error("route at {0:#x} has zero length")]
    EmptyRoute(Address),

    #[error("route at {base:#x} with length {len:#x} wraps past the end of the address space")]
    WrapAround { base: Address, len: u64 },
}

/// Errors raised while deriving a simulator's timing contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimingError {
    #[error(
        "simulator '{simulator}' has channels with conflicting timing: \
         (latency={first_latency}ns, sync_interval={first_interval}ns) vs \
         (latency={second_latency}ns, sync_interval={second_interval}ns)"
    )]
    InconsistentTiming {
        simulator: String,
        first_latency: TimeNs,
        first_interval: TimeNs,
        second_latency: TimeNs,
        second_interval: TimeNs,
    },
}

/// Errors raised by per-simulator component-count constraints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardinalityError {
    #[error("simulator '{simulator}' owns {count} host components, only 1 is supported")]
    MultipleHostsUnsupported { simulator: String, count: usize },
}

/// Errors raised while staging resources for a simulator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("simulator '{simulator}': staged artifact {} does not exist", .path.display())]
    ResourceMissing { simulator: String, path: PathBuf },

    #[error("disk image '{image}' has no format accepted by simulator '{simulator}'")]
    UnsupportedFormat { simulator: String, image: String },

    #[error("simulator '{simulator}': staging command failed: {message}")]
    StagingFailed { simulator: String, message: String },
}

/// Errors raised by the simulator lifecycle state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("simulator '{simulator}': invalid transition {from} -> {to}")]
    InvalidTransition {
        simulator: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("simulator '{simulator}' must be prepared before composing its command")]
    NotPrepared { simulator: String },

    #[error("unknown simulator id {0}")]
    UnknownSimulator(crate::types::SimulatorId),
}

/// Umbrella error for orchestration operations spanning several subsystems.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Timing(#[from] TimingError),

    #[error(transparent)]
    Cardinality(#[from] CardinalityError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for orchestration operations.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = ResourceError::ResourceMissing {
            simulator: "host0".to_string(),
            path: PathBuf::from("/tmp/hdcopy.1.0"),
        };
        let msg = err.to_string();
        assert!(msg.contains("host0"));
        assert!(msg.contains("hdcopy.1.0"));

        let err = RoutingError::OverlappingRoute {
            new_base: 0x800,
            new_end: 0x1800,
            old_base: 0x1000,
            old_end: 0x2000,
        };
        assert!(err.to_string().contains("0x800"));
    }

    #[test]
    fn test_umbrella_conversion() {
        fn fails() -> OrchestrationResult<()> {
            Err(RoutingError::Unmapped(0x42))?
        }
        match fails() {
            Err(OrchestrationError::Routing(RoutingError::Unmapped(addr))) => {
                assert_eq!(addr, 0x42)
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
