//! # Simweave Orchestration Layer
//!
//! An orchestration layer for heterogeneous full-system simulations built
//! from multiple cooperating simulator processes connected by message
//! channels.
//!
//! ## Design Principles
//!
//! - **Graph-Driven**: The system under simulation is described as a topology
//!   graph of components, interfaces and channels, which serves as the
//!   "source of truth" for everything downstream.
//! - **Frozen Topology**: The graph is built once and frozen; socket
//!   assignment, timing derivation and command composition are pure queries
//!   over the frozen snapshot.
//! - **Process Mapping**: Simulators claim components of the graph; each
//!   simulator becomes one external process whose command line is composed
//!   from the graph, the derived timing contract and the staged resources.
//! - **Unified Timing**: Each channel carries a latency and synchronization
//!   interval in nanoseconds; a simulator's processes must agree on a single
//!   timing contract across all their channels.
//!
//! ## Features
//!
//! - `parallel` - Enable parallel resource preparation using rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use simweave::{ComponentClass, HostSpec, MemDeviceSpec, TopologyBuilder};
//! use simweave::{Env, Instantiation, Simulation, SimulatorKind};
//!
//! // Describe the system: one host talking to one memory device through an
//! // address-routing interconnect.
//! let mut builder = TopologyBuilder::new();
//! let host = builder.add_component("host0", ComponentClass::Host(HostSpec::default()));
//! let ic = builder.add_component("ic0", ComponentClass::Interconnect);
//! let mem = builder.add_component(
//!     "mem0",
//!     ComponentClass::MemDevice(MemDeviceSpec::new(0x40_0000, 0x3FC_0000, 0)),
//! );
//!
//! use simweave::InterfaceKind;
//! let mem_if = builder.add_interface(mem, InterfaceKind::MemDevice).unwrap();
//! let port = builder.connect_device(ic, mem_if, 500, 500).unwrap();
//! let host_if = builder.add_interface(host, InterfaceKind::MemHost).unwrap();
//! builder.connect_host(ic, host_if, 500, 500).unwrap();
//! builder.add_route(ic, port, 0x3FC_0000, 0x40_0000, 0).unwrap();
//!
//! // Map components onto simulator processes.
//! let mut simulation = Simulation::new("memtest", builder.freeze());
//! simulation.add_simulator("host_sim", SimulatorKind::host(), vec![host]);
//! simulation.add_simulator("ic_sim", SimulatorKind::interconnect(), vec![ic]);
//! simulation.add_simulator("mem_sim", SimulatorKind::mem(), vec![mem]);
//!
//! // Bind the run to an environment and assign sockets.
//! let mut inst = Instantiation::new(simulation, Env::new("/tmp/memtest"));
//! inst.assign_sockets().unwrap();
//! let cmd = inst.compose_command(0).unwrap();
//! assert!(cmd.contains("--simbricks-mem="));
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use simweave::config::SystemConfig;
//! use simweave::registry::create_default_registry;
//!
//! let config = SystemConfig::from_yaml_file("simulation.yaml")?;
//! let inst = config.build(&create_default_registry())?;
//! ```

pub mod types;
pub mod error;
pub mod topology;
pub mod interconnect;
pub mod sync;
pub mod disk;
pub mod socket;
pub mod simulator;
pub mod instantiation;
pub mod prepare;
pub mod config;
pub mod registry;

// Re-export commonly used types
pub use types::{Address, AddressSpaceId, ChannelId, ComponentId, InterfaceId, SimulatorId, TimeNs};
pub use error::{
    CardinalityError, LifecycleError, OrchestrationError, OrchestrationResult, ResourceError,
    RoutingError, TimingError, TopologyError,
};
pub use topology::{
    ChannelSpec, ComponentClass, ComponentSpec, HostSpec, InterfaceKind, InterfaceSpec,
    MemDeviceSpec, NicSpec, Topology, TopologyBuilder,
};
pub use interconnect::{Route, RouteTable, MAX_PORTS};
pub use sync::{derive_timing, SyncParams};
pub use disk::{
    CommandExecutor, DiskImage, DiskLibrary, ImageFormat, PrebuiltDiskImage, ProcessExecutor,
    RecordingExecutor,
};
pub use socket::{assign_sockets, SockRole, Socket, SocketMap};
pub use simulator::{
    HostSimSpec, LifecycleState, Simulation, Simulator, SimulatorKind,
};
pub use instantiation::{ArtifactCache, Env, Fragment, Instantiation};
pub use prepare::prepare_all;
pub use config::{ConfigError, SystemConfig, SystemConfigBuilder};
pub use registry::{create_default_registry, SimulatorRegistry};

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging.
///
/// # Example
///
/// ```rust,ignore
/// simweave::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
