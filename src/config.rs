//! Configuration system for declarative simulation setup.
//!
//! This module provides YAML/JSON configuration file support for defining a
//! whole simulation: components, channels, interconnect wiring, routes,
//! simulators and fragments.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! system:
//!   name: memtest
//!   workdir: /tmp/memtest
//!   repo: /opt/sims
//!
//! components:
//!   - name: host0
//!     type: host
//!     memory_mb: 2048
//!     disks: [base]
//!   - name: ic0
//!     type: interconnect
//!   - name: mem0
//!     type: mem_device
//!     size: 4194304
//!     base_addr: 66846720
//!     as_id: 0
//!
//! interconnects:
//!   - component: ic0
//!     latency: 500
//!     sync_interval: 500
//!     devices:
//!       - component: mem0
//!         interface: mem_device
//!     hosts:
//!       - component: host0
//!         interface: mem_host
//!     routes:
//!       - device: mem0
//!         vaddr: 66846720
//!         len: 4194304
//!         paddr: 0
//!
//! simulators:
//!   - name: host_sim
//!     type: host
//!     components: [host0]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::error::OrchestrationError;
use crate::instantiation::{Env, Fragment, Instantiation};
use crate::registry::SimulatorRegistry;
use crate::simulator::Simulation;
use crate::topology::{
    ComponentClass, HostSpec, InterfaceKind, MemDeviceSpec, NicSpec, TopologyBuilder,
};
use crate::types::{ComponentId, InterfaceId, TimeNs};

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    Build(#[from] OrchestrationError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Global run parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemParams {
    /// Simulation name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Working directory of the run.
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Base of the simulator installation tree. Defaults to the workdir.
    #[serde(default)]
    pub repo: Option<String>,

    /// Whether the run boots the system to produce a checkpoint.
    #[serde(default)]
    pub create_checkpoint: bool,

    /// Whether the run restores from a previously taken checkpoint.
    #[serde(default)]
    pub restore_checkpoint: bool,
}

fn default_name() -> String {
    "simulation".to_string()
}

fn default_workdir() -> String {
    ".".to_string()
}

fn default_latency() -> TimeNs {
    500
}

impl Default for SystemParams {
    fn default() -> Self {
        Self {
            name: default_name(),
            workdir: default_workdir(),
            repo: None,
            create_checkpoint: false,
            restore_checkpoint: false,
        }
    }
}

/// Configuration for a single component.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Unique component name.
    pub name: String,

    /// Component type: host, mem_device, nic, switch or interconnect.
    #[serde(rename = "type")]
    pub component_type: String,

    /// Guest memory size in MB (host).
    #[serde(default)]
    pub memory_mb: Option<u64>,

    /// Guest core count (host).
    #[serde(default)]
    pub cores: Option<u32>,

    /// Guest CPU frequency (host).
    #[serde(default)]
    pub cpu_freq: Option<String>,

    /// Extra kernel command line (host).
    #[serde(default)]
    pub kcmd_append: Option<String>,

    /// Disk image names in drive order (host).
    #[serde(default)]
    pub disks: Vec<String>,

    /// Backed range size in bytes (mem_device).
    #[serde(default)]
    pub size: Option<u64>,

    /// Guest-visible base address (mem_device).
    #[serde(default)]
    pub base_addr: Option<u64>,

    /// Address space identifier (mem_device).
    #[serde(default)]
    pub as_id: Option<u32>,

    /// IPv4 address (nic).
    #[serde(default)]
    pub ipv4: Option<String>,
}

impl ComponentConfig {
    /// Validates the component configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        match self.component_type.as_str() {
            "host" | "nic" | "switch" | "interconnect" => Ok(()),
            "mem_device" => {
                if self.size.is_none() || self.base_addr.is_none() {
                    return Err(ConfigError::Validation(format!(
                        "mem_device '{}' requires size and base_addr",
                        self.name
                    )));
                }
                Ok(())
            }
            other => Err(ConfigError::Validation(format!(
                "Component '{}' has unknown type: {}",
                self.name, other
            ))),
        }
    }

    fn class(&self) -> ConfigResult<ComponentClass> {
        Ok(match self.component_type.as_str() {
            "host" => {
                let mut spec = HostSpec::default();
                if let Some(mb) = self.memory_mb {
                    spec.memory_mb = mb;
                }
                if let Some(cores) = self.cores {
                    spec.cores = cores;
                }
                if let Some(freq) = &self.cpu_freq {
                    spec.cpu_freq = freq.clone();
                }
                spec.kcmd_append = self.kcmd_append.clone();
                spec.disks = self.disks.clone();
                ComponentClass::Host(spec)
            }
            "mem_device" => {
                let (Some(size), Some(base_addr)) = (self.size, self.base_addr) else {
                    return Err(ConfigError::Validation(format!(
                        "mem_device '{}' requires size and base_addr",
                        self.name
                    )));
                };
                ComponentClass::MemDevice(MemDeviceSpec::new(
                    size,
                    base_addr,
                    self.as_id.unwrap_or(0),
                ))
            }
            "nic" => ComponentClass::Nic(NicSpec {
                ipv4: self.ipv4.clone(),
            }),
            "switch" => ComponentClass::Switch,
            "interconnect" => ComponentClass::Interconnect,
            other => {
                return Err(ConfigError::Validation(format!(
                    "Component '{}' has unknown type: {}",
                    self.name, other
                )))
            }
        })
    }
}

/// One endpoint of a channel: a component and the interface kind to create
/// on it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Component name.
    pub component: String,

    /// Interface kind created on the component.
    pub interface: InterfaceKind,
}

/// Configuration for a direct channel between two components.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// One endpoint.
    pub a: EndpointConfig,

    /// The other endpoint.
    pub b: EndpointConfig,

    /// One-way latency in nanoseconds.
    #[serde(default = "default_latency")]
    pub latency: TimeNs,

    /// Synchronization interval in nanoseconds. Defaults to the latency.
    #[serde(default)]
    pub sync_interval: Option<TimeNs>,

    /// Whether the channel runs in lock-step.
    #[serde(default = "default_true")]
    pub synchronous: bool,
}

fn default_true() -> bool {
    true
}

/// One device or host attachment to an interconnect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Attached component name.
    pub component: String,

    /// Interface kind created on the attached component.
    pub interface: InterfaceKind,
}

/// One route entry of an interconnect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Name of the attached device the route forwards to.
    pub device: String,

    /// Base of the covered virtual address range.
    pub vaddr: u64,

    /// Length of the covered range in bytes.
    pub len: u64,

    /// Physical base address on the device side.
    pub paddr: u64,
}

/// Configuration for an interconnect: its attachments and route table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterconnectConfig {
    /// Interconnect component name.
    pub component: String,

    /// One-way latency of every attachment, in nanoseconds.
    #[serde(default = "default_latency")]
    pub latency: TimeNs,

    /// Synchronization interval of every attachment. Defaults to the latency.
    #[serde(default)]
    pub sync_interval: Option<TimeNs>,

    /// Device-side attachments, wired before routing starts.
    #[serde(default)]
    pub devices: Vec<AttachmentConfig>,

    /// Host-side attachments.
    #[serde(default)]
    pub hosts: Vec<AttachmentConfig>,

    /// Route table entries.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Configuration for a simulator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Unique simulator name.
    pub name: String,

    /// Registered simulator type name.
    #[serde(rename = "type")]
    pub simulator_type: String,

    /// Custom attributes passed to the simulator factory.
    #[serde(default)]
    pub attrs: HashMap<String, String>,

    /// Names of the components this simulator is responsible for.
    #[serde(default)]
    pub components: Vec<String>,
}

/// Configuration for a deployable fragment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FragmentConfig {
    /// Unique fragment name.
    pub name: String,

    /// Names of the simulators grouped into this fragment.
    #[serde(default)]
    pub simulators: Vec<String>,
}

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Global run parameters.
    #[serde(default)]
    pub system: SystemParams,

    /// Component definitions.
    #[serde(default)]
    pub components: Vec<ComponentConfig>,

    /// Direct channel definitions.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,

    /// Interconnect wiring and routes.
    #[serde(default)]
    pub interconnects: Vec<InterconnectConfig>,

    /// Simulator definitions.
    #[serde(default)]
    pub simulators: Vec<SimulatorConfig>,

    /// Fragment definitions.
    #[serde(default)]
    pub fragments: Vec<FragmentConfig>,
}

impl SystemConfig {
    /// Creates a new empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: SystemConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SystemConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut component_names = std::collections::HashSet::new();
        for comp in &self.components {
            comp.validate()?;
            if !component_names.insert(comp.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate component name: {}",
                    comp.name
                )));
            }
        }

        for ch in &self.channels {
            for endpoint in [&ch.a, &ch.b] {
                if !component_names.contains(endpoint.component.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Channel references non-existent component: {}",
                        endpoint.component
                    )));
                }
            }
        }

        for ic in &self.interconnects {
            if !component_names.contains(ic.component.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Interconnect config references non-existent component: {}",
                    ic.component
                )));
            }
            let device_names: std::collections::HashSet<&str> =
                ic.devices.iter().map(|d| d.component.as_str()).collect();
            for attachment in ic.devices.iter().chain(&ic.hosts) {
                if !component_names.contains(attachment.component.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Interconnect '{}' attaches non-existent component: {}",
                        ic.component, attachment.component
                    )));
                }
            }
            for route in &ic.routes {
                if !device_names.contains(route.device.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Interconnect '{}' routes to unattached device: {}",
                        ic.component, route.device
                    )));
                }
            }
        }

        let mut simulator_names = std::collections::HashSet::new();
        let mut placed = std::collections::HashSet::new();
        for sim in &self.simulators {
            if !simulator_names.insert(sim.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate simulator name: {}",
                    sim.name
                )));
            }
            for comp in &sim.components {
                if !component_names.contains(comp.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Simulator '{}' references non-existent component: {}",
                        sim.name, comp
                    )));
                }
                if !placed.insert(comp.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Component '{comp}' is claimed by more than one simulator"
                    )));
                }
            }
        }

        let mut grouped = std::collections::HashSet::new();
        for frag in &self.fragments {
            for sim in &frag.simulators {
                if !simulator_names.contains(sim.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Fragment '{}' references non-existent simulator: {}",
                        frag.name, sim
                    )));
                }
                if !grouped.insert(sim.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Simulator '{sim}' is grouped into more than one fragment"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the number of components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Returns the number of simulators.
    pub fn simulator_count(&self) -> usize {
        self.simulators.len()
    }

    /// Finds a component configuration by name.
    pub fn find_component(&self, name: &str) -> Option<&ComponentConfig> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Builds a ready-to-prepare instantiation from this configuration.
    ///
    /// Components and channels become a frozen topology, simulators are
    /// created through the registry, and sockets are assigned. Interconnect
    /// attachments are wired before any route is added, so the two-phase
    /// wiring rule holds by construction.
    pub fn build(&self, registry: &SimulatorRegistry) -> ConfigResult<Instantiation> {
        self.validate()?;

        let mut builder = TopologyBuilder::new();
        let mut components: HashMap<&str, ComponentId> = HashMap::new();
        for comp in &self.components {
            let id = builder.add_component(comp.name.clone(), comp.class()?);
            components.insert(comp.name.as_str(), id);
        }

        for ch in &self.channels {
            let a = self.make_interface(&mut builder, &components, &ch.a)?;
            let b = self.make_interface(&mut builder, &components, &ch.b)?;
            let sync_interval = ch.sync_interval.unwrap_or(ch.latency);
            if ch.synchronous {
                builder
                    .connect(a, b, ch.latency, sync_interval)
                    .map_err(OrchestrationError::from)?;
            } else {
                builder
                    .connect_async(a, b, ch.latency, sync_interval)
                    .map_err(OrchestrationError::from)?;
            }
        }

        for ic in &self.interconnects {
            let interconnect = components[ic.component.as_str()];
            let sync_interval = ic.sync_interval.unwrap_or(ic.latency);
            let mut device_ports: HashMap<&str, InterfaceId> = HashMap::new();
            for dev in &ic.devices {
                let device_if = builder
                    .add_interface(components[dev.component.as_str()], dev.interface)
                    .map_err(OrchestrationError::from)?;
                let port = builder
                    .connect_device(interconnect, device_if, ic.latency, sync_interval)
                    .map_err(OrchestrationError::from)?;
                device_ports.insert(dev.component.as_str(), port);
            }
            for host in &ic.hosts {
                let host_if = builder
                    .add_interface(components[host.component.as_str()], host.interface)
                    .map_err(OrchestrationError::from)?;
                builder
                    .connect_host(interconnect, host_if, ic.latency, sync_interval)
                    .map_err(OrchestrationError::from)?;
            }
            for route in &ic.routes {
                let port = device_ports[route.device.as_str()];
                builder.add_route(interconnect, port, route.vaddr, route.len, route.paddr)?;
            }
        }

        let mut simulation = Simulation::new(self.system.name.clone(), builder.freeze());
        for sim in &self.simulators {
            let kind = registry.create(&sim.simulator_type, &sim.attrs).ok_or_else(|| {
                ConfigError::Validation(format!(
                    "Simulator '{}' has unregistered type: {}",
                    sim.name, sim.simulator_type
                ))
            })?;
            let owned = sim
                .components
                .iter()
                .map(|name| components[name.as_str()])
                .collect();
            simulation.add_simulator(sim.name.clone(), kind, owned);
        }

        let mut env = Env::new(&self.system.workdir);
        if let Some(repo) = &self.system.repo {
            env = env.with_repo(repo);
        }

        let mut instantiation = Instantiation::new(simulation, env);
        instantiation.create_checkpoint = self.system.create_checkpoint;
        instantiation.restore_checkpoint = self.system.restore_checkpoint;
        for frag in &self.fragments {
            let mut fragment = Fragment::new(frag.name.clone());
            for name in &frag.simulators {
                if let Some(sim) = instantiation.simulation.find_simulator(name) {
                    fragment.add_simulators([sim.id]);
                }
            }
            instantiation.add_fragment(fragment);
        }
        instantiation.assign_sockets()?;
        Ok(instantiation)
    }

    fn make_interface(
        &self,
        builder: &mut TopologyBuilder,
        components: &HashMap<&str, ComponentId>,
        endpoint: &EndpointConfig,
    ) -> ConfigResult<InterfaceId> {
        builder
            .add_interface(components[endpoint.component.as_str()], endpoint.interface)
            .map_err(|e| ConfigError::Build(e.into()))
    }
}

/// Builder for creating a SystemConfig programmatically.
#[derive(Default)]
pub struct SystemConfigBuilder {
    config: SystemConfig,
}

impl SystemConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the simulation name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.system.name = name.into();
        self
    }

    /// Sets the working directory.
    pub fn workdir(mut self, dir: impl Into<String>) -> Self {
        self.config.system.workdir = dir.into();
        self
    }

    /// Sets the simulator installation tree.
    pub fn repo(mut self, repo: impl Into<String>) -> Self {
        self.config.system.repo = Some(repo.into());
        self
    }

    /// Adds a component configuration.
    pub fn add_component(mut self, component: ComponentConfig) -> Self {
        self.config.components.push(component);
        self
    }

    /// Adds a channel configuration.
    pub fn add_channel(mut self, channel: ChannelConfig) -> Self {
        self.config.channels.push(channel);
        self
    }

    /// Adds an interconnect configuration.
    pub fn add_interconnect(mut self, interconnect: InterconnectConfig) -> Self {
        self.config.interconnects.push(interconnect);
        self
    }

    /// Adds a simulator configuration.
    pub fn add_simulator(
        mut self,
        name: impl Into<String>,
        simulator_type: impl Into<String>,
        components: Vec<String>,
    ) -> Self {
        self.config.simulators.push(SimulatorConfig {
            name: name.into(),
            simulator_type: simulator_type.into(),
            attrs: HashMap::new(),
            components,
        });
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<SystemConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::create_default_registry;

    const MEMTEST_YAML: &str = r#"
system:
  name: memtest
  workdir: /tmp/memtest

components:
  - name: host0
    type: host
    memory_mb: 2048
  - name: ic0
    type: interconnect
  - name: mem0
    type: mem_device
    size: 4194304
    base_addr: 66846720
    as_id: 0

interconnects:
  - component: ic0
    latency: 500
    devices:
      - component: mem0
        interface: mem_device
    hosts:
      - component: host0
        interface: mem_host
    routes:
      - device: mem0
        vaddr: 66846720
        len: 4194304
        paddr: 0

simulators:
  - name: host_sim
    type: host
    components: [host0]
  - name: ic_sim
    type: interconnect
    components: [ic0]
  - name: mem_sim
    type: mem
    components: [mem0]
"#;

    #[test]
    fn test_default_config() {
        let config = SystemConfig::new();
        assert_eq!(config.system.name, "simulation");
        assert!(config.components.is_empty());
    }

    #[test]
    fn test_yaml_parsing() {
        let config = SystemConfig::from_yaml(MEMTEST_YAML).unwrap();
        assert_eq!(config.system.name, "memtest");
        assert_eq!(config.component_count(), 3);
        assert_eq!(config.simulator_count(), 3);
        assert_eq!(config.interconnects[0].routes.len(), 1);
    }

    #[test]
    fn test_json_parsing() {
        let json = r#"{
            "system": {"name": "t"},
            "components": [
                {"name": "sw0", "type": "switch"},
                {"name": "nic0", "type": "nic", "ipv4": "10.0.0.1"}
            ],
            "channels": [
                {
                    "a": {"component": "nic0", "interface": "eth"},
                    "b": {"component": "sw0", "interface": "eth"},
                    "latency": 1000
                }
            ]
        }"#;

        let config = SystemConfig::from_json(json).unwrap();
        assert_eq!(config.component_count(), 2);
        assert_eq!(config.channels[0].latency, 1000);
        assert!(config.channels[0].synchronous);
    }

    #[test]
    fn test_validation_duplicate_component() {
        let yaml = r#"
components:
  - name: a
    type: switch
  - name: a
    type: switch
"#;
        assert!(SystemConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validation_mem_device_needs_range() {
        let yaml = r#"
components:
  - name: m
    type: mem_device
"#;
        assert!(SystemConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validation_component_claimed_twice() {
        let yaml = r#"
components:
  - name: m
    type: switch
simulators:
  - name: s1
    type: net
    components: [m]
  - name: s2
    type: net
    components: [m]
"#;
        assert!(SystemConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validation_route_to_unattached_device() {
        let yaml = r#"
components:
  - name: ic0
    type: interconnect
  - name: m
    type: mem_device
    size: 4096
    base_addr: 0
interconnects:
  - component: ic0
    routes:
      - device: m
        vaddr: 0
        len: 4096
        paddr: 0
"#;
        assert!(SystemConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_build_produces_routed_instantiation() {
        let config = SystemConfig::from_yaml(MEMTEST_YAML).unwrap();
        let registry = create_default_registry();
        let inst = config.build(&registry).unwrap();

        assert_eq!(inst.simulation.simulator_count(), 3);
        let topology = inst.simulation.topology();
        let ic = topology
            .components()
            .find(|c| c.name == "ic0")
            .expect("interconnect present")
            .id;
        let (target, offset) = topology.resolve(ic, 66846720).unwrap();
        assert_eq!(offset, 0);
        assert!(topology.interface(target).is_ok());
        // Sockets were assigned for every cross-simulator channel.
        assert!(!inst.sockets().is_empty());
    }

    #[test]
    fn test_builder() {
        let config = SystemConfigBuilder::new()
            .name("t")
            .workdir("/tmp/t")
            .add_component(ComponentConfig {
                name: "sw0".to_string(),
                component_type: "switch".to_string(),
                memory_mb: None,
                cores: None,
                cpu_freq: None,
                kcmd_append: None,
                disks: Vec::new(),
                size: None,
                base_addr: None,
                as_id: None,
                ipv4: None,
            })
            .add_simulator("net_sim", "net", vec!["sw0".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.system.name, "t");
        assert_eq!(config.component_count(), 1);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = SystemConfig::from_yaml(MEMTEST_YAML).unwrap();
        let yaml = config.to_yaml().unwrap();
        let restored = SystemConfig::from_yaml(&yaml).unwrap();

        assert_eq!(config.component_count(), restored.component_count());
        assert_eq!(config.simulator_count(), restored.simulator_count());
    }
}
