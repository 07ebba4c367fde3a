//! Simulator factory registry for configuration-driven setup.
//!
//! The registry maps simulator type names to factories producing
//! [`SimulatorKind`] values, so configuration files can pick simulators by
//! name and tune them through string attributes.
//!
//! # Example
//!
//! ```
//! use simweave::registry::SimulatorRegistry;
//! use simweave::simulator::SimulatorKind;
//! use std::collections::HashMap;
//!
//! let mut registry = SimulatorRegistry::new();
//! registry.register("mem", |_attrs| SimulatorKind::mem());
//!
//! let kind = registry.create("mem", &HashMap::new()).unwrap();
//! assert_eq!(kind.kind_name(), "mem");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::simulator::SimulatorKind;

/// Type alias for simulator factory functions.
pub type SimulatorFactory = Arc<dyn Fn(&HashMap<String, String>) -> SimulatorKind + Send + Sync>;

/// A registry of simulator factories keyed by type name.
#[derive(Default)]
pub struct SimulatorRegistry {
    factories: HashMap<String, SimulatorFactory>,
}

impl SimulatorRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a simulator factory with the given type name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&HashMap<String, String>) -> SimulatorKind + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Creates a simulator kind by type name.
    ///
    /// Returns `None` if the type is not registered.
    pub fn create(&self, type_name: &str, attrs: &HashMap<String, String>) -> Option<SimulatorKind> {
        self.factories.get(type_name).map(|f| f(attrs))
    }

    /// Returns true if a type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns an iterator over registered type names.
    pub fn type_names(&self) -> impl Iterator<Item = &String> {
        self.factories.keys()
    }

    /// Unregisters a simulator type.
    pub fn unregister(&mut self, type_name: &str) -> bool {
        self.factories.remove(type_name).is_some()
    }
}

impl std::fmt::Debug for SimulatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatorRegistry")
            .field("registered_types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Creates a default registry with the built-in simulator types.
///
/// Includes:
/// - `host` - full-system host simulator
/// - `mem` - memory device simulator
/// - `interconnect` - address-routing interconnect simulator
/// - `nic` - NIC behavioral simulator
/// - `net` - network fabric simulator
///
/// Every type honors an `executable` attribute overriding the default
/// binary; `host` additionally understands `variant`, `cpu_type`,
/// `cpu_type_checkpoint` and `sys_clock`.
pub fn create_default_registry() -> SimulatorRegistry {
    use crate::simulator::HostSimSpec;

    let mut registry = SimulatorRegistry::new();

    registry.register("host", |attrs| {
        let mut spec = HostSimSpec::default();
        if let Some(exe) = attrs.get("executable") {
            spec.executable = exe.clone();
        }
        if let Some(variant) = attrs.get("variant") {
            spec.variant = variant.clone();
        }
        if let Some(cpu) = attrs.get("cpu_type") {
            spec.cpu_type = cpu.clone();
        }
        if let Some(cpu) = attrs.get("cpu_type_checkpoint") {
            spec.cpu_type_checkpoint = cpu.clone();
        }
        if let Some(clock) = attrs.get("sys_clock") {
            spec.sys_clock = clock.clone();
        }
        SimulatorKind::Host(spec)
    });

    registry.register("mem", |attrs| match attrs.get("executable") {
        Some(exe) => SimulatorKind::Mem {
            executable: exe.clone(),
        },
        None => SimulatorKind::mem(),
    });

    registry.register("interconnect", |attrs| match attrs.get("executable") {
        Some(exe) => SimulatorKind::Interconnect {
            executable: exe.clone(),
        },
        None => SimulatorKind::interconnect(),
    });

    registry.register("nic", |attrs| match attrs.get("executable") {
        Some(exe) => SimulatorKind::Nic {
            executable: exe.clone(),
        },
        None => SimulatorKind::nic(),
    });

    registry.register("net", |attrs| match attrs.get("executable") {
        Some(exe) => SimulatorKind::Net {
            executable: exe.clone(),
        },
        None => SimulatorKind::net(),
    });

    registry
}
