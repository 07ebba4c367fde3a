//! Run environment, fragments, and the instantiation of a simulation.
//!
//! An [`Instantiation`] binds a [`Simulation`](crate::simulator::Simulation)
//! to a concrete run: a filesystem layout ([`Env`]), deployable groupings of
//! simulators ([`Fragment`]), the checkpoint/restore mode of the pass, the
//! whole-topology socket assignment, and the staged-artifact cache filled by
//! preparation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::disk::ImageFormat;
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::simulator::{ComposeCtx, Simulation};
use crate::socket::{assign_sockets, Socket, SocketMap};
use crate::types::{ChannelId, ComponentId, InterfaceId, SimulatorId};

/// Filesystem layout of one run, rooted at a working directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Env {
    workdir: PathBuf,
    /// Base of the simulator installation tree, for resolving executables.
    repo: PathBuf,
}

impl Env {
    /// Creates an environment rooted at `workdir`, with executables resolved
    /// relative to it.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        let repo = workdir.clone();
        Self { workdir, repo }
    }

    /// Sets the simulator installation tree used by [`Env::repo_base`].
    pub fn with_repo(mut self, repo: impl Into<PathBuf>) -> Self {
        self.repo = repo.into();
        self
    }

    /// The run's working directory.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Resolves a path relative to the simulator installation tree.
    pub fn repo_base(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.repo.join(relative)
    }

    /// Directory holding source disk images.
    pub fn img_dir(&self) -> PathBuf {
        self.workdir.join("images")
    }

    /// Path of a named source image in the given format.
    pub fn image_path(&self, name: &str, format: ImageFormat) -> PathBuf {
        self.img_dir().join(format!("{name}.{}", format.extension()))
    }

    /// Path of a private disk copy. `ident` must be unique within the
    /// simulator (component id plus drive index).
    pub fn hdcopy_path(&self, simulator: SimulatorId, ident: &str) -> PathBuf {
        self.img_dir().join(format!("hdcopy.{simulator}.{ident}"))
    }

    /// Checkpoint directory of one simulator.
    pub fn cpdir_sim(&self, simulator: &str) -> PathBuf {
        self.workdir.join("cp").join(simulator)
    }

    /// Output directory of one simulator.
    pub fn output_dir(&self, simulator: &str) -> PathBuf {
        self.workdir.join("out").join(simulator)
    }

    /// Rendezvous path of one cross-process channel.
    pub fn shm_path(&self, channel: ChannelId) -> PathBuf {
        self.workdir.join("shm").join(format!("ch.{channel}"))
    }

    /// Creates the run's directory layout.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.img_dir())?;
        std::fs::create_dir_all(self.workdir.join("shm"))?;
        std::fs::create_dir_all(self.workdir.join("cp"))?;
        std::fs::create_dir_all(self.workdir.join("out"))?;
        Ok(())
    }
}

/// A deployable grouping of simulators scheduled to run together.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Fragment {
    /// Fragment name (e.g. a machine label).
    pub name: String,
    /// Simulators assigned to this fragment.
    pub simulators: Vec<SimulatorId>,
}

impl Fragment {
    /// Creates a named, empty fragment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            simulators: Vec::new(),
        }
    }

    /// Adds simulators to the fragment.
    pub fn add_simulators(&mut self, ids: impl IntoIterator<Item = SimulatorId>) {
        self.simulators.extend(ids);
    }
}

/// Cache of staged disk artifacts, keyed by `(simulator, component)`.
///
/// Filled once during preparation; concurrent preparation tasks write
/// disjoint keys.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    staged: RwLock<HashMap<(SimulatorId, ComponentId), Vec<PathBuf>>>,
}

impl ArtifactCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the staged disk paths of one component, in drive order.
    pub fn insert(&self, simulator: SimulatorId, component: ComponentId, paths: Vec<PathBuf>) {
        self.staged.write().insert((simulator, component), paths);
    }

    /// Returns the staged disk paths of one component.
    pub fn get(&self, simulator: SimulatorId, component: ComponentId) -> Option<Vec<PathBuf>> {
        self.staged.read().get(&(simulator, component)).cloned()
    }

    /// Returns true if nothing has been staged.
    pub fn is_empty(&self) -> bool {
        self.staged.read().is_empty()
    }
}

/// One concrete run of a simulation.
///
/// Holds everything `compose_command` needs beyond the frozen topology:
/// environment paths, socket assignment, run mode, and staged artifacts.
#[derive(Debug, Serialize, Deserialize)]
pub struct Instantiation {
    /// The simulation being run.
    pub simulation: Simulation,
    /// Filesystem layout of the run.
    pub env: Env,
    /// Deployable groupings; every simulator belongs to exactly one.
    pub fragments: Vec<Fragment>,
    /// Whether this pass boots the system to produce a checkpoint.
    pub create_checkpoint: bool,
    /// Whether this pass restores from a previously taken checkpoint.
    pub restore_checkpoint: bool,
    /// Whole-topology socket assignment; empty until
    /// [`Instantiation::assign_sockets`] runs.
    #[serde(default)]
    sockets: SocketMap,
    /// Staged artifacts; not persisted, rebuilt by preparation.
    #[serde(skip)]
    artifacts: ArtifactCache,
}

impl Instantiation {
    /// Creates an instantiation of `simulation` under `env`.
    pub fn new(simulation: Simulation, env: Env) -> Self {
        Self {
            simulation,
            env,
            fragments: Vec::new(),
            create_checkpoint: false,
            restore_checkpoint: false,
            sockets: SocketMap::default(),
            artifacts: ArtifactCache::new(),
        }
    }

    /// Adds a fragment.
    pub fn add_fragment(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    /// Computes the socket assignment for the whole topology.
    ///
    /// This is a whole-topology step: roles depend on both endpoints'
    /// simulators, so it runs once, after the simulation is complete and
    /// before any command is composed.
    pub fn assign_sockets(&mut self) -> OrchestrationResult<()> {
        self.sockets = assign_sockets(&self.simulation, &self.env)?;
        Ok(())
    }

    /// Returns the socket bound to an interface, if one was assigned.
    pub fn get_socket(&self, interface: InterfaceId) -> Option<&Socket> {
        self.sockets.get(interface)
    }

    /// Returns the socket map.
    pub fn sockets(&self) -> &SocketMap {
        &self.sockets
    }

    /// Returns the staged-artifact cache.
    pub fn artifacts(&self) -> &ArtifactCache {
        &self.artifacts
    }

    /// Composes the launch command of one simulator.
    pub fn compose_command(&self, simulator: SimulatorId) -> Result<String, OrchestrationError> {
        let sim = self.simulation.simulator(simulator)?;
        let ctx = ComposeCtx {
            topology: self.simulation.topology(),
            env: &self.env,
            sockets: &self.sockets,
            create_checkpoint: self.create_checkpoint,
            restore_checkpoint: self.restore_checkpoint,
            artifacts: &self.artifacts,
        };
        sim.compose_command(&ctx)
    }

    /// Serializes the instantiation for persistence.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Reconstructs an instantiation from its persisted form.
    ///
    /// Staged artifacts are not persisted; a reconstructed instantiation must
    /// be prepared again (or have its cache refilled) before composing
    /// commands for simulators with disks.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
