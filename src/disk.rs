//! Disk image contract and the external command executor.
//!
//! The core never converts or formats images itself. It asks a [`DiskImage`]
//! which formats exist and where they live, picks the format a simulator
//! accepts, and hands any copy/convert invocation to a [`CommandExecutor`]
//! collaborator.

use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ResourceError;
use crate::instantiation::Env;

/// On-disk image formats the orchestrator knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Raw,
    Qcow2,
}

impl ImageFormat {
    /// File extension used for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Raw => "raw",
            ImageFormat::Qcow2 => "qcow2",
        }
    }
}

/// A disk image attached to a host component.
///
/// Implementations describe where artifacts live and in which formats; they
/// never perform conversion themselves.
pub trait DiskImage: Send + Sync {
    /// Unique image name, referenced from host specs.
    fn name(&self) -> &str;

    /// Formats this image is available in.
    fn available_formats(&self) -> &[ImageFormat];

    /// Whether a simulator must work on a private copy (copy-on-write safety
    /// for images shared between runs).
    fn needs_copy(&self) -> bool;

    /// Path of the image artifact in the given format.
    fn path(&self, env: &Env, format: ImageFormat) -> PathBuf;

    /// Picks the first format (in the simulator's preference order) this
    /// image is available in.
    fn find_format(&self, accepted: &[ImageFormat]) -> Option<ImageFormat> {
        accepted
            .iter()
            .copied()
            .find(|f| self.available_formats().contains(f))
    }
}

/// A pre-built image located under the environment's image directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrebuiltDiskImage {
    name: String,
    formats: Vec<ImageFormat>,
    needs_copy: bool,
}

impl PrebuiltDiskImage {
    /// Creates a pre-built image available in the given formats.
    pub fn new(name: impl Into<String>, formats: Vec<ImageFormat>, needs_copy: bool) -> Self {
        Self {
            name: name.into(),
            formats,
            needs_copy,
        }
    }
}

impl DiskImage for PrebuiltDiskImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn available_formats(&self) -> &[ImageFormat] {
        &self.formats
    }

    fn needs_copy(&self) -> bool {
        self.needs_copy
    }

    fn path(&self, env: &Env, format: ImageFormat) -> PathBuf {
        env.image_path(&self.name, format)
    }
}

/// Collection of disk images keyed by name, as referenced from host specs.
#[derive(Default)]
pub struct DiskLibrary {
    images: std::collections::HashMap<String, std::sync::Arc<dyn DiskImage>>,
}

impl DiskLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an image under its own name.
    pub fn add(&mut self, image: std::sync::Arc<dyn DiskImage>) {
        self.images.insert(image.name().to_string(), image);
    }

    /// Looks up an image by name.
    pub fn get(&self, name: &str) -> Option<&std::sync::Arc<dyn DiskImage>> {
        self.images.get(name)
    }

    /// Returns the number of registered images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns true if no images are registered.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl std::fmt::Debug for DiskLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskLibrary")
            .field("images", &self.images.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// External collaborator that runs staging commands (image copies, qcow
/// derivations). The core decides *what* to run, never *how*.
pub trait CommandExecutor: Send + Sync {
    /// Runs one staging command on behalf of `simulator`.
    fn exec(&self, simulator: &str, args: &[String]) -> Result<(), ResourceError>;
}

/// Executor that spawns real OS processes.
#[derive(Debug, Default)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    fn exec(&self, simulator: &str, args: &[String]) -> Result<(), ResourceError> {
        let (program, rest) = args.split_first().ok_or_else(|| ResourceError::StagingFailed {
            simulator: simulator.to_string(),
            message: "empty command".to_string(),
        })?;
        tracing::debug!(simulator, command = %args.join(" "), "running staging command");
        let status = std::process::Command::new(program)
            .args(rest)
            .status()
            .map_err(|e| ResourceError::StagingFailed {
                simulator: simulator.to_string(),
                message: e.to_string(),
            })?;
        if !status.success() {
            return Err(ResourceError::StagingFailed {
                simulator: simulator.to_string(),
                message: format!("command exited with {status}"),
            });
        }
        Ok(())
    }
}

/// Executor that records commands instead of running them. Used by tests and
/// dry runs.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    commands: Mutex<Vec<Vec<String>>>,
}

impl RecordingExecutor {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded commands in invocation order.
    pub fn recorded(&self) -> Vec<Vec<String>> {
        self.commands.lock().clone()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn exec(&self, _simulator: &str, args: &[String]) -> Result<(), ResourceError> {
        self.commands.lock().push(args.to_vec());
        Ok(())
    }
}
