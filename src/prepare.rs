//! Resource preparation: staging disk artifacts before launch.
//!
//! Each simulator's resources are independent, so staging runs in parallel
//! when the `parallel` feature is enabled and sequentially otherwise:
//!
//! ```toml
//! [dependencies]
//! simweave = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! A failure cancels the remaining work cooperatively and the first failure
//! (in simulator order) is reported.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::disk::{CommandExecutor, DiskImage, DiskLibrary, ImageFormat};
use crate::error::{OrchestrationResult, ResourceError};
use crate::instantiation::{Env, Instantiation};
use crate::simulator::LifecycleState;
use crate::topology::ComponentClass;
use crate::types::{ComponentId, SimulatorId};

/// One unit of staging work: the disks of one component, staged for the
/// simulator responsible for it.
struct PrepareItem {
    simulator: SimulatorId,
    simulator_name: String,
    accepted: &'static [ImageFormat],
    component: ComponentId,
    disks: Vec<String>,
}

/// Stages the disk artifacts of every simulator and moves them to
/// `Prepared`.
///
/// Work items are processed in parallel where the feature allows; once any
/// item fails the remaining items observe the cancellation flag and stop
/// before their next staging step. Staged paths land in the instantiation's
/// artifact cache; lifecycle transitions happen only after all items have
/// finished, so a failed run leaves every simulator in `Created`.
pub fn prepare_all(
    instantiation: &mut Instantiation,
    library: &DiskLibrary,
    executor: &dyn CommandExecutor,
) -> OrchestrationResult<()> {
    instantiation.env.ensure_layout()?;

    let topology = instantiation.simulation.topology();
    let mut items = Vec::new();
    for sim in instantiation.simulation.simulators() {
        for &component in &sim.components {
            let Ok(comp) = topology.component(component) else {
                continue;
            };
            let ComponentClass::Host(host) = &comp.class else {
                continue;
            };
            if host.disks.is_empty() {
                continue;
            }
            items.push(PrepareItem {
                simulator: sim.id,
                simulator_name: sim.name.clone(),
                accepted: sim.kind.supported_image_formats(),
                component,
                disks: host.disks.clone(),
            });
        }
    }
    info!(items = items.len(), "staging disk artifacts");

    let cancelled = AtomicBool::new(false);
    let env = &instantiation.env;
    let artifacts = instantiation.artifacts();

    let run_item = |(idx, item): (usize, &PrepareItem)| -> Result<(), (usize, ResourceError)> {
        let mut staged = Vec::with_capacity(item.disks.len());
        for (drive, disk) in item.disks.iter().enumerate() {
            if cancelled.load(Ordering::Relaxed) {
                return Ok(());
            }
            match stage_disk(env, item, drive, disk, library, executor) {
                Ok(path) => staged.push(path),
                Err(err) => {
                    cancelled.store(true, Ordering::Relaxed);
                    return Err((idx, err));
                }
            }
        }
        artifacts.insert(item.simulator, item.component, staged);
        Ok(())
    };

    #[cfg(feature = "parallel")]
    let failures: Vec<(usize, ResourceError)> = items
        .par_iter()
        .enumerate()
        .filter_map(|pair| run_item(pair).err())
        .collect();

    #[cfg(not(feature = "parallel"))]
    let failures: Vec<(usize, ResourceError)> = items
        .iter()
        .enumerate()
        .filter_map(|pair| run_item(pair).err())
        .collect();

    if let Some((_, err)) = failures.into_iter().min_by_key(|(idx, _)| *idx) {
        return Err(err.into());
    }

    let ids: Vec<SimulatorId> = instantiation.simulation.simulators().map(|s| s.id).collect();
    for id in ids {
        instantiation
            .simulation
            .simulator_mut(id)?
            .transition_to(LifecycleState::Prepared)?;
    }
    Ok(())
}

/// Stages one disk for one simulator, returning the path its command line
/// will reference.
///
/// Images that tolerate sharing are referenced in place. Images that need a
/// private copy are duplicated: raw images by a plain file copy, qcow2 images
/// by creating a copy-on-write overlay backed by the original.
fn stage_disk(
    env: &Env,
    item: &PrepareItem,
    drive: usize,
    disk: &str,
    library: &DiskLibrary,
    executor: &dyn CommandExecutor,
) -> Result<PathBuf, ResourceError> {
    let image = library.get(disk).ok_or_else(|| ResourceError::ResourceMissing {
        simulator: item.simulator_name.clone(),
        path: PathBuf::from(disk),
    })?;
    let format = image
        .find_format(item.accepted)
        .ok_or_else(|| ResourceError::UnsupportedFormat {
            simulator: item.simulator_name.clone(),
            image: disk.to_string(),
        })?;
    let source = image.path(env, format);
    if !source.exists() {
        return Err(ResourceError::ResourceMissing {
            simulator: item.simulator_name.clone(),
            path: source,
        });
    }
    if !image.needs_copy() {
        debug!(simulator = %item.simulator_name, disk, "using shared image in place");
        return Ok(source);
    }

    // Two components of one simulator may reference the same image name, so
    // the copy is keyed by component and drive slot, never by the name alone.
    let dest = env.hdcopy_path(item.simulator, &format!("{}.{drive}", item.component));
    match format {
        ImageFormat::Raw => {
            std::fs::copy(&source, &dest).map_err(|e| ResourceError::StagingFailed {
                simulator: item.simulator_name.clone(),
                message: format!("copying {}: {e}", source.display()),
            })?;
        }
        ImageFormat::Qcow2 => {
            let args = vec![
                "qemu-img".to_string(),
                "create".to_string(),
                "-f".to_string(),
                "qcow2".to_string(),
                "-F".to_string(),
                "qcow2".to_string(),
                "-o".to_string(),
                format!("backing_file={}", source.display()),
                dest.display().to_string(),
            ];
            executor.exec(&item.simulator_name, &args)?;
        }
    }
    debug!(simulator = %item.simulator_name, disk, dest = %dest.display(), "staged private copy");
    Ok(dest)
}
