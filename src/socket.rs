//! Socket role and path assignment.
//!
//! Every channel whose endpoints live in different simulator processes is
//! realized by one path-addressed rendezvous: exactly one side listens, the
//! other connects. Role assignment is a whole-topology step computed from the
//! interface graph and the simulators' capabilities, not negotiated per
//! channel at runtime. Interfaces whose peer lives in the same process get no
//! socket at all.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{OrchestrationError, TopologyError};
use crate::instantiation::Env;
use crate::simulator::Simulation;
use crate::types::InterfaceId;

/// Which side of the rendezvous an interface takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SockRole {
    /// The side that dials in.
    Connect,
    /// The side that binds and waits.
    Listen,
}

impl std::fmt::Display for SockRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SockRole::Connect => write!(f, "connect"),
            SockRole::Listen => write!(f, "listen"),
        }
    }
}

/// A socket bound to one cross-process interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socket {
    /// The interface this socket realizes.
    pub interface: InterfaceId,
    /// Connect or listen.
    pub role: SockRole,
    /// Rendezvous path, shared with the peer socket.
    pub path: PathBuf,
}

impl Socket {
    /// Formats the `role:path` endpoint used in launch commands.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.role, self.path.display())
    }
}

/// The whole-topology socket assignment: at most one socket per interface.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SocketMap {
    by_interface: HashMap<InterfaceId, Socket>,
}

impl SocketMap {
    /// Returns the socket of an interface, if one was assigned.
    pub fn get(&self, interface: InterfaceId) -> Option<&Socket> {
        self.by_interface.get(&interface)
    }

    /// Returns the number of assigned sockets.
    pub fn len(&self) -> usize {
        self.by_interface.len()
    }

    /// Returns true if no sockets are assigned.
    pub fn is_empty(&self) -> bool {
        self.by_interface.is_empty()
    }

    /// Iterates over all assigned sockets.
    pub fn iter(&self) -> impl Iterator<Item = &Socket> {
        self.by_interface.values()
    }
}

/// Computes socket roles and paths for every cross-process channel.
///
/// For each channel whose endpoints are owned by two different simulators,
/// the listener is chosen deterministically: the side whose simulator kind
/// cannot listen connects; when both sides can listen, the endpoint with the
/// lower interface id listens. Both sockets share the channel's rendezvous
/// path. Channels with an endpoint on an unplaced component are skipped —
/// the owning interface simply ends up without a socket.
pub fn assign_sockets(
    simulation: &Simulation,
    env: &Env,
) -> Result<SocketMap, OrchestrationError> {
    let topology = simulation.topology();
    let mut by_interface = HashMap::new();

    for channel in topology.channels() {
        let comp_a = topology.owner_of(channel.a)?;
        let comp_b = topology.owner_of(channel.b)?;
        let (sim_a, sim_b) = match (
            simulation.simulator_owning(comp_a),
            simulation.simulator_owning(comp_b),
        ) {
            (Some(a), Some(b)) => (a, b),
            // Unplaced component: no process will drive this interface.
            _ => continue,
        };
        if sim_a == sim_b {
            // Intra-process peer, no rendezvous needed.
            continue;
        }

        let a_roles = simulation.simulator(sim_a)?.kind.supported_socket_roles();
        let b_roles = simulation.simulator(sim_b)?.kind.supported_socket_roles();
        let a_can_listen = a_roles.contains(&SockRole::Listen);
        let b_can_listen = b_roles.contains(&SockRole::Listen);

        let a_listens = match (a_can_listen, b_can_listen) {
            (true, false) => true,
            (false, true) => false,
            (true, true) => channel.a < channel.b,
            (false, false) => {
                return Err(TopologyError::UnsatisfiableSocketRoles(channel.id).into())
            }
        };

        let path = env.shm_path(channel.id);
        let (role_a, role_b) = if a_listens {
            (SockRole::Listen, SockRole::Connect)
        } else {
            (SockRole::Connect, SockRole::Listen)
        };
        by_interface.insert(
            channel.a,
            Socket {
                interface: channel.a,
                role: role_a,
                path: path.clone(),
            },
        );
        by_interface.insert(
            channel.b,
            Socket {
                interface: channel.b,
                role: role_b,
                path,
            },
        );
    }

    tracing::debug!(sockets = by_interface.len(), "socket assignment complete");
    Ok(SocketMap { by_interface })
}
