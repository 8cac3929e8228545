use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Running,
    Exited,
    Created,
    Paused,
    Other,
}

impl ContainerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ContainerStatus::Running)
    }
}

/// One host binding of a container port, e.g. `80/tcp -> 0.0.0.0:8080`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortMapping {
    pub container_port: u16,
    pub protocol: String, // "tcp", "udp" or "sctp"
    pub host_ip: Option<String>,
    pub host_port: Option<u16>,
}

/// Normalized view of a container belonging to a stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    /// Service name inside the stack: `name` without the `<prefix>_` segment.
    pub compose_name: String,
    pub status: ContainerStatus,
    pub running: bool,
    /// Address on the stack network, empty when the container is not attached to it.
    pub ip: String,
    pub image: String,
    pub ports: Vec<PortMapping>,
    pub traefik_host: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackSnapshot {
    pub running: usize,
    /// Keyed by container id.
    pub containers: BTreeMap<String, ContainerInfo>,
    pub timestamp: DateTime<Utc>,
}

impl StackSnapshot {
    pub fn new(containers: BTreeMap<String, ContainerInfo>) -> Self {
        let running = containers.values().filter(|c| c.running).count();
        Self {
            running,
            containers,
            timestamp: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn by_compose_name(&self, compose_name: &str) -> Option<&ContainerInfo> {
        self.containers
            .values()
            .find(|c| c.compose_name == compose_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PortBlockOutcome {
    /// Ports whose REJECT rule is in place.
    Blocked { ports: Vec<u16> },
    /// iptables refused every rule.
    Failed { ports: Vec<u16> },
    NotRunning,
    NoIptables,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanReport {
    pub containers_deleted: Vec<String>,
    pub images_deleted: Vec<String>,
    pub volumes_deleted: Vec<String>,
    pub networks_deleted: Vec<String>,
    pub space_reclaimed: u64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl CleanReport {
    pub fn is_empty(&self) -> bool {
        self.containers_deleted.is_empty()
            && self.images_deleted.is_empty()
            && self.volumes_deleted.is_empty()
            && self.networks_deleted.is_empty()
    }
}
