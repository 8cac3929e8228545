pub mod client;
pub mod config;
pub mod error;
pub mod normalize;
pub mod docker_service;
pub mod network_service;
pub mod shell_service;
pub mod firewall_service;
pub mod clean_service;
pub mod docker_actions;

pub use client::{connect, get_client};
pub use config::DockerConfig;
pub use error::{Error, Result};
pub use docker_service::DockerService;
pub use network_service::NetworkService;
pub use shell_service::{ExecOutput, ShellService};
pub use firewall_service::FirewallService;
pub use clean_service::{CleanOptions, CleanService};

// Re-export models for convenience
pub use stakkr_shared::{
    CleanReport, ContainerInfo, ContainerStatus, PortBlockOutcome, PortMapping, StackSnapshot,
};
