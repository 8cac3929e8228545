//! Free functions over the process-wide daemon handle.
//!
//! Each call builds its services around [`crate::client::get_client`], so
//! nothing here holds state between calls.

use crate::client;
use crate::error::Result;
use crate::{CleanOptions, CleanService, DockerService, FirewallService, NetworkService, ShellService};
use stakkr_shared::{CleanReport, ContainerInfo, PortBlockOutcome, StackSnapshot};
use std::sync::Arc;

pub use crate::client::get_client;

async fn docker_service() -> Result<Arc<DockerService>> {
    Ok(Arc::new(DockerService::shared().await?))
}

fn network_override() -> Option<&'static str> {
    client::config().network.as_deref()
}

pub async fn container_running(name: &str) -> Result<bool> {
    docker_service().await?.container_running(name).await
}

pub async fn extract_container_info(name: &str, prefix: &str) -> Result<Option<ContainerInfo>> {
    docker_service()
        .await?
        .extract_container_info(name, prefix, network_override())
        .await
}

/// Snapshot of the stack; `snapshot.running` is the number of running containers.
pub async fn get_running_containers(prefix: &str) -> Result<StackSnapshot> {
    docker_service()
        .await?
        .get_running_containers(prefix, network_override())
        .await
}

pub async fn get_running_containers_names(prefix: &str) -> Result<Vec<String>> {
    docker_service().await?.get_running_containers_names(prefix).await
}

pub async fn get_ct_name(prefix: &str, compose_name: &str) -> Result<String> {
    docker_service().await?.get_ct_name(prefix, compose_name).await
}

pub async fn network_exists(name: &str) -> Result<bool> {
    NetworkService::new(docker_service().await?).network_exists(name).await
}

pub async fn create_network(name: &str) -> Result<Option<String>> {
    NetworkService::new(docker_service().await?).create_network(name).await
}

pub async fn add_container_to_network(container: &str, network: &str) -> Result<bool> {
    NetworkService::new(docker_service().await?)
        .add_container_to_network(container, network)
        .await
}

pub async fn container_in_network(container: &str, network: &str) -> Result<bool> {
    NetworkService::new(docker_service().await?)
        .container_in_network(container, network)
        .await
}

pub async fn guess_shell(container: &str) -> Result<String> {
    ShellService::new(docker_service().await?).guess_shell(container).await
}

pub async fn block_ct_ports(prefix: &str, compose_name: &str, ports: &[u16]) -> Result<PortBlockOutcome> {
    FirewallService::new(docker_service().await?)
        .block_ct_ports(prefix, compose_name, ports)
        .await
}

pub async fn clean(options: CleanOptions) -> Result<CleanReport> {
    CleanService::new(docker_service().await?).clean(options).await
}
