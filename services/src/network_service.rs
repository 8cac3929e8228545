use crate::error::{absent_on_not_found, Error, Result};
use crate::normalize;
use bollard::models::{Network, NetworkConnectRequest, NetworkCreateRequest};
use bollard::query_parameters::InspectNetworkOptions;
use std::sync::Arc;

pub struct NetworkService {
    docker_service: Arc<crate::DockerService>,
}

impl NetworkService {
    pub fn new(docker_service: Arc<crate::DockerService>) -> Self {
        Self { docker_service }
    }

    async fn inspect(&self, name: &str) -> Result<Option<Network>> {
        let network = absent_on_not_found(
            self.docker_service
                .docker()
                .inspect_network(name, None::<InspectNetworkOptions>)
                .await,
        )?;

        // Inspect also resolves id prefixes, only an exact name counts
        Ok(network.filter(|n| n.name.as_deref() == Some(name)))
    }

    pub async fn network_exists(&self, name: &str) -> Result<bool> {
        Ok(self.inspect(name).await?.is_some())
    }

    /// Creates a bridge network. `None` when one with that name already exists.
    pub async fn create_network(&self, name: &str) -> Result<Option<String>> {
        if self.network_exists(name).await? {
            log::debug!("Network {} already exists", name);
            return Ok(None);
        }

        let request = NetworkCreateRequest {
            name: name.to_string(),
            driver: Some("bridge".to_string()),
            attachable: Some(true),
            ..Default::default()
        };

        let response = self.docker_service.docker().create_network(request).await?;
        log::info!("Created network {} ({})", name, response.id);
        Ok(Some(response.id))
    }

    /// Removes a network, `false` when there was nothing to remove.
    pub async fn remove_network(&self, name: &str) -> Result<bool> {
        if !self.network_exists(name).await? {
            return Ok(false);
        }
        let removed = absent_on_not_found(self.docker_service.docker().remove_network(name).await)?;
        Ok(removed.is_some())
    }

    /// Attaches a container, `false` when it was already attached.
    pub async fn add_container_to_network(&self, container: &str, network: &str) -> Result<bool> {
        if self.container_in_network(container, network).await? {
            return Ok(false);
        }

        let request = NetworkConnectRequest {
            container: Some(container.to_string()),
            endpoint_config: None,
        };
        self.docker_service
            .docker()
            .connect_network(network, request)
            .await?;

        log::info!("Attached container {} to network {}", container, network);
        Ok(true)
    }

    /// Fails with [`Error::ContainerNotFound`] for a missing container; a
    /// missing network simply contains nothing.
    pub async fn container_in_network(&self, container: &str, network: &str) -> Result<bool> {
        let inspect = self
            .docker_service
            .inspect(container)
            .await?
            .ok_or_else(|| Error::ContainerNotFound(container.to_string()))?;

        Ok(normalize::networks(&inspect).is_some_and(|nets| nets.contains_key(network)))
    }

    /// First IPAM subnet of the network, e.g. `192.168.23.0/24`.
    pub async fn network_subnet(&self, name: &str) -> Result<Option<String>> {
        Ok(self.inspect(name).await?.and_then(|network| {
            network
                .ipam
                .and_then(|ipam| ipam.config)
                .and_then(|configs| configs.into_iter().find_map(|c| c.subnet))
        }))
    }
}
