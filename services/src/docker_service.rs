use crate::error::{absent_on_not_found, Error, Result};
use crate::normalize;
use bollard::models::ContainerInspectResponse;
use bollard::query_parameters::{InspectContainerOptions, ListContainersOptions};
use bollard::Docker;
use stakkr_shared::{ContainerInfo, StackSnapshot};
use std::collections::{BTreeMap, HashMap};

/// Container lookups and stack enumeration. Every call re-queries the daemon.
#[derive(Clone)]
pub struct DockerService {
    docker: Docker,
}

impl DockerService {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    pub async fn shared() -> Result<Self> {
        Ok(Self::new(crate::client::get_client().await?.clone()))
    }

    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    /// Raw inspect data, `None` when no container has that name.
    pub async fn inspect(&self, name: &str) -> Result<Option<ContainerInspectResponse>> {
        absent_on_not_found(
            self.docker
                .inspect_container(name, None::<InspectContainerOptions>)
                .await,
        )
    }

    pub async fn container_running(&self, name: &str) -> Result<bool> {
        Ok(self
            .inspect(name)
            .await?
            .is_some_and(|inspect| normalize::status(&inspect).is_running()))
    }

    /// Like [`Self::container_running`] but a missing container is an error.
    pub async fn require_running(&self, name: &str) -> Result<ContainerInspectResponse> {
        let inspect = self
            .inspect(name)
            .await?
            .ok_or_else(|| Error::ContainerNotFound(name.to_string()))?;

        if !normalize::status(&inspect).is_running() {
            return Err(Error::ContainerNotRunning(name.to_string()));
        }
        Ok(inspect)
    }

    /// Normalized info of one container. `network` overrides `<prefix>_stakkr`.
    pub async fn extract_container_info(
        &self,
        name: &str,
        prefix: &str,
        network: Option<&str>,
    ) -> Result<Option<ContainerInfo>> {
        let network = network
            .map(str::to_string)
            .unwrap_or_else(|| normalize::stack_network(prefix));

        Ok(self
            .inspect(name)
            .await?
            .map(|inspect| normalize::container_info(&inspect, prefix, &network)))
    }

    /// Every container named `<prefix>_*`, stopped ones included.
    pub async fn get_running_containers(
        &self,
        prefix: &str,
        network: Option<&str>,
    ) -> Result<StackSnapshot> {
        let mut filters = HashMap::new();
        filters.insert("name".to_string(), vec![format!("{}_", prefix)]);

        let options = ListContainersOptions {
            all: true,
            filters: Some(filters),
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await?;
        log::debug!("Docker API returned {} containers for prefix {}", containers.len(), prefix);

        let mut snapshot = BTreeMap::new();
        for container in containers {
            let Some(id) = container.id else {
                continue;
            };

            // The daemon matches names as substrings, e.g. `other_static_php`
            let in_stack = container
                .names
                .unwrap_or_default()
                .iter()
                .any(|n| normalize::belongs_to_stack(n.trim_start_matches('/'), prefix));
            if !in_stack {
                continue;
            }

            match self.extract_container_info(&id, prefix, network).await? {
                Some(info) => {
                    snapshot.insert(id, info);
                }
                None => log::warn!("Container {} disappeared while listing stack {}", id, prefix),
            }
        }

        let snapshot = StackSnapshot::new(snapshot);
        log::info!(
            "Stack {}: {} containers, {} running",
            prefix,
            snapshot.len(),
            snapshot.running
        );
        Ok(snapshot)
    }

    pub async fn get_running_containers_names(&self, prefix: &str) -> Result<Vec<String>> {
        let snapshot = self.get_running_containers(prefix, None).await?;
        let mut names: Vec<String> = snapshot
            .containers
            .into_values()
            .filter(|c| c.running)
            .map(|c| c.name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Running container of the stack whose service name is `compose_name`.
    pub async fn find_service(
        &self,
        prefix: &str,
        compose_name: &str,
        network: Option<&str>,
    ) -> Result<Option<ContainerInfo>> {
        let snapshot = self.get_running_containers(prefix, network).await?;
        Ok(snapshot
            .containers
            .into_values()
            .find(|c| c.running && c.compose_name == compose_name))
    }

    pub async fn get_ct_name(&self, prefix: &str, compose_name: &str) -> Result<String> {
        self.find_service(prefix, compose_name, None)
            .await?
            .map(|c| c.name)
            .ok_or_else(|| Error::ServiceNotRunning(compose_name.to_string()))
    }
}
