use crate::error::Result;
use bollard::query_parameters::{
    PruneContainersOptions, PruneImagesOptions, PruneNetworksOptions, PruneVolumesOptions,
};
use chrono::Utc;
use stakkr_shared::CleanReport;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    pub containers: bool,
    pub images: bool,
    pub volumes: bool,
    pub networks: bool,
}

impl CleanOptions {
    pub fn all() -> Self {
        Self {
            containers: true,
            images: true,
            volumes: true,
            networks: true,
        }
    }

    pub fn none() -> Self {
        Self {
            containers: false,
            images: false,
            volumes: false,
            networks: false,
        }
    }
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Removes stopped containers, dangling images, unused volumes and networks.
pub struct CleanService {
    docker_service: Arc<crate::DockerService>,
}

impl CleanService {
    pub fn new(docker_service: Arc<crate::DockerService>) -> Self {
        Self { docker_service }
    }

    pub async fn clean(&self, options: CleanOptions) -> Result<CleanReport> {
        let docker = self.docker_service.docker();
        let mut report = CleanReport::default();

        // Containers first, they keep images, volumes and networks in use
        if options.containers {
            let pruned = docker
                .prune_containers(None::<PruneContainersOptions>)
                .await?;
            report.containers_deleted = pruned.containers_deleted.unwrap_or_default();
            report.space_reclaimed += reclaimed(pruned.space_reclaimed);
            log::info!("Removed {} exited containers", report.containers_deleted.len());
        }

        if options.images {
            let pruned = docker.prune_images(None::<PruneImagesOptions>).await?;
            report.images_deleted = pruned
                .images_deleted
                .unwrap_or_default()
                .into_iter()
                .filter_map(|item| item.deleted.or(item.untagged))
                .collect();
            report.space_reclaimed += reclaimed(pruned.space_reclaimed);
            log::info!("Removed {} dangling images", report.images_deleted.len());
        }

        if options.volumes {
            let pruned = docker.prune_volumes(None::<PruneVolumesOptions>).await?;
            report.volumes_deleted = pruned.volumes_deleted.unwrap_or_default();
            report.space_reclaimed += reclaimed(pruned.space_reclaimed);
            log::info!("Removed {} unused volumes", report.volumes_deleted.len());
        }

        if options.networks {
            let pruned = docker.prune_networks(None::<PruneNetworksOptions>).await?;
            report.networks_deleted = pruned.networks_deleted.unwrap_or_default();
            log::info!("Removed {} unused networks", report.networks_deleted.len());
        }

        report.timestamp = Some(Utc::now());
        Ok(report)
    }
}

fn reclaimed(space: Option<i64>) -> u64 {
    space.map(|s| s.max(0) as u64).unwrap_or(0)
}
