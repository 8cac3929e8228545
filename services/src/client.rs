use crate::config::DockerConfig;
use crate::error::{Error, Result};
use bollard::Docker;
use std::sync::OnceLock;
use tokio::sync::OnceCell;

static CONFIG: OnceLock<DockerConfig> = OnceLock::new();
static CLIENT: OnceCell<Docker> = OnceCell::const_new();

/// Process configuration, read once from `.env` and the environment.
pub fn config() -> &'static DockerConfig {
    CONFIG.get_or_init(DockerConfig::load)
}

/// Shared daemon handle, connected and pinged on first use.
///
/// The handle's connection pool belongs to the runtime that first used it,
/// so call this from a single tokio runtime.
pub async fn get_client() -> Result<&'static Docker> {
    CLIENT
        .get_or_try_init(|| connect(config()))
        .await
}

/// Builds a new handle from `config` and checks the daemon answers.
pub async fn connect(config: &DockerConfig) -> Result<Docker> {
    let docker = client_for(config)?;
    docker.ping().await.map_err(Error::Connect)?;
    log::debug!("Docker daemon answered ping");

    Ok(docker)
}

// Nothing is sent to the daemon until the first request
fn client_for(config: &DockerConfig) -> Result<Docker> {
    let timeout = config.timeout.as_secs();

    // Docker Desktop uses ~/.docker/desktop/docker.sock
    // Standard Docker uses /var/run/docker.sock
    let docker = if let Some(docker_host) = &config.docker_host {
        log::info!("Using DOCKER_HOST: {}", docker_host);
        if let Some(socket_path) = docker_host.strip_prefix("unix://") {
            Docker::connect_with_socket(socket_path, timeout, bollard::API_DEFAULT_VERSION)
                .map_err(Error::Connect)?
        } else {
            Docker::connect_with_http(docker_host, timeout, bollard::API_DEFAULT_VERSION)
                .map_err(Error::Connect)?
        }
    } else if let Some(desktop_path) = desktop_socket() {
        log::info!("Connecting to Docker Desktop socket: {}", desktop_path);
        match Docker::connect_with_socket(&desktop_path, timeout, bollard::API_DEFAULT_VERSION) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Failed to connect to Docker Desktop socket ({}), trying default: {}", desktop_path, e);
                Docker::connect_with_local_defaults().map_err(Error::Connect)?
            }
        }
    } else {
        log::info!("Using Docker local defaults");
        Docker::connect_with_local_defaults().map_err(Error::Connect)?
    };

    // Local defaults ignore the configured timeout
    Ok(docker.with_timeout(config.timeout))
}

fn desktop_socket() -> Option<String> {
    let home = std::env::var("HOME").ok()?;
    let path = format!("{}/.docker/desktop/docker.sock", home);
    let exists = std::path::Path::new(&path).exists();
    exists.then_some(path)
}
