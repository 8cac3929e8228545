use std::env;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct DockerConfig {
    /// `unix:///path/to/docker.sock` or `tcp://host:port`
    pub docker_host: Option<String>,
    pub timeout: Duration,
    /// Network used instead of `<prefix>_stakkr` when resolving container addresses.
    pub network: Option<String>,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            docker_host: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            network: None,
        }
    }
}

impl DockerConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let docker_host = get("DOCKER_HOST").filter(|h| !h.is_empty());

        let timeout_secs = get("STAKKR_DOCKER_TIMEOUT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let network = get("STAKKR_NETWORK").filter(|n| !n.is_empty());

        Self {
            docker_host,
            timeout: Duration::from_secs(timeout_secs),
            network,
        }
    }
}
