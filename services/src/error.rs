use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to connect to Docker daemon: {0}. Make sure Docker is running and accessible.")]
    Connect(#[source] bollard::errors::Error),

    #[error("Container {0} does not seem to exist")]
    ContainerNotFound(String),

    #[error("Container {0} is not running")]
    ContainerNotRunning(String),

    #[error("Service {0} is not running")]
    ServiceNotRunning(String),

    #[error("Could not find a shell for container {0}")]
    NoShellFound(String),

    #[error("Docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),
}

/// True when the daemon answered 404 for the requested object.
pub(crate) fn is_not_found(err: &bollard::errors::Error) -> bool {
    matches!(
        err,
        bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }
    )
}

/// Turns a daemon 404 into `None`, keeping every other failure.
pub(crate) fn absent_on_not_found<T>(
    result: std::result::Result<T, bollard::errors::Error>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(Error::Docker(e)),
    }
}
