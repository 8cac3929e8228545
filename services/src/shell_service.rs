use crate::error::{Error, Result};
use bollard::container::LogOutput;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::models::ExecConfig;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;

/// Richer shells first.
pub const SHELL_CANDIDATES: &[&str] = &["/bin/bash", "/bin/sh"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub stdout: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub struct ShellService {
    docker_service: Arc<crate::DockerService>,
}

impl ShellService {
    pub fn new(docker_service: Arc<crate::DockerService>) -> Self {
        Self { docker_service }
    }

    /// Runs `cmd` inside a container and waits for it to finish.
    pub async fn exec(&self, container: &str, cmd: &[&str]) -> Result<ExecOutput> {
        let docker = self.docker_service.docker();

        let config = ExecConfig {
            cmd: Some(cmd.iter().map(|s| s.to_string()).collect()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };
        let exec = docker.create_exec(container, config).await?;

        let options = StartExecOptions {
            detach: false,
            ..Default::default()
        };

        let mut stdout = Vec::new();
        if let StartExecResults::Attached { mut output, .. } = docker.start_exec(&exec.id, Some(options)).await? {
            while let Some(chunk) = output.next().await {
                match chunk? {
                    LogOutput::StdOut { message } => stdout.extend_from_slice(&message),
                    LogOutput::StdErr { message } => {
                        log::debug!("{}: {}", container, String::from_utf8_lossy(&message).trim_end())
                    }
                    _ => {}
                }
            }
        }

        let details = docker.inspect_exec(&exec.id).await?;
        let exit_code = details.exit_code.unwrap_or(-1);
        log::debug!("exec {:?} in {} exited with {}", cmd, container, exit_code);

        Ok(ExecOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
        })
    }

    pub async fn guess_shell(&self, container: &str) -> Result<String> {
        self.docker_service.require_running(container).await?;

        let shell = first_available(SHELL_CANDIDATES, |path| async move {
            self.exec(container, &["test", "-x", path])
                .await
                .map(|output| output.success())
        })
        .await?;

        shell
            .map(str::to_string)
            .ok_or_else(|| Error::NoShellFound(container.to_string()))
    }
}

/// Tries `candidates` in order and stops at the first one accepted.
pub async fn first_available<'a, F, Fut>(candidates: &[&'a str], mut accept: F) -> Result<Option<&'a str>>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    for &candidate in candidates {
        if accept(candidate).await? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}
