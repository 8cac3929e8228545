//! Tests against a live daemon. Run with `cargo test -- --ignored`.

use bollard::models::{ContainerCreateBody, HostConfig, Ipam, IpamConfig, NetworkCreateRequest};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, RemoveContainerOptions, StartContainerOptions,
    StopContainerOptions,
};
use bollard::Docker;
use futures::StreamExt;
use stakkr_services::{
    connect, docker_actions, CleanOptions, CleanService, DockerConfig, DockerService, Error,
    FirewallService, NetworkService, PortBlockOutcome, ShellService,
};
use std::sync::Arc;

const MINIMAL_IMAGE: &str = "alpine:3.20";
const BASH_IMAGE: &str = "debian:bookworm-slim";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Each tokio test has its own runtime, so each gets its own client
async fn service() -> anyhow::Result<Arc<DockerService>> {
    init_logger();
    let docker = connect(&DockerConfig::from_env()).await?;
    Ok(Arc::new(DockerService::new(docker)))
}

async fn pull(docker: &Docker, image: &str) -> anyhow::Result<()> {
    let options = CreateImageOptions {
        from_image: Some(image.to_string()),
        ..Default::default()
    };
    let mut stream = docker.create_image(Some(options), None, None);
    while let Some(progress) = stream.next().await {
        progress?;
    }
    Ok(())
}

async fn run_container(docker: &Docker, name: &str, image: &str, network: Option<&str>) -> anyhow::Result<()> {
    stop_remove_container(docker, name).await?;
    pull(docker, image).await?;

    let body = ContainerCreateBody {
        image: Some(image.to_string()),
        cmd: Some(vec!["sleep".to_string(), "600".to_string()]),
        host_config: Some(HostConfig {
            network_mode: network.map(str::to_string),
            ..Default::default()
        }),
        ..Default::default()
    };
    let options = CreateContainerOptions {
        name: Some(name.to_string()),
        ..Default::default()
    };
    docker.create_container(Some(options), body).await?;
    docker
        .start_container(name, None::<StartContainerOptions>)
        .await?;
    Ok(())
}

async fn stop_remove_container(docker: &Docker, name: &str) -> anyhow::Result<()> {
    let options = RemoveContainerOptions {
        force: true,
        ..Default::default()
    };
    match docker.remove_container(name, Some(options)).await {
        Ok(()) => Ok(()),
        Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn remove_network(docker: &Docker, name: &str) -> anyhow::Result<()> {
    match docker.remove_network(name).await {
        Ok(()) => Ok(()),
        Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn create_subnet_network(docker: &Docker, name: &str, subnet: &str) -> anyhow::Result<()> {
    remove_network(docker, name).await?;
    let request = NetworkCreateRequest {
        name: name.to_string(),
        driver: Some("bridge".to_string()),
        ipam: Some(Ipam {
            config: Some(vec![IpamConfig {
                subnet: Some(subnet.to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };
    docker.create_network(request).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn container_running() -> anyhow::Result<()> {
    let service = service().await?;
    let docker = service.docker();
    run_container(docker, "pytest_running", MINIMAL_IMAGE, None).await?;
    assert!(service.container_running("pytest_running").await?);

    stop_remove_container(docker, "pytest_running").await?;
    assert!(!service.container_running("pytest_running").await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn missing_container_is_absent() -> anyhow::Result<()> {
    let service = service().await?;
    assert!(!service.container_running("not_exists").await?);
    assert!(service.extract_container_info("not_exists", "not_exists", None).await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn stack_snapshot() -> anyhow::Result<()> {
    let service = service().await?;
    let networks = NetworkService::new(service.clone());
    let docker = service.docker();

    create_subnet_network(docker, "static_stakkr", "192.168.24.0/24").await?;
    run_container(docker, "static_php", MINIMAL_IMAGE, None).await?;
    run_container(docker, "static_maildev", MINIMAL_IMAGE, Some("static_stakkr")).await?;
    run_container(docker, "static_portainer", MINIMAL_IMAGE, Some("static_stakkr")).await?;

    let snapshot = service.get_running_containers("static", None).await?;
    assert_eq!(snapshot.running, 3);
    assert_eq!(snapshot.len(), 3);

    let php = snapshot.by_compose_name("php").expect("static_php in snapshot");
    assert_eq!(php.name, "static_php");
    assert!(php.running);
    assert_eq!(php.image, MINIMAL_IMAGE);
    // Only on the default bridge, so no address on the stack network
    assert_eq!(php.ip, "");

    let maildev = snapshot.by_compose_name("maildev").expect("static_maildev in snapshot");
    assert!(maildev.ip.starts_with("192.168.24"));

    assert!(networks.container_in_network("static_maildev", "static_stakkr").await?);
    assert!(networks.network_exists("static_stakkr").await?);
    assert!(!networks.container_in_network("static_maildev", "bridge").await?);

    // Stopped containers stay in the snapshot but are not counted
    docker
        .stop_container("static_portainer", None::<StopContainerOptions>)
        .await?;
    let snapshot = service.get_running_containers("static", None).await?;
    assert_eq!(snapshot.running, 2);
    assert_eq!(snapshot.len(), 3);
    assert_eq!(
        service.get_running_containers_names("static").await?,
        vec!["static_maildev".to_string(), "static_php".to_string()]
    );
    assert_eq!(service.get_ct_name("static", "php").await?, "static_php");
    assert!(matches!(
        service.get_ct_name("static", "portainer").await,
        Err(Error::ServiceNotRunning(_))
    ));

    stop_remove_container(docker, "static_php").await?;
    let err = networks
        .container_in_network("static_php", "bridge")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ContainerNotFound(_)));
    assert_eq!(err.to_string(), "Container static_php does not seem to exist");

    stop_remove_container(docker, "static_maildev").await?;
    stop_remove_container(docker, "static_portainer").await?;
    remove_network(docker, "static_stakkr").await?;
    assert!(!networks.network_exists("static_stakkr").await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn ip_resolved_on_configured_network() -> anyhow::Result<()> {
    let service = service().await?;
    let docker = service.docker();
    create_subnet_network(docker, "testnet_custom", "192.168.23.0/24").await?;
    run_container(docker, "testnet_php", MINIMAL_IMAGE, Some("testnet_custom")).await?;

    let snapshot = service
        .get_running_containers("testnet", Some("testnet_custom"))
        .await?;
    assert_eq!(snapshot.running, 1);
    assert_eq!(snapshot.len(), 1);
    for info in snapshot.containers.values() {
        assert!(info.ip.starts_with("192.168.23"));
        assert_eq!(info.image, MINIMAL_IMAGE);
    }

    // `testnet_stakkr` does not exist, so no address is reported
    let info = service
        .extract_container_info("testnet_php", "testnet", None)
        .await?
        .expect("testnet_php exists");
    assert_eq!(info.ip, "");

    stop_remove_container(docker, "testnet_php").await?;
    remove_network(docker, "testnet_custom").await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn create_network_and_attach() -> anyhow::Result<()> {
    let service = service().await?;
    let networks = NetworkService::new(service.clone());
    let docker = service.docker();
    remove_network(docker, "nw_pytest").await?;
    run_container(docker, "pytest_network", MINIMAL_IMAGE, None).await?;

    assert!(service.container_running("pytest_network").await?);
    assert!(!networks.container_in_network("pytest_network", "nw_pytest").await?);
    assert!(!networks.network_exists("nw_pytest").await?);

    let id = networks.create_network("nw_pytest").await?;
    assert!(id.is_some_and(|id| !id.is_empty()));
    assert_eq!(networks.create_network("nw_pytest").await?, None);

    assert!(networks.add_container_to_network("pytest_network", "nw_pytest").await?);
    assert!(!networks.add_container_to_network("pytest_network", "nw_pytest").await?);
    assert!(networks.container_in_network("pytest_network", "nw_pytest").await?);

    stop_remove_container(docker, "pytest_network").await?;
    assert!(networks.remove_network("nw_pytest").await?);
    assert!(!networks.remove_network("nw_pytest").await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn guess_shell_minimal() -> anyhow::Result<()> {
    let service = service().await?;
    run_container(service.docker(), "pytest_sh", MINIMAL_IMAGE, None).await?;
    let shells = ShellService::new(service.clone());
    assert_eq!(shells.guess_shell("pytest_sh").await?, "/bin/sh");
    stop_remove_container(service.docker(), "pytest_sh").await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn guess_shell_bash() -> anyhow::Result<()> {
    let service = service().await?;
    run_container(service.docker(), "pytest_bash", BASH_IMAGE, None).await?;
    let shells = ShellService::new(service.clone());
    assert_eq!(shells.guess_shell("pytest_bash").await?, "/bin/bash");
    stop_remove_container(service.docker(), "pytest_bash").await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn guess_shell_needs_running_container() -> anyhow::Result<()> {
    let service = service().await?;
    let shells = ShellService::new(service.clone());
    let result = shells.guess_shell("not_exists").await;
    assert!(matches!(result, Err(Error::ContainerNotFound(_))));
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn stopped_service_is_not_running() -> anyhow::Result<()> {
    let service = service().await?;
    let docker = service.docker();
    run_container(docker, "stopped_php", MINIMAL_IMAGE, None).await?;
    docker
        .stop_container("stopped_php", None::<StopContainerOptions>)
        .await?;

    assert!(!service.container_running("stopped_php").await?);
    let shells = ShellService::new(service.clone());
    assert!(matches!(
        shells.guess_shell("stopped_php").await,
        Err(Error::ContainerNotRunning(_))
    ));

    let firewall = FirewallService::new(service.clone());
    assert_eq!(
        firewall.block_ct_ports("stopped", "php", &[25]).await?,
        PortBlockOutcome::NotRunning
    );

    stop_remove_container(docker, "stopped_php").await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn clean_with_nothing_selected() -> anyhow::Result<()> {
    let service = service().await?;
    let report = CleanService::new(service).clean(CleanOptions::none()).await?;
    assert!(report.is_empty());
    assert_eq!(report.space_reclaimed, 0);
    Ok(())
}

// The only test using the process-wide client
#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn facade_over_shared_client() -> anyhow::Result<()> {
    init_logger();
    let docker = docker_actions::get_client().await?;
    assert!(std::ptr::eq(docker, docker_actions::get_client().await?));

    assert!(!docker_actions::container_running("not_exists").await?);
    assert!(docker_actions::extract_container_info("not_exists", "not_exists").await?.is_none());
    assert!(docker_actions::get_running_containers("not_exists").await?.is_empty());
    assert!(!docker_actions::network_exists("nw_not_exists").await?);
    assert!(matches!(
        docker_actions::container_in_network("not_exists", "bridge").await,
        Err(Error::ContainerNotFound(_))
    ));
    assert_eq!(
        docker_actions::block_ct_ports("not_exists", "php", &[25]).await?,
        PortBlockOutcome::NotRunning
    );
    Ok(())
}
