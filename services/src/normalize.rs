//! Conversions from raw inspect data into the normalized stack models.

use bollard::models::{
    ContainerInspectResponse, ContainerStateStatusEnum, EndpointSettings, PortMap,
};
use stakkr_shared::{ContainerInfo, ContainerStatus, PortMapping};
use std::collections::HashMap;

const TRAEFIK_RULE_LABEL: &str = "traefik.frontend.rule";

/// Name of the network dedicated to a stack.
pub fn stack_network(prefix: &str) -> String {
    format!("{}_stakkr", prefix)
}

/// `static_php` -> `php` for prefix `static`.
///
/// A container named without the `<prefix>_` convention keeps its full name.
/// Nothing checks the remainder, so `static_php_1` gives `php_1`.
pub fn compose_name(name: &str, prefix: &str) -> String {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name)
        .to_string()
}

pub fn belongs_to_stack(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|rest| !rest.is_empty())
}

pub fn container_name(inspect: &ContainerInspectResponse) -> String {
    inspect
        .name
        .as_deref()
        .unwrap_or_default()
        .trim_start_matches('/')
        .to_string()
}

pub fn status(inspect: &ContainerInspectResponse) -> ContainerStatus {
    match inspect.state.as_ref().and_then(|s| s.status) {
        Some(ContainerStateStatusEnum::RUNNING) => ContainerStatus::Running,
        Some(ContainerStateStatusEnum::EXITED) => ContainerStatus::Exited,
        Some(ContainerStateStatusEnum::CREATED) => ContainerStatus::Created,
        Some(ContainerStateStatusEnum::PAUSED) => ContainerStatus::Paused,
        _ => ContainerStatus::Other,
    }
}

pub fn networks(inspect: &ContainerInspectResponse) -> Option<&HashMap<String, EndpointSettings>> {
    inspect
        .network_settings
        .as_ref()
        .and_then(|ns| ns.networks.as_ref())
}

/// Address of the container on `network`; empty when it is not attached
/// there, whatever other networks give it an address.
pub fn ip_on_network(networks: Option<&HashMap<String, EndpointSettings>>, network: &str) -> String {
    networks
        .and_then(|nets| nets.get(network))
        .and_then(|endpoint| endpoint.ip_address.clone())
        .unwrap_or_default()
}

/// One entry per host binding. Exposed ports that are not published give nothing.
pub fn ports(port_map: Option<&PortMap>) -> Vec<PortMapping> {
    let Some(port_map) = port_map else {
        return Vec::new();
    };

    let mut ports = Vec::new();
    for (key, bindings) in port_map {
        let Some((container_port, protocol)) = parse_port_key(key) else {
            log::warn!("Ignoring unparsable port {}", key);
            continue;
        };

        for binding in bindings.as_deref().unwrap_or_default() {
            ports.push(PortMapping {
                container_port,
                protocol: protocol.clone(),
                host_ip: binding.host_ip.clone().filter(|ip| !ip.is_empty()),
                host_port: binding.host_port.as_deref().and_then(|p| p.parse().ok()),
            });
        }
    }

    ports.sort();
    ports.dedup();
    ports
}

// "80/tcp" -> (80, "tcp")
fn parse_port_key(key: &str) -> Option<(u16, String)> {
    let (port, protocol) = key.split_once('/').unwrap_or((key, "tcp"));
    Some((port.parse().ok()?, protocol.to_string()))
}

/// `Host:www.example.localhost` -> `www.example.localhost`
pub fn traefik_host(labels: Option<&HashMap<String, String>>) -> Option<String> {
    let rule = labels?.get(TRAEFIK_RULE_LABEL)?;
    let (_, host) = rule.split_once(':')?;
    let host = host.trim();
    (!host.is_empty()).then(|| host.to_string())
}

pub fn container_info(inspect: &ContainerInspectResponse, prefix: &str, network: &str) -> ContainerInfo {
    let name = container_name(inspect);
    let status = status(inspect);
    let config = inspect.config.as_ref();

    ContainerInfo {
        id: inspect.id.clone().unwrap_or_default(),
        compose_name: compose_name(&name, prefix),
        name,
        status,
        running: status.is_running(),
        ip: ip_on_network(networks(inspect), network),
        image: config.and_then(|c| c.image.clone()).unwrap_or_default(),
        ports: ports(inspect.network_settings.as_ref().and_then(|ns| ns.ports.as_ref())),
        traefik_host: traefik_host(config.and_then(|c| c.labels.as_ref())),
    }
}
