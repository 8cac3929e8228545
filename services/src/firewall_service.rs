use crate::error::Result;
use crate::network_service::NetworkService;
use crate::normalize;
use crate::shell_service::ShellService;
use stakkr_shared::PortBlockOutcome;
use std::sync::Arc;

/// Rejects outgoing TCP traffic to given ports from inside a stack service,
/// while keeping the stack network reachable.
pub struct FirewallService {
    docker_service: Arc<crate::DockerService>,
    network_service: NetworkService,
    shell_service: ShellService,
}

impl FirewallService {
    pub fn new(docker_service: Arc<crate::DockerService>) -> Self {
        Self {
            network_service: NetworkService::new(docker_service.clone()),
            shell_service: ShellService::new(docker_service.clone()),
            docker_service,
        }
    }

    pub async fn block_ct_ports(
        &self,
        prefix: &str,
        compose_name: &str,
        ports: &[u16],
    ) -> Result<PortBlockOutcome> {
        let Some(service) = self
            .docker_service
            .find_service(prefix, compose_name, None)
            .await?
        else {
            log::info!("{} is not started, no port to block", compose_name);
            return Ok(PortBlockOutcome::NotRunning);
        };

        let which = self.shell_service.exec(&service.id, &["which", "iptables"]).await?;
        let iptables = which.stdout.trim();
        if !which.success() || iptables.is_empty() {
            log::warn!("Can't block ports on {}, is iptables installed?", compose_name);
            return Ok(PortBlockOutcome::NoIptables);
        }

        if let Some(subnet) = self
            .network_service
            .network_subnet(&normalize::stack_network(prefix))
            .await?
        {
            self.replace_rule(&service.id, iptables, &output_rule(&["-d", subnet.as_str(), "-j", "ACCEPT"]))
                .await?;
        }

        let mut results = Vec::with_capacity(ports.len());
        for &port in ports {
            let dport = port.to_string();
            let rule = output_rule(&["-p", "tcp", "--dport", dport.as_str(), "-j", "REJECT"]);
            results.push((port, self.replace_rule(&service.id, iptables, &rule).await?));
        }

        let outcome = block_outcome(&results);
        match &outcome {
            PortBlockOutcome::Failed { ports } => {
                log::error!("Could not block any of {:?} on container {}", ports, service.name)
            }
            PortBlockOutcome::Blocked { ports } => {
                log::info!("Blocked ports {:?} on container {}", ports, service.name)
            }
            _ => {}
        }
        Ok(outcome)
    }

    // Delete first so repeated calls do not stack duplicate rules.
    // `false` when iptables refused to append the rule.
    async fn replace_rule(&self, container: &str, iptables: &str, rule: &[String]) -> Result<bool> {
        let delete = iptables_cmd(iptables, "-D", rule);
        let delete: Vec<&str> = delete.iter().map(String::as_str).collect();
        self.shell_service.exec(container, &delete).await?;

        let append = iptables_cmd(iptables, "-A", rule);
        let append: Vec<&str> = append.iter().map(String::as_str).collect();
        let output = self.shell_service.exec(container, &append).await?;
        if !output.success() {
            log::warn!("iptables {:?} exited with {} in {}", rule, output.exit_code, container);
        }
        Ok(output.success())
    }
}

/// Reports the ports actually blocked, or every port when none could be.
fn block_outcome(results: &[(u16, bool)]) -> PortBlockOutcome {
    let blocked: Vec<u16> = results
        .iter()
        .filter(|(_, appended)| *appended)
        .map(|(port, _)| *port)
        .collect();

    if blocked.is_empty() && !results.is_empty() {
        PortBlockOutcome::Failed {
            ports: results.iter().map(|(port, _)| *port).collect(),
        }
    } else {
        PortBlockOutcome::Blocked { ports: blocked }
    }
}

fn output_rule(args: &[&str]) -> Vec<String> {
    std::iter::once("OUTPUT")
        .chain(args.iter().copied())
        .map(str::to_string)
        .collect()
}

fn iptables_cmd(iptables: &str, action: &str, rule: &[String]) -> Vec<String> {
    let mut cmd = vec![iptables.to_string(), action.to_string()];
    cmd.extend(rule.iter().cloned());
    cmd
}
