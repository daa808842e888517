// file: src/firewall/policy.rs
// version: 1.0.0
// guid: d0f7a829-3c61-4b5e-8d94-e2b5f7c1a063

//! Role-scoped firewall rule sets

use super::{FirewallRule, Protocol};
use crate::config::{
    ProvisionConfig, Role, DOCKER_API_PLAIN_PORT, DOCKER_API_TLS_PORT, SWARM_DISCOVERY_PORT,
    SWARM_MANAGEMENT_PORT, SWARM_OVERLAY_PORT,
};

/// Compute the ordered rule set for a role.
///
/// The control plane admits web, UI, monitoring and swarm ports globally.
/// Workers admit swarm traffic only from the control-plane address. Both
/// roles deny the Docker remote API ports; that pair is always present.
pub fn rules_for_role(role: Role, config: &ProvisionConfig) -> Vec<FirewallRule> {
    let mut rules = vec![FirewallRule::allow(config.ssh_port, Protocol::Tcp, "ssh")];

    match role {
        Role::ControlPlane => {
            rules.push(FirewallRule::allow(80, Protocol::Tcp, "http"));
            rules.push(FirewallRule::allow(443, Protocol::Tcp, "https"));
            rules.push(FirewallRule::allow(config.ui_port, Protocol::Tcp, "management ui"));
            rules.push(FirewallRule::allow(
                SWARM_MANAGEMENT_PORT,
                Protocol::Tcp,
                "swarm management",
            ));
            rules.push(FirewallRule::allow(
                SWARM_DISCOVERY_PORT,
                Protocol::Tcp,
                "swarm discovery",
            ));
            rules.push(FirewallRule::allow(
                SWARM_DISCOVERY_PORT,
                Protocol::Udp,
                "swarm discovery",
            ));
            rules.push(FirewallRule::allow(
                SWARM_OVERLAY_PORT,
                Protocol::Udp,
                "swarm overlay network",
            ));
            rules.push(FirewallRule::allow(
                config.prometheus_port,
                Protocol::Tcp,
                "prometheus",
            ));
            rules.push(FirewallRule::allow(
                config.grafana_port,
                Protocol::Tcp,
                "grafana",
            ));
        }
        Role::Worker => {
            // Validation guarantees the control-plane address for workers.
            let manager = config.control_plane_ip.as_deref().unwrap_or("0.0.0.0");
            rules.push(FirewallRule::allow_from(
                manager,
                SWARM_MANAGEMENT_PORT,
                Protocol::Tcp,
                "swarm management",
            ));
            rules.push(FirewallRule::allow_from(
                manager,
                SWARM_DISCOVERY_PORT,
                Protocol::Tcp,
                "swarm discovery",
            ));
            rules.push(FirewallRule::allow_from(
                manager,
                SWARM_DISCOVERY_PORT,
                Protocol::Udp,
                "swarm discovery",
            ));
            rules.push(FirewallRule::allow_from(
                manager,
                SWARM_OVERLAY_PORT,
                Protocol::Udp,
                "swarm overlay network",
            ));
        }
    }

    // Security invariant: the Docker remote API is never reachable.
    rules.push(FirewallRule::deny(
        DOCKER_API_PLAIN_PORT,
        Protocol::Tcp,
        "docker api plaintext",
    ));
    rules.push(FirewallRule::deny(
        DOCKER_API_TLS_PORT,
        Protocol::Tcp,
        "docker api tls",
    ));

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validator::Validator;
    use crate::config::ConfigLoader;
    use crate::firewall::Action;

    fn config_for(role: Role, control_plane_ip: Option<&str>) -> ProvisionConfig {
        let mut settings = ConfigLoader::with_env(Default::default()).load(None).unwrap();
        if let Some(ip) = control_plane_ip {
            settings.set("CONTROL_PLANE_IP", ip);
        }
        Validator::new(&settings).validate(role).unwrap()
    }

    fn has_allow(rules: &[FirewallRule], port: u16, protocol: Protocol) -> bool {
        rules.iter().any(|r| {
            r.action == Action::Allow && r.port == port && r.protocol == protocol
        })
    }

    #[test]
    fn test_control_plane_rule_set() {
        let config = config_for(Role::ControlPlane, None);
        let rules = rules_for_role(Role::ControlPlane, &config);

        assert!(has_allow(&rules, 22, Protocol::Tcp));
        assert!(has_allow(&rules, 80, Protocol::Tcp));
        assert!(has_allow(&rules, 443, Protocol::Tcp));
        assert!(has_allow(&rules, 3000, Protocol::Tcp));
        assert!(has_allow(&rules, 2377, Protocol::Tcp));
        assert!(has_allow(&rules, 7946, Protocol::Tcp));
        assert!(has_allow(&rules, 7946, Protocol::Udp));
        assert!(has_allow(&rules, 4789, Protocol::Udp));
        assert!(has_allow(&rules, 9090, Protocol::Tcp));
        assert!(has_allow(&rules, 3001, Protocol::Tcp));

        // control-plane rules are globally scoped
        assert!(rules.iter().all(|r| r.source.is_none()));
    }

    #[test]
    fn test_worker_rule_set_scoped_to_control_plane() {
        let config = config_for(Role::Worker, Some("10.0.0.5"));
        let rules = rules_for_role(Role::Worker, &config);

        for port in [2377u16, 7946] {
            let rule = rules
                .iter()
                .find(|r| r.port == port && r.protocol == Protocol::Tcp && r.action == Action::Allow)
                .unwrap();
            assert_eq!(rule.source.as_deref(), Some("10.0.0.5"));
        }
        for port in [7946u16, 4789] {
            let rule = rules
                .iter()
                .find(|r| r.port == port && r.protocol == Protocol::Udp && r.action == Action::Allow)
                .unwrap();
            assert_eq!(rule.source.as_deref(), Some("10.0.0.5"));
        }

        // no web traffic on workers
        assert!(!has_allow(&rules, 80, Protocol::Tcp));
        assert!(!has_allow(&rules, 443, Protocol::Tcp));
    }

    #[test]
    fn test_docker_api_denied_for_both_roles() {
        for (role, ip) in [(Role::ControlPlane, None), (Role::Worker, Some("10.0.0.5"))] {
            let config = config_for(role, ip);
            let rules = rules_for_role(role, &config);
            for port in [2375u16, 2376] {
                assert!(
                    rules.iter().any(|r| {
                        r.action == Action::Deny && r.port == port && r.protocol == Protocol::Tcp
                    }),
                    "{} missing deny for {}",
                    role,
                    port
                );
            }
        }
    }

    #[test]
    fn test_custom_ssh_port_respected() {
        let mut settings = ConfigLoader::with_env(Default::default()).load(None).unwrap();
        settings.set("SSH_PORT", "2222");
        let config = Validator::new(&settings).validate(Role::ControlPlane).unwrap();
        let rules = rules_for_role(Role::ControlPlane, &config);
        assert!(has_allow(&rules, 2222, Protocol::Tcp));
        assert!(!has_allow(&rules, 22, Protocol::Tcp));
    }
}
