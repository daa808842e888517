// file: src/firewall/mod.rs
// version: 1.0.0
// guid: b9e4c612-7d05-4a83-9f21-c6a3d0e8f457

//! Declarative firewall policy and its UFW application
//!
//! Rules are computed per role from the validated configuration; both rule
//! sets unconditionally deny the unencrypted and TLS Docker remote API
//! ports.

pub mod policy;
pub mod ufw;

pub use policy::rules_for_role;
pub use ufw::UfwFirewall;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "allow")]
    Allow,
    #[serde(rename = "deny")]
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "tcp")]
    Tcp,
    #[serde(rename = "udp")]
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "in")]
    In,
    #[serde(rename = "out")]
    Out,
}

/// One declarative firewall rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub action: Action,
    pub port: u16,
    pub protocol: Protocol,
    pub direction: Direction,
    /// Source address restriction; None admits any source
    pub source: Option<String>,
    /// Human label recorded as the ufw comment
    pub comment: String,
}

impl FirewallRule {
    /// Globally scoped allow rule
    pub fn allow(port: u16, protocol: Protocol, comment: &str) -> Self {
        Self {
            action: Action::Allow,
            port,
            protocol,
            direction: Direction::In,
            source: None,
            comment: comment.to_string(),
        }
    }

    /// Allow rule restricted to a single source address
    pub fn allow_from(source: &str, port: u16, protocol: Protocol, comment: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            ..Self::allow(port, protocol, comment)
        }
    }

    /// Inbound deny rule
    pub fn deny(port: u16, protocol: Protocol, comment: &str) -> Self {
        Self {
            action: Action::Deny,
            port,
            protocol,
            direction: Direction::In,
            source: None,
            comment: comment.to_string(),
        }
    }

    /// Render the rule as ufw command arguments
    pub fn ufw_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        match self.action {
            Action::Allow => args.push("allow".to_string()),
            Action::Deny => args.push("deny".to_string()),
        }
        if matches!(self.direction, Direction::Out) {
            args.push("out".to_string());
        }
        match &self.source {
            Some(source) => {
                args.push("from".to_string());
                args.push(source.clone());
                args.push("to".to_string());
                args.push("any".to_string());
                args.push("port".to_string());
                args.push(self.port.to_string());
                args.push("proto".to_string());
                args.push(self.protocol.as_str().to_string());
            }
            None => {
                args.push(format!("{}/{}", self.port, self.protocol.as_str()));
            }
        }
        args.push("comment".to_string());
        args.push(self.comment.clone());
        args
    }
}

impl std::fmt::Display for FirewallRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self.action {
            Action::Allow => "ALLOW",
            Action::Deny => "DENY ",
        };
        let direction = match self.direction {
            Direction::In => "in",
            Direction::Out => "out",
        };
        write!(
            f,
            "{} {} {}/{}",
            action,
            direction,
            self.port,
            self.protocol.as_str()
        )?;
        if let Some(source) = &self.source {
            write!(f, " from {}", source)?;
        }
        write!(f, "  # {}", self.comment)
    }
}
