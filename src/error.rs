// file: src/error.rs
// version: 1.0.0
// guid: 3f9c2a71-58de-4b1a-9f02-7c64d1e8a530

use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Error types for the Swarm provisioning agent
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {count} invalid configuration field(s)")]
    Validation { count: usize },

    #[error("Precondition not met: {0}")]
    Precondition(String),

    #[error("Step '{step}' failed: {message}")]
    Step { step: String, message: String },

    #[error("Command '{command}' exited with status {code}: {stderr}")]
    Command {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Service error: {0}")]
    Service(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("System error: {0}")]
    System(String),
}

impl ProvisionError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a new step error
    pub fn step(step: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Step {
            step: step.into(),
            message: msg.into(),
        }
    }

    /// Create a new service error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new system error
    pub fn system(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }

    /// Process exit code for this error.
    ///
    /// A failed external command propagates its own exit status; validation
    /// failures use 2; everything else maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Command { code, .. } if *code > 0 => *code,
            Self::Validation { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_propagates_exit_code() {
        let err = ProvisionError::Command {
            command: "ufw".to_string(),
            code: 127,
            stderr: "not found".to_string(),
        };
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn test_validation_error_exit_code() {
        let err = ProvisionError::Validation { count: 3 };
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("3 invalid"));
    }

    #[test]
    fn test_generic_error_exit_code() {
        let err = ProvisionError::precondition("must run as root");
        assert_eq!(err.exit_code(), 1);
    }
}
