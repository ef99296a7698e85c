use std::collections::HashSet;
use thiserror::Error;

use crate::config::{McpSettings, ServerSettings, Settings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_server(&settings.server) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_mcp(&settings.mcp) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if server.host.trim().is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        let mut seen = HashSet::from([server.port]);
        for port in &server.fallback_ports {
            if *port == 0 {
                errors.push(ValidationError::InvalidValue {
                    field: "server.fallback_ports".to_string(),
                    reason: "Port must be greater than 0".to_string(),
                });
            } else if !seen.insert(*port) {
                errors.push(ValidationError::Duplicate(format!("server port {}", port)));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_mcp(mcp: &McpSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if mcp.keep_alive_secs == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "mcp.keep_alive_secs".to_string(),
                reason: "Keep-alive interval must be greater than 0".to_string(),
            });
        }

        if mcp.session_buffer == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "mcp.session_buffer".to_string(),
                reason: "Session buffer must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
