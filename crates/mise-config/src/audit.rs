//! Audit pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_enabled() -> bool {
    true
}

const fn default_queue_capacity() -> usize {
    1024
}

const fn default_workers() -> usize {
    2
}

const fn default_validate_payloads() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Master switch. When off, mutations run without audit records.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Extra field names to redact, on top of the built-in sensitive set.
    /// Matched exactly and case-sensitively.
    #[serde(default)]
    pub filter_parameters: Vec<String>,

    /// Maximum number of payloads waiting in the async queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of worker tasks consuming the queue.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Validate payloads against their JSON Schema before persisting.
    #[serde(default = "default_validate_payloads")]
    pub validate_payloads: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            filter_parameters: Vec::new(),
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
            validate_payloads: default_validate_payloads(),
        }
    }
}

impl AuditConfig {
    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero queue capacity or worker count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "audit.queue_capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "audit.workers".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AuditConfig::default();
        assert!(config.enabled);
        assert!(config.filter_parameters.is_empty());
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.workers, 2);
        assert!(config.validate_payloads);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = AuditConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "audit.workers"
        ));
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = AuditConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
