//! Configuration for the investment flow service.
//!
//! Configuration is loaded from TOML files or built programmatically via the
//! fallible builder. Post-deserialization validation is available through
//! [`FlowConfig::validate`].
//!
//! Two of the knobs exist because the source system left the corresponding
//! business rules unspecified: whether terminal statuses may be overwritten,
//! and whether an escrow balance may go negative. Both are surfaced here as
//! explicit invariants rather than silently guessed.

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Default reservation lifetime in minutes.
pub const DEFAULT_EXPIRATION_MINUTES: i64 = 30;

/// Shortest reservation lifetime a caller may request.
pub const MIN_EXPIRATION_MINUTES: i64 = 1;

/// Longest reservation lifetime a caller may request (24 hours).
pub const MAX_EXPIRATION_MINUTES: i64 = 1440;

/// Configuration validation error.
///
/// Returned when a configuration value is outside its valid range or
/// violates a cross-field constraint.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// A configuration value is invalid.
    #[snafu(display("invalid config: {message}"))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },
}

/// Configuration for the investment flow service.
#[derive(Debug, Clone, bon::Builder, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Reservation lifetime applied when the caller does not supply one.
    #[serde(default = "default_expiration_minutes")]
    #[builder(default = DEFAULT_EXPIRATION_MINUTES)]
    pub default_expiration_minutes: i64,

    /// Lower bound on caller-supplied reservation lifetimes.
    #[serde(default = "min_expiration_minutes")]
    #[builder(default = MIN_EXPIRATION_MINUTES)]
    pub min_expiration_minutes: i64,

    /// Upper bound on caller-supplied reservation lifetimes.
    #[serde(default = "max_expiration_minutes")]
    #[builder(default = MAX_EXPIRATION_MINUTES)]
    pub max_expiration_minutes: i64,

    /// When true, cancel/convert on a reservation already in a terminal
    /// status fails with a transition conflict. When false, the write is an
    /// unconditional overwrite, matching the source system's last-write-wins
    /// behavior.
    #[serde(default = "default_true")]
    #[builder(default = true)]
    pub strict_reservation_transitions: bool,

    /// When true, escrow status updates must follow the adjacency table in
    /// [`crate::EscrowStatus::can_transition_to`]. When false, any status
    /// jump is allowed, matching the source system.
    #[serde(default)]
    #[builder(default = false)]
    pub strict_escrow_transitions: bool,

    /// When true, a withdrawal may drive an escrow balance below zero.
    /// When false (the default), such deltas are rejected.
    #[serde(default)]
    #[builder(default = false)]
    pub allow_negative_escrow_balance: bool,
}

fn default_expiration_minutes() -> i64 {
    DEFAULT_EXPIRATION_MINUTES
}

fn min_expiration_minutes() -> i64 {
    MIN_EXPIRATION_MINUTES
}

fn max_expiration_minutes() -> i64 {
    MAX_EXPIRATION_MINUTES
}

fn default_true() -> bool {
    true
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            default_expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            min_expiration_minutes: MIN_EXPIRATION_MINUTES,
            max_expiration_minutes: MAX_EXPIRATION_MINUTES,
            strict_reservation_transitions: true,
            strict_escrow_transitions: false,
            allow_negative_escrow_balance: false,
        }
    }
}

impl FlowConfig {
    /// Validates field ranges and cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the expiration bounds are
    /// non-positive, inverted, or exclude the default lifetime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_expiration_minutes < 1 {
            return Err(ConfigError::Validation {
                message: format!(
                    "min_expiration_minutes must be at least 1, got {}",
                    self.min_expiration_minutes
                ),
            });
        }
        if self.max_expiration_minutes < self.min_expiration_minutes {
            return Err(ConfigError::Validation {
                message: format!(
                    "max_expiration_minutes {} is below min_expiration_minutes {}",
                    self.max_expiration_minutes, self.min_expiration_minutes
                ),
            });
        }
        if !(self.min_expiration_minutes..=self.max_expiration_minutes)
            .contains(&self.default_expiration_minutes)
        {
            return Err(ConfigError::Validation {
                message: format!(
                    "default_expiration_minutes {} is outside [{}, {}]",
                    self.default_expiration_minutes,
                    self.min_expiration_minutes,
                    self.max_expiration_minutes
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FlowConfig::default();
        config.validate().unwrap();
        assert_eq!(config.default_expiration_minutes, 30);
        assert!(config.strict_reservation_transitions);
        assert!(!config.strict_escrow_transitions);
        assert!(!config.allow_negative_escrow_balance);
    }

    #[test]
    fn test_builder_defaults_match_default_impl() {
        let built = FlowConfig::builder().build();
        let default = FlowConfig::default();
        assert_eq!(built.default_expiration_minutes, default.default_expiration_minutes);
        assert_eq!(built.min_expiration_minutes, default.min_expiration_minutes);
        assert_eq!(built.max_expiration_minutes, default.max_expiration_minutes);
        assert_eq!(
            built.strict_reservation_transitions,
            default.strict_reservation_transitions
        );
    }

    #[test]
    fn test_validate_rejects_zero_minimum() {
        let config = FlowConfig { min_expiration_minutes: 0, ..Default::default() };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_expiration_minutes"));
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let config = FlowConfig {
            min_expiration_minutes: 60,
            max_expiration_minutes: 30,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_default_outside_bounds() {
        let config = FlowConfig {
            default_expiration_minutes: 2000,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_expiration_minutes"));
    }

    #[test]
    fn test_toml_round_trip_with_partial_fields() {
        let parsed: FlowConfig = toml::from_str(
            r#"
            default_expiration_minutes = 15
            strict_escrow_transitions = true
            "#,
        )
        .unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.default_expiration_minutes, 15);
        assert!(parsed.strict_escrow_transitions);
        // Unspecified fields take their documented defaults.
        assert_eq!(parsed.max_expiration_minutes, MAX_EXPIRATION_MINUTES);
        assert!(parsed.strict_reservation_transitions);
    }

    #[test]
    fn test_toml_empty_document_yields_defaults() {
        let parsed: FlowConfig = toml::from_str("").unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.default_expiration_minutes, DEFAULT_EXPIRATION_MINUTES);
    }
}
