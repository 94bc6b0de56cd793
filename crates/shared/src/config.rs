//! Application configuration management.

use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger rules configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Member notification configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// What to do when a repayment exceeds the loan's outstanding balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverpaymentPolicy {
    /// Refuse the repayment with an invalid-amount error.
    #[default]
    Reject,
    /// Record the full repayment and clamp the balance at zero.
    Clamp,
}

/// Ledger rules shared by every engine operation.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Currency all balances are kept in.
    #[serde(default)]
    pub currency: Currency,
    /// Days between a loan's approval or latest repayment and its next due date.
    #[serde(default = "default_repayment_cadence_days")]
    pub repayment_cadence_days: u32,
    /// Handling of repayments larger than the outstanding balance.
    #[serde(default)]
    pub overpayment: OverpaymentPolicy,
}

fn default_repayment_cadence_days() -> u32 {
    30
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            repayment_cadence_days: default_repayment_cadence_days(),
            overpayment: OverpaymentPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Repayment cadence as a calendar duration.
    #[must_use]
    pub fn repayment_cadence(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.repayment_cadence_days))
    }
}

/// Member notification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Whether member notifications are sent at all.
    #[serde(default = "default_notifications_enabled")]
    pub enabled: bool,
    /// Sender id appended to outgoing messages.
    #[serde(default = "default_sender_id")]
    pub sender_id: String,
    /// Most undelivered notifications kept for retry. The oldest is dropped
    /// when the queue is full.
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
}

fn default_notifications_enabled() -> bool {
    true
}

fn default_sender_id() -> String {
    "COOPFIN".to_string()
}

fn default_outbox_capacity() -> usize {
    1000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_notifications_enabled(),
            sender_id: default_sender_id(),
            outbox_capacity: default_outbox_capacity(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, or if the repayment
    /// cadence or outbox capacity is zero.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("IKIMINA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.ledger.repayment_cadence_days == 0 {
            return Err(config::ConfigError::Message(
                "ledger.repayment_cadence_days must be at least 1".to_string(),
            ));
        }
        if self.notifications.outbox_capacity == 0 {
            return Err(config::ConfigError::Message(
                "notifications.outbox_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("IKIMINA__DATABASE__URL", Some("postgres://localhost/ikimina")),
                ("IKIMINA__LEDGER__REPAYMENT_CADENCE_DAYS", Some("14")),
                ("IKIMINA__LEDGER__OVERPAYMENT", Some("clamp")),
                ("IKIMINA__NOTIFICATIONS__SENDER_ID", Some("SACCO")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/ikimina");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.ledger.repayment_cadence_days, 14);
                assert_eq!(config.ledger.overpayment, OverpaymentPolicy::Clamp);
                assert_eq!(config.ledger.currency, Currency::Rwf);
                assert_eq!(config.notifications.sender_id, "SACCO");
                assert!(config.notifications.enabled);
                assert_eq!(config.notifications.outbox_capacity, 1000);
            },
        );
    }

    #[test]
    fn test_zero_cadence_rejected() {
        temp_env::with_vars(
            [
                ("IKIMINA__DATABASE__URL", Some("postgres://localhost/ikimina")),
                ("IKIMINA__LEDGER__REPAYMENT_CADENCE_DAYS", Some("0")),
            ],
            || {
                let err = AppConfig::load().unwrap_err();
                assert!(err.to_string().contains("repayment_cadence_days"));
            },
        );
    }

    #[test]
    fn test_zero_outbox_capacity_rejected() {
        temp_env::with_vars(
            [
                ("IKIMINA__DATABASE__URL", Some("postgres://localhost/ikimina")),
                ("IKIMINA__NOTIFICATIONS__OUTBOX_CAPACITY", Some("0")),
            ],
            || {
                let err = AppConfig::load().unwrap_err();
                assert!(err.to_string().contains("outbox_capacity"));
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars([("IKIMINA__DATABASE__URL", None::<&str>)], || {
            assert!(AppConfig::load().is_err());
        });
    }

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.repayment_cadence_days, 30);
        assert_eq!(ledger.repayment_cadence(), chrono::Duration::days(30));
        assert_eq!(ledger.overpayment, OverpaymentPolicy::Reject);
    }
}
