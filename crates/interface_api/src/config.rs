//! API configuration

use chrono::Duration;
use serde::Deserialize;

use core_kernel::{CoreError, Currency, IdentifierKind, IdentifierScheme, Timezone};
use domain_billing::{NumberingConfig, StatusPolicy, SuppressionClock};

/// API server configuration
///
/// Every field falls back to its default when the matching `API_*`
/// environment variable is unset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level
    pub log_level: String,
    /// Currency of invoices that do not name one
    pub currency: String,
    /// IANA zone in which due dates are compared
    pub timezone: String,
    /// Seconds after a write during which the stored status is kept
    pub suppression_window_secs: i64,
    /// `manual_edits_only` or `any_write`
    pub suppression_clock: String,
    /// Days between issue date and default due date
    pub payment_terms_days: u32,
    /// Digits in the numeric part of an invoice number
    pub invoice_number_pad: usize,
    /// Attempts to allocate a unique invoice number
    pub numbering_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            currency: "USD".to_string(),
            timezone: "UTC".to_string(),
            suppression_window_secs: 600,
            suppression_clock: "manual_edits_only".to_string(),
            payment_terms_days: 30,
            invoice_number_pad: 6,
            numbering_attempts: 3,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn default_currency(&self) -> Result<Currency, CoreError> {
        Ok(self.currency.parse::<Currency>()?)
    }

    pub fn payment_terms(&self) -> Duration {
        Duration::days(i64::from(self.payment_terms_days))
    }

    /// Builds the status rule parameters
    ///
    /// # Errors
    ///
    /// `CoreError::Temporal` for an unknown time zone, `CoreError::Configuration`
    /// for a negative or unrepresentable window or an unknown suppression clock.
    pub fn status_policy(&self) -> Result<StatusPolicy, CoreError> {
        if self.suppression_window_secs < 0 {
            return Err(CoreError::configuration(format!(
                "suppression_window_secs must not be negative, got {}",
                self.suppression_window_secs
            )));
        }
        let window = Duration::try_seconds(self.suppression_window_secs).ok_or_else(|| {
            CoreError::configuration(format!(
                "suppression_window_secs is out of range, got {}",
                self.suppression_window_secs
            ))
        })?;
        let timezone: Timezone = self.timezone.parse()?;
        let clock: SuppressionClock = self
            .suppression_clock
            .parse()
            .map_err(|e| CoreError::configuration(format!("{e}")))?;

        Ok(StatusPolicy::default()
            .with_suppression_window(window)
            .with_suppression_clock(clock)
            .with_timezone(timezone))
    }

    /// Builds the invoice numbering parameters
    pub fn numbering(&self) -> Result<NumberingConfig, CoreError> {
        if self.invoice_number_pad == 0 {
            return Err(CoreError::configuration("invoice_number_pad must be at least 1"));
        }
        if self.numbering_attempts == 0 {
            return Err(CoreError::configuration("numbering_attempts must be at least 1"));
        }
        let default = IdentifierKind::Invoice.default_scheme();
        Ok(NumberingConfig {
            scheme: IdentifierScheme::monthly(default.prefix, self.invoice_number_pad),
            max_attempts: self.numbering_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build_default_policy() {
        let config = ApiConfig::default();
        assert_eq!(config.status_policy().unwrap(), StatusPolicy::default());
        assert_eq!(config.numbering().unwrap(), NumberingConfig::default());
        assert_eq!(config.default_currency().unwrap(), Currency::USD);
        assert_eq!(config.payment_terms(), Duration::days(30));
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = ApiConfig { timezone: "Mars/Olympus".to_string(), ..Default::default() };
        assert!(matches!(config.status_policy(), Err(CoreError::Temporal(_))));

        let config = ApiConfig { suppression_clock: "never".to_string(), ..Default::default() };
        assert!(matches!(config.status_policy(), Err(CoreError::Configuration(_))));

        let config = ApiConfig { suppression_window_secs: -1, ..Default::default() };
        assert!(config.status_policy().is_err());

        let config = ApiConfig { suppression_window_secs: i64::MAX, ..Default::default() };
        assert!(matches!(config.status_policy(), Err(CoreError::Configuration(_))));

        let config = ApiConfig { numbering_attempts: 0, ..Default::default() };
        assert!(config.numbering().is_err());

        let config = ApiConfig { currency: "XYZ".to_string(), ..Default::default() };
        assert!(matches!(config.default_currency(), Err(CoreError::Money(_))));
    }

    #[test]
    fn test_custom_policy() {
        let config = ApiConfig {
            timezone: "Africa/Lagos".to_string(),
            suppression_window_secs: 60,
            suppression_clock: "any_write".to_string(),
            ..Default::default()
        };
        let policy = config.status_policy().unwrap();
        assert_eq!(policy.suppression_window, Duration::minutes(1));
        assert_eq!(policy.suppression_clock, SuppressionClock::AnyWrite);
        assert_eq!(policy.timezone.name(), "Africa/Lagos");
    }
}
