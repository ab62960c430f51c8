//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "helpdesk-session")]
#[command(about = "Session host for the helpdesk front end with idle-timeout monitoring")]
#[command(version = "0.3.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Minutes of inactivity before the session is expired (0 disables monitoring)
    #[arg(long, env = "IDLE_TIMEOUT", default_value = "15", allow_negative_numbers = true)]
    pub idle_timeout: i64,

    /// Minutes before expiry at which the warning is shown (0 disables the warning)
    #[arg(long, env = "IDLE_WARNING_TIME", default_value = "1", allow_negative_numbers = true)]
    pub idle_warning: i64,

    /// Seed account for the local auth provider, as EMAIL:PASSWORD (repeatable)
    #[arg(long = "account", value_name = "EMAIL:PASSWORD")]
    pub accounts: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Idle monitoring durations derived from the minute options
    pub fn idle_settings(&self) -> IdleSettings {
        IdleSettings::from_minutes(self.idle_timeout, self.idle_warning)
    }

    /// Split the `EMAIL:PASSWORD` seed accounts
    pub fn seed_accounts(&self) -> Result<Vec<(String, String)>, String> {
        self.accounts
            .iter()
            .map(|entry| {
                entry
                    .split_once(':')
                    .map(|(email, password)| (email.trim().to_string(), password.to_string()))
                    .ok_or_else(|| format!("Invalid account '{}', expected EMAIL:PASSWORD", entry))
            })
            .collect()
    }
}

/// Durations driving the idle session monitor.
///
/// Values are never negative: degenerate inputs clamp to zero, and a zero
/// idle duration means monitoring is switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleSettings {
    pub idle_duration: Duration,
    pub warning_lead_time: Duration,
}

impl IdleSettings {
    pub const DEFAULT_IDLE_MINUTES: i64 = 15;
    pub const DEFAULT_WARNING_MINUTES: i64 = 1;

    pub fn new(idle_duration: Duration, warning_lead_time: Duration) -> Self {
        Self {
            idle_duration,
            warning_lead_time,
        }
    }

    /// Build settings from signed millisecond values
    pub fn from_millis(idle_ms: i64, warning_ms: i64) -> Self {
        Self::new(clamp_millis(idle_ms), clamp_millis(warning_ms))
    }

    /// Build settings from signed minute values
    pub fn from_minutes(idle_minutes: i64, warning_minutes: i64) -> Self {
        Self::from_millis(
            idle_minutes.saturating_mul(60_000),
            warning_minutes.saturating_mul(60_000),
        )
    }

    /// Whether monitoring can run at all with these durations
    pub fn is_active(&self) -> bool {
        !self.idle_duration.is_zero()
    }
}

impl Default for IdleSettings {
    fn default() -> Self {
        Self::from_minutes(Self::DEFAULT_IDLE_MINUTES, Self::DEFAULT_WARNING_MINUTES)
    }
}

fn clamp_millis(ms: i64) -> Duration {
    Duration::from_millis(ms.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fifteen_and_one_minutes() {
        let settings = IdleSettings::default();
        assert_eq!(settings.idle_duration, Duration::from_secs(15 * 60));
        assert_eq!(settings.warning_lead_time, Duration::from_secs(60));
        assert!(settings.is_active());
    }

    #[test]
    fn negative_values_clamp_to_disabled() {
        let settings = IdleSettings::from_millis(-5000, -1);
        assert_eq!(settings.idle_duration, Duration::ZERO);
        assert_eq!(settings.warning_lead_time, Duration::ZERO);
        assert!(!settings.is_active());
    }

    #[test]
    fn cli_options_are_read_as_minutes() {
        let config = Config::try_parse_from([
            "helpdesk-session",
            "--idle-timeout",
            "5",
            "--idle-warning",
            "2",
            "--account",
            "agent@example.com:secret1",
        ])
        .unwrap();

        let settings = config.idle_settings();
        assert_eq!(settings.idle_duration, Duration::from_secs(300));
        assert_eq!(settings.warning_lead_time, Duration::from_secs(120));
        assert_eq!(
            config.seed_accounts().unwrap(),
            vec![("agent@example.com".to_string(), "secret1".to_string())]
        );
    }

    #[test]
    fn malformed_seed_account_is_rejected() {
        let config =
            Config::try_parse_from(["helpdesk-session", "--account", "no-separator"]).unwrap();
        assert!(config.seed_accounts().is_err());
    }
}
