use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;
use thermoview_engine::PollIntervals;

/// Which collaborator the session talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Built-in deterministic simulator; no network needed.
    Simulated,
    /// Real HTTP collaborators at the given base URL.
    Http { base_url: String },
}

/// Runtime configuration, loaded from environment variables with defaults
/// suitable for a local demo run.
///
/// | Env var                    | Default                 |
/// |----------------------------|-------------------------|
/// | `THERMOVIEW_HOST`          | `0.0.0.0`               |
/// | `THERMOVIEW_PORT`          | `8080`                  |
/// | `THERMOVIEW_LOCATION`      | `demo-home` (empty disables polling) |
/// | `THERMOVIEW_BACKEND`       | `sim` (`sim` or `http`) |
/// | `THERMOVIEW_BACKEND_URL`   | `http://localhost:8000` |
/// | `THERMOVIEW_TELEMETRY_SECS`| `5`                     |
/// | `THERMOVIEW_SCHEDULE_SECS` | `60`                    |
/// | `THERMOVIEW_CLOCK_SECS`    | `1`                     |
/// | `THERMOVIEW_DEBOUNCE_MS`   | `500`                   |
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub location: Option<String>,
    pub backend: BackendKind,
    pub intervals: PollIntervals,
    pub debounce: Duration,
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Config> {
        let host = std::env::var("THERMOVIEW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env_or("THERMOVIEW_PORT", 8080)?;

        let location = match std::env::var("THERMOVIEW_LOCATION") {
            Ok(raw) if raw.trim().is_empty() => None,
            Ok(raw) => Some(raw),
            Err(_) => Some("demo-home".to_string()),
        };

        let backend = match std::env::var("THERMOVIEW_BACKEND")
            .unwrap_or_else(|_| "sim".to_string())
            .as_str()
        {
            "sim" => BackendKind::Simulated,
            "http" => BackendKind::Http {
                base_url: std::env::var("THERMOVIEW_BACKEND_URL")
                    .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            },
            other => anyhow::bail!("THERMOVIEW_BACKEND must be \"sim\" or \"http\", got {other:?}"),
        };

        let intervals = PollIntervals {
            telemetry: Duration::from_secs(env_or("THERMOVIEW_TELEMETRY_SECS", 5u64)?),
            schedule: Duration::from_secs(env_or("THERMOVIEW_SCHEDULE_SECS", 60u64)?),
            clock: Duration::from_secs(env_or("THERMOVIEW_CLOCK_SECS", 1u64)?),
        };

        Ok(Config {
            host,
            port,
            location,
            backend,
            intervals,
            debounce: Duration::from_millis(env_or("THERMOVIEW_DEBOUNCE_MS", 500u64)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them to defaults-only so they
    // stay order-independent.
    #[test]
    fn defaults_apply_when_env_is_unset() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend, BackendKind::Simulated);
        assert_eq!(config.location.as_deref(), Some("demo-home"));
        assert_eq!(config.intervals.telemetry, Duration::from_secs(5));
        assert_eq!(config.intervals.schedule, Duration::from_secs(60));
        assert_eq!(config.debounce, Duration::from_millis(500));
    }
}
