//! Server configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use lad_core::DeclinationModel;

use crate::elevation::{ElevationFallback, ElevationProvider};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Quiet period after the last edit before derivations run.
    pub debounce_ms: u64,
    pub log_json: bool,
    pub elevation_provider: ElevationProvider,
    pub elevation_url: String,
    pub elevation_timeout_s: u64,
    pub elevation_fallback_m: f64,
    /// When > 0 the fallback is drawn uniformly from `fallback ± jitter`.
    pub elevation_fallback_jitter_m: f64,
    pub elevation_cache_ttl_s: u64,
    pub elevation_cache_max_entries: usize,
    pub declination: DeclinationModel,
    /// Sessions untouched for this long are closed.
    pub session_idle_ttl_s: u64,
    pub session_sweep_interval_s: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let elevation_provider = env::var("ELEVATION_PROVIDER")
            .ok()
            .and_then(|s| ElevationProvider::parse(&s))
            .unwrap_or(ElevationProvider::OpenElevation);

        let defaults = DeclinationModel::default();
        let declination = DeclinationModel {
            base_deg: parse_env("DECLINATION_BASE_DEG").unwrap_or(defaults.base_deg),
            epoch_year: parse_env("DECLINATION_EPOCH").unwrap_or(defaults.epoch_year),
            ..defaults
        };

        Self {
            server_port: parse_env("LAD_PORT").unwrap_or(3000),
            debounce_ms: parse_env("LAD_DEBOUNCE_MS").unwrap_or(1000),
            log_json: env::var("LAD_LOG_JSON")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            elevation_provider,
            elevation_url: env::var("ELEVATION_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| elevation_provider.default_url().to_string()),
            elevation_timeout_s: parse_env("ELEVATION_TIMEOUT_S").unwrap_or(5),
            elevation_fallback_m: parse_env("ELEVATION_FALLBACK_M").unwrap_or(25.0),
            elevation_fallback_jitter_m: parse_env("ELEVATION_FALLBACK_JITTER_M").unwrap_or(0.0),
            elevation_cache_ttl_s: parse_env("ELEVATION_CACHE_TTL_S").unwrap_or(3600),
            elevation_cache_max_entries: parse_env("ELEVATION_CACHE_MAX_ENTRIES").unwrap_or(1024),
            declination,
            session_idle_ttl_s: parse_env("SESSION_IDLE_TTL_S").unwrap_or(1800),
            session_sweep_interval_s: parse_env("SESSION_SWEEP_INTERVAL_S").unwrap_or(60),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_s)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval_s.max(1))
    }

    pub fn elevation_fallback(&self) -> ElevationFallback {
        if self.elevation_fallback_jitter_m > 0.0 {
            ElevationFallback::Bounded {
                min_m: self.elevation_fallback_m - self.elevation_fallback_jitter_m,
                max_m: self.elevation_fallback_m + self.elevation_fallback_jitter_m,
            }
        } else {
            ElevationFallback::Fixed(self.elevation_fallback_m)
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 3000,
            debounce_ms: 1000,
            log_json: false,
            elevation_provider: ElevationProvider::OpenElevation,
            elevation_url: ElevationProvider::OpenElevation.default_url().to_string(),
            elevation_timeout_s: 5,
            elevation_fallback_m: 25.0,
            elevation_fallback_jitter_m: 0.0,
            elevation_cache_ttl_s: 3600,
            elevation_cache_max_entries: 1024,
            declination: DeclinationModel::default(),
            session_idle_ttl_s: 1800,
            session_sweep_interval_s: 0,
        }
    }

    #[test]
    fn fixed_fallback_without_jitter() {
        let config = base_config();
        assert_eq!(config.elevation_fallback(), ElevationFallback::Fixed(25.0));
        assert_eq!(config.debounce(), Duration::from_secs(1));
        assert_eq!(config.session_idle_ttl(), Duration::from_secs(1800));
        // A zero sweep interval would spin.
        assert_eq!(config.session_sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn bounded_fallback_with_jitter() {
        let config = Config {
            elevation_fallback_jitter_m: 5.0,
            ..base_config()
        };
        assert_eq!(
            config.elevation_fallback(),
            ElevationFallback::Bounded {
                min_m: 20.0,
                max_m: 30.0
            }
        );
    }
}
