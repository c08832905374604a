//! Ground elevation lookups with a guaranteed fallback.
//!
//! [`ElevationResolver::resolve`] never fails: network errors, bad status
//! codes, malformed bodies and timeouts all degrade to the configured
//! fallback so a broken provider can't stall the derivation pipeline.

use futures::future::BoxFuture;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::ElevationCache;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum ElevationError {
    #[error("elevation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("elevation provider HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("elevation response malformed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("elevation provider returned no sample")]
    MissingSample,
    #[error("elevation lookup timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationProvider {
    /// `GET /api/v1/lookup?locations=lat,lng` → `{"results":[{"elevation":..}]}`
    OpenElevation,
    /// `GET /v1/elevation?latitude=..&longitude=..` → `{"elevation":[..]}`
    OpenMeteo,
}

#[derive(Debug, Deserialize)]
struct OpenElevationResponse {
    results: Vec<OpenElevationSample>,
}

#[derive(Debug, Deserialize)]
struct OpenElevationSample {
    elevation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoElevationResponse {
    elevation: Option<Vec<f64>>,
}

impl ElevationProvider {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "open-elevation" | "openelevation" => Some(Self::OpenElevation),
            "open-meteo" | "openmeteo" => Some(Self::OpenMeteo),
            _ => None,
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            Self::OpenElevation => "https://api.open-elevation.com/api/v1/lookup",
            Self::OpenMeteo => "https://api.open-meteo.com/v1/elevation",
        }
    }

    pub fn build_url(self, base: &str, lat: f64, lng: f64) -> String {
        let separator = if base.contains('?') { "&" } else { "?" };
        match self {
            Self::OpenElevation => format!("{}{}locations={:.6},{:.6}", base, separator, lat, lng),
            Self::OpenMeteo => format!(
                "{}{}latitude={:.6}&longitude={:.6}",
                base, separator, lat, lng
            ),
        }
    }

    /// Extract the single elevation sample from a response body.
    pub fn parse_body(self, body: &[u8]) -> Result<f64, ElevationError> {
        let sample = match self {
            Self::OpenElevation => {
                let payload: OpenElevationResponse = serde_json::from_slice(body)?;
                payload.results.first().and_then(|s| s.elevation)
            }
            Self::OpenMeteo => {
                let payload: OpenMeteoElevationResponse = serde_json::from_slice(body)?;
                payload.elevation.and_then(|values| values.first().copied())
            }
        };
        sample
            .filter(|value| value.is_finite())
            .ok_or(ElevationError::MissingSample)
    }
}

/// Something that can look up the ground elevation of one point.
pub trait ElevationLookup: Send + Sync {
    fn lookup(&self, lat: f64, lng: f64) -> BoxFuture<'_, Result<f64, ElevationError>>;
}

/// Elevation lookups against a public HTTP provider.
pub struct HttpElevationLookup {
    client: Client,
    provider: ElevationProvider,
    base_url: String,
    timeout: Duration,
}

impl HttpElevationLookup {
    pub fn new(
        client: Client,
        provider: ElevationProvider,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            provider,
            base_url: base_url.into(),
            timeout,
        }
    }
}

impl ElevationLookup for HttpElevationLookup {
    fn lookup(&self, lat: f64, lng: f64) -> BoxFuture<'_, Result<f64, ElevationError>> {
        Box::pin(async move {
            let url = self.provider.build_url(&self.base_url, lat, lng);
            let response = self.client.get(url).timeout(self.timeout).send().await?;
            if !response.status().is_success() {
                return Err(ElevationError::Status(response.status()));
            }
            let body = response.bytes().await?;
            self.provider.parse_body(&body)
        })
    }
}

/// Value used when a lookup fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElevationFallback {
    Fixed(f64),
    /// Uniform in `[min_m, max_m]`.
    Bounded { min_m: f64, max_m: f64 },
}

impl ElevationFallback {
    pub fn sample(&self) -> f64 {
        match *self {
            Self::Fixed(meters) => meters,
            Self::Bounded { min_m, max_m } => {
                let (lo, hi) = if min_m <= max_m { (min_m, max_m) } else { (max_m, min_m) };
                if hi - lo <= f64::EPSILON {
                    return lo;
                }
                rand::rng().random_range(lo..=hi)
            }
        }
    }
}

pub struct ElevationResolver {
    lookup: Arc<dyn ElevationLookup>,
    fallback: ElevationFallback,
    timeout: Duration,
    cache: Option<ElevationCache>,
}

impl ElevationResolver {
    pub fn new(lookup: Arc<dyn ElevationLookup>, fallback: ElevationFallback) -> Self {
        Self {
            lookup,
            fallback,
            timeout: Duration::from_secs(5),
            cache: None,
        }
    }

    /// Upper bound for a whole lookup, on top of any transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache(mut self, cache: ElevationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let timeout = Duration::from_secs(config.elevation_timeout_s.max(1));
        let lookup = HttpElevationLookup::new(
            Client::new(),
            config.elevation_provider,
            config.elevation_url.clone(),
            timeout,
        );
        Self::new(Arc::new(lookup), config.elevation_fallback())
            .with_timeout(timeout)
            .with_cache(ElevationCache::new(
                Duration::from_secs(config.elevation_cache_ttl_s),
                config.elevation_cache_max_entries,
            ))
    }

    /// Elevation at (lat, lng) in whole meters. Never fails.
    pub async fn resolve(&self, lat: f64, lng: f64) -> f64 {
        if !lat.is_finite() || !lng.is_finite() {
            return self.fallback.sample().round();
        }
        if let Some(meters) = self.cache.as_ref().and_then(|cache| cache.get(lat, lng)) {
            return meters;
        }

        match self.try_resolve(lat, lng).await {
            Ok(meters) => {
                let meters = meters.round();
                if let Some(cache) = &self.cache {
                    cache.insert(lat, lng, meters);
                }
                meters
            }
            Err(err) => {
                let fallback = self.fallback.sample().round();
                tracing::warn!(
                    "Elevation lookup for ({:.5}, {:.5}) failed, using fallback {} m: {}",
                    lat,
                    lng,
                    fallback,
                    err
                );
                fallback
            }
        }
    }

    async fn try_resolve(&self, lat: f64, lng: f64) -> Result<f64, ElevationError> {
        tokio::time::timeout(self.timeout, self.lookup.lookup(lat, lng))
            .await
            .map_err(|_| ElevationError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLookup {
        result: Option<f64>,
        calls: AtomicUsize,
    }

    impl ElevationLookup for FixedLookup {
        fn lookup(&self, _lat: f64, _lng: f64) -> BoxFuture<'_, Result<f64, ElevationError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = self.result.ok_or(ElevationError::MissingSample);
            Box::pin(async move { result })
        }
    }

    struct HangingLookup;

    impl ElevationLookup for HangingLookup {
        fn lookup(&self, _lat: f64, _lng: f64) -> BoxFuture<'_, Result<f64, ElevationError>> {
            Box::pin(futures::future::pending())
        }
    }

    #[test]
    fn open_elevation_body() {
        let body = br#"{"results":[{"latitude":-34.6,"longitude":-58.4,"elevation":24.6}]}"#;
        let value = ElevationProvider::OpenElevation.parse_body(body).unwrap();
        assert_eq!(value, 24.6);
    }

    #[test]
    fn open_meteo_body() {
        let body = br#"{"elevation":[731.0]}"#;
        let value = ElevationProvider::OpenMeteo.parse_body(body).unwrap();
        assert_eq!(value, 731.0);
    }

    #[test]
    fn empty_or_malformed_bodies_fail() {
        assert!(matches!(
            ElevationProvider::OpenElevation.parse_body(br#"{"results":[]}"#),
            Err(ElevationError::MissingSample)
        ));
        assert!(matches!(
            ElevationProvider::OpenElevation.parse_body(br#"{"results":[{"elevation":null}]}"#),
            Err(ElevationError::MissingSample)
        ));
        assert!(matches!(
            ElevationProvider::OpenMeteo.parse_body(b"<html>"),
            Err(ElevationError::Decode(_))
        ));
    }

    #[test]
    fn provider_urls() {
        assert_eq!(
            ElevationProvider::OpenElevation.build_url("http://x/lookup", -34.5, -58.25),
            "http://x/lookup?locations=-34.500000,-58.250000"
        );
        assert_eq!(
            ElevationProvider::OpenMeteo.build_url("http://x/elevation?key=1", -34.5, -58.25),
            "http://x/elevation?key=1&latitude=-34.500000&longitude=-58.250000"
        );
        assert_eq!(ElevationProvider::parse(" Open-Meteo "), Some(ElevationProvider::OpenMeteo));
        assert_eq!(ElevationProvider::parse("srtm"), None);
    }

    #[test]
    fn bounded_fallback_stays_in_range() {
        let fallback = ElevationFallback::Bounded {
            min_m: 30.0,
            max_m: 20.0,
        };
        for _ in 0..100 {
            let value = fallback.sample();
            assert!((20.0..=30.0).contains(&value));
        }
    }

    #[tokio::test]
    async fn success_is_rounded_and_cached() {
        let lookup = Arc::new(FixedLookup {
            result: Some(24.6),
            calls: AtomicUsize::new(0),
        });
        let resolver = ElevationResolver::new(lookup.clone(), ElevationFallback::Fixed(25.0))
            .with_cache(ElevationCache::new(Duration::from_secs(60), 16));

        assert_eq!(resolver.resolve(-34.6, -58.4).await, 25.0);
        assert_eq!(resolver.resolve(-34.6, -58.4).await, 25.0);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_uses_fallback_and_is_not_cached() {
        let lookup = Arc::new(FixedLookup {
            result: None,
            calls: AtomicUsize::new(0),
        });
        let resolver = ElevationResolver::new(lookup.clone(), ElevationFallback::Fixed(25.0))
            .with_cache(ElevationCache::new(Duration::from_secs(60), 16));

        assert_eq!(resolver.resolve(-34.6, -58.4).await, 25.0);
        assert_eq!(resolver.resolve(-34.6, -58.4).await, 25.0);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_provider_times_out_to_fallback() {
        let resolver = ElevationResolver::new(Arc::new(HangingLookup), ElevationFallback::Fixed(7.0))
            .with_timeout(Duration::from_secs(3));
        assert_eq!(resolver.resolve(-34.6, -58.4).await, 7.0);
    }
}
