//! Environment-driven configuration for the market data layer
//!
//! Configuration is loaded once at process start and passed by reference into
//! [`crate::service::MarketDataService`]; there is no global singleton.
//! Validation is all-or-nothing: every missing field is collected into a
//! single [`ConfigError::Invalid`] rather than failing piecemeal.

use crate::constants::{
    DEFAULT_AGMARKNET_RESOURCE_ID, DEFAULT_OPEN_DATA_API_URL, DEFAULT_RATE_LIMIT,
    DEFAULT_TTL_HISTORICAL_SECS, DEFAULT_TTL_LISTINGS_SECS, DEFAULT_TTL_OVERVIEW_SECS,
    DEFAULT_TTL_PRICES_SECS,
};
use crate::error::ConfigError;

/// Per-provider source configuration
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub base_url: String,
    pub resource_id: Option<String>,
    /// Requests per hour the provider allows
    pub rate_limit: u32,
}

/// Cache TTLs per data type, in seconds
#[derive(Debug, Clone)]
pub struct CacheTtl {
    pub prices: u64,
    pub overview: u64,
    pub historical: u64,
    pub listings: u64,
}

/// Cache behavior configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: CacheTtl,
}

/// Fallback behavior configuration
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub enabled: bool,
    /// Skip live sources entirely and serve the fallback dataset (dev mode)
    pub use_mock_data: bool,
}

/// Validated, immutable market API configuration
///
/// Environment surface (all optional, with defaults):
///
/// | Variable | Default |
/// |---|---|
/// | `AGMARKNET_ENABLED` | `true` |
/// | `AGMARKNET_API_KEY` | unset |
/// | `AGMARKNET_API_URL` | data.gov.in resource API |
/// | `AGMARKNET_RESOURCE_ID` | daily mandi price resource |
/// | `AGMARKNET_RATE_LIMIT` | `100` |
/// | `OGD_ENABLED` | `false` |
/// | `OGD_API_KEY` / `OGD_API_URL` / `OGD_RESOURCE_ID` / `OGD_RATE_LIMIT` | as above |
/// | `MARKET_CACHE_ENABLED` | `true` |
/// | `MARKET_CACHE_TTL_PRICES` | `300` |
/// | `MARKET_CACHE_TTL_OVERVIEW` | `600` |
/// | `MARKET_CACHE_TTL_HISTORICAL` | `3600` |
/// | `MARKET_CACHE_TTL_LISTINGS` | `900` |
/// | `MARKET_FALLBACK_ENABLED` | `true` |
/// | `MARKET_USE_MOCK_DATA` | `false` |
#[derive(Debug, Clone)]
pub struct MarketApiConfig {
    pub agmarknet: SourceConfig,
    pub ogd: SourceConfig,
    pub cache: CacheConfig,
    pub fallback: FallbackConfig,
}

impl MarketApiConfig {
    /// Load and validate configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load and validate configuration from an arbitrary key lookup
    ///
    /// Tests inject a fake environment here instead of mutating process
    /// state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            agmarknet: SourceConfig {
                enabled: parse_bool(lookup("AGMARKNET_ENABLED"), true),
                api_key: lookup("AGMARKNET_API_KEY"),
                base_url: lookup("AGMARKNET_API_URL")
                    .unwrap_or_else(|| DEFAULT_OPEN_DATA_API_URL.to_string()),
                resource_id: Some(
                    lookup("AGMARKNET_RESOURCE_ID")
                        .unwrap_or_else(|| DEFAULT_AGMARKNET_RESOURCE_ID.to_string()),
                )
                .filter(|id| !id.is_empty()),
                rate_limit: parse_u32(lookup("AGMARKNET_RATE_LIMIT"), DEFAULT_RATE_LIMIT),
            },
            ogd: SourceConfig {
                enabled: parse_bool(lookup("OGD_ENABLED"), false),
                api_key: lookup("OGD_API_KEY"),
                base_url: lookup("OGD_API_URL")
                    .unwrap_or_else(|| DEFAULT_OPEN_DATA_API_URL.to_string()),
                resource_id: lookup("OGD_RESOURCE_ID").filter(|id| !id.is_empty()),
                rate_limit: parse_u32(lookup("OGD_RATE_LIMIT"), DEFAULT_RATE_LIMIT),
            },
            cache: CacheConfig {
                enabled: parse_bool(lookup("MARKET_CACHE_ENABLED"), true),
                ttl: CacheTtl {
                    prices: parse_u64(lookup("MARKET_CACHE_TTL_PRICES"), DEFAULT_TTL_PRICES_SECS),
                    overview: parse_u64(
                        lookup("MARKET_CACHE_TTL_OVERVIEW"),
                        DEFAULT_TTL_OVERVIEW_SECS,
                    ),
                    historical: parse_u64(
                        lookup("MARKET_CACHE_TTL_HISTORICAL"),
                        DEFAULT_TTL_HISTORICAL_SECS,
                    ),
                    listings: parse_u64(
                        lookup("MARKET_CACHE_TTL_LISTINGS"),
                        DEFAULT_TTL_LISTINGS_SECS,
                    ),
                },
            },
            fallback: FallbackConfig {
                enabled: parse_bool(lookup("MARKET_FALLBACK_ENABLED"), true),
                use_mock_data: parse_bool(lookup("MARKET_USE_MOCK_DATA"), false),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the assembled configuration, collecting every problem
    fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if !self.agmarknet.enabled && !self.ogd.enabled {
            problems.push(
                "at least one API source must be enabled (AGMARKNET_ENABLED or OGD_ENABLED)"
                    .to_string(),
            );
        }

        if self.agmarknet.enabled {
            if self.agmarknet.base_url.is_empty() {
                problems.push("AGMARKNET_API_URL is required when Agmarknet is enabled".to_string());
            }
            if self.agmarknet.resource_id.is_none() {
                problems.push(
                    "AGMARKNET_RESOURCE_ID is required when Agmarknet is enabled".to_string(),
                );
            }
        }

        if self.ogd.enabled {
            if self.ogd.base_url.is_empty() {
                problems.push("OGD_API_URL is required when OGD is enabled".to_string());
            }
            if self.ogd.resource_id.is_none() {
                problems.push("OGD_RESOURCE_ID is required when OGD is enabled".to_string());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }
}

/// Parse a boolean setting; accepts "true"/"1" case-insensitively
fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => {
            let v = v.trim().to_ascii_lowercase();
            v == "true" || v == "1"
        }
        None => default,
    }
}

/// Parse an integer setting, falling back to the default on garbage
fn parse_u32(value: Option<String>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_u64(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn defaults_load_with_agmarknet_enabled() {
        let env = HashMap::new();
        let config = MarketApiConfig::from_lookup(lookup_from(&env)).unwrap();

        assert!(config.agmarknet.enabled);
        assert!(!config.ogd.enabled);
        assert_eq!(config.agmarknet.base_url, DEFAULT_OPEN_DATA_API_URL);
        assert_eq!(
            config.agmarknet.resource_id.as_deref(),
            Some(DEFAULT_AGMARKNET_RESOURCE_ID)
        );
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl.prices, 300);
        assert_eq!(config.cache.ttl.historical, 3600);
    }

    #[test]
    fn no_source_enabled_is_a_config_error() {
        let mut env = HashMap::new();
        env.insert("AGMARKNET_ENABLED", "false");
        env.insert("OGD_ENABLED", "false");

        let err = MarketApiConfig::from_lookup(lookup_from(&env)).unwrap_err();
        let ConfigError::Invalid { problems } = err;
        assert!(problems
            .iter()
            .any(|p| p.contains("at least one API source must be enabled")));
    }

    #[test]
    fn enabled_source_missing_fields_aggregates_every_problem() {
        let mut env = HashMap::new();
        env.insert("AGMARKNET_ENABLED", "false");
        env.insert("OGD_ENABLED", "true");
        env.insert("OGD_API_URL", "");

        // OGD enabled with empty base url and no resource id: both reported at once
        let err = MarketApiConfig::from_lookup(lookup_from(&env)).unwrap_err();
        let ConfigError::Invalid { problems } = err;
        assert_eq!(problems.len(), 2);
        assert!(problems.iter().any(|p| p.contains("OGD_API_URL")));
        assert!(problems.iter().any(|p| p.contains("OGD_RESOURCE_ID")));
    }

    #[test]
    fn bool_parsing_accepts_one_and_true() {
        assert!(parse_bool(Some("1".into()), false));
        assert!(parse_bool(Some("TRUE".into()), false));
        assert!(!parse_bool(Some("yes".into()), true));
        assert!(parse_bool(None, true));
    }

    #[test]
    fn int_parsing_falls_back_on_garbage() {
        assert_eq!(parse_u32(Some("250".into()), 100), 250);
        assert_eq!(parse_u32(Some("not-a-number".into()), 100), 100);
        assert_eq!(parse_u64(None, 600), 600);
    }
}
