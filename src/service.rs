//! Market data orchestrator
//!
//! The façade the rest of the application consumes. Every public query
//! follows the same policy: cache-aside read, single-flight live fetch
//! across the enabled sources in order, then the degradation chain:
//! stale cache if any entry exists, hard-coded fallback dataset otherwise.
//! No public method ever returns an error; failures degrade silently and
//! are logged with their cause.

use crate::{
    cache::CacheStore,
    config::MarketApiConfig,
    constants::{DEFAULT_FETCH_LIMIT, DERIVED_QUERY_LIMIT},
    error::SourceError,
    normalize,
    source::{FetchOptions, MarketDataSource},
    sources::{AgmarknetSource, OgdSource},
    types::{
        CacheStatus, Category, CommodityPrice, CropListing, DataType, ListingFilters,
        MarketAnalytics, MarketOverview, PriceQueryOptions, PricePoint, Source, Timeframe,
    },
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Orchestrating market data service
///
/// Construct once at process start with an explicit config and cache store,
/// then share by reference. Owns policy only: it never mutates cache entry
/// internals, only calls `get`/`set`/`clear`.
pub struct MarketDataService {
    config: Arc<MarketApiConfig>,
    cache: Arc<CacheStore>,
    sources: Vec<Arc<dyn MarketDataSource>>,
    /// Per-cache-key locks so concurrent identical queries share one fetch
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MarketDataService {
    /// Wire the service from configuration, building one adapter per
    /// enabled source in fallback order (Agmarknet first, then OGD)
    pub fn new(config: Arc<MarketApiConfig>, cache: Arc<CacheStore>) -> Result<Self, SourceError> {
        let mut sources: Vec<Arc<dyn MarketDataSource>> = Vec::new();
        if config.agmarknet.enabled {
            sources.push(Arc::new(AgmarknetSource::new(config.agmarknet.clone())?));
        }
        if config.ogd.enabled {
            sources.push(Arc::new(OgdSource::new(config.ogd.clone())?));
        }

        Ok(Self::with_sources(config, cache, sources))
    }

    /// Wire the service with explicit source adapters (tests inject mocks)
    pub fn with_sources(
        config: Arc<MarketApiConfig>,
        cache: Arc<CacheStore>,
        sources: Vec<Arc<dyn MarketDataSource>>,
    ) -> Self {
        Self {
            config,
            cache,
            sources,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch commodity prices, with caching and the full fallback chain
    pub async fn get_commodity_prices(
        &self,
        options: Option<PriceQueryOptions>,
    ) -> Vec<CommodityPrice> {
        let options = options.unwrap_or_default();
        let key = cache_key(DataType::CommodityPrices, &options);

        if let Some(cached) = self.cached::<Vec<CommodityPrice>>(&key) {
            tracing::debug!(key, "returning cached commodity prices");
            return cached;
        }

        let lock = self.key_lock(&key).await;
        let prices = {
            let _guard = lock.lock().await;

            // Another caller may have populated the entry while we waited
            if let Some(cached) = self.cached::<Vec<CommodityPrice>>(&key) {
                cached
            } else if self.config.fallback.use_mock_data {
                tracing::debug!("mock data mode enabled, skipping live sources");
                apply_price_filters(fallback_prices(), &options)
            } else {
                match self.fetch_live(&options).await {
                    Ok(prices) => {
                        let filtered = apply_price_filters(prices, &options);
                        self.store(&key, &filtered, self.config.cache.ttl.prices);
                        filtered
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "all sources failed for commodity prices");
                        let degraded = match self.stale::<Vec<CommodityPrice>>(&key) {
                            Some(stale) => stale,
                            None if self.config.fallback.enabled => fallback_prices(),
                            None => Vec::new(),
                        };
                        apply_price_filters(degraded, &options)
                    }
                }
            }
        };
        self.release_key_lock(&key, &lock).await;
        prices
    }

    /// Fetch the derived market overview for a timeframe
    ///
    /// Sourced from the price query, cached independently at the overview
    /// TTL.
    pub async fn get_market_overview(&self, timeframe: Timeframe) -> MarketOverview {
        let key = format!("{}_{}", DataType::MarketOverview.prefix(), timeframe.as_str());

        if let Some(cached) = self.cached::<MarketOverview>(&key) {
            return cached;
        }

        let prices = self.derived_input().await;
        let overview = normalize::to_overview(&prices, timeframe);
        self.store(&key, &overview, self.config.cache.ttl.overview);
        overview
    }

    /// Fetch crop listings synthesized from current prices
    pub async fn get_crop_listings(&self, filters: Option<ListingFilters>) -> Vec<CropListing> {
        let filters = filters.unwrap_or_default();
        let key = cache_key(DataType::CropListings, &filters);

        if let Some(cached) = self.cached::<Vec<CropListing>>(&key) {
            return cached;
        }

        let prices = self.derived_input().await;
        let listings = apply_listing_filters(normalize::to_listings(&prices), &filters);
        self.store(&key, &listings, self.config.cache.ttl.listings);
        listings
    }

    /// Fetch a per-day price history series for one commodity
    ///
    /// No upstream history endpoint exists; the series is synthesized and
    /// cached at the historical TTL.
    pub async fn get_price_history(&self, commodity: &str, days: u32) -> Vec<PricePoint> {
        let key = format!(
            "{}_{}_{}",
            DataType::PriceHistory.prefix(),
            commodity.to_lowercase(),
            days
        );

        if let Some(cached) = self.cached::<Vec<PricePoint>>(&key) {
            return cached;
        }

        let history = normalize::synthesize_history(commodity, days);
        self.store(&key, &history, self.config.cache.ttl.historical);
        history
    }

    /// Fetch derived market analytics for a timeframe string ("7d"/"30d")
    pub async fn get_market_analytics(&self, timeframe: &str) -> MarketAnalytics {
        let timeframe = Timeframe::parse_or_month(timeframe);
        let key = format!(
            "{}_{}",
            DataType::MarketAnalytics.prefix(),
            timeframe.as_str()
        );

        if let Some(cached) = self.cached::<MarketAnalytics>(&key) {
            return cached;
        }

        let prices = self.derived_input().await;
        let analytics = normalize::to_analytics(&prices, timeframe);
        self.store(&key, &analytics, self.config.cache.ttl.overview);
        analytics
    }

    /// Explicit cache-bust: drop every entry of the given data type so the
    /// next read goes down the live-fetch path
    pub async fn refresh_data(&self, data_type: DataType) {
        let prefix = data_type.prefix();
        let mut dropped = 0usize;
        for key in self.cache.keys() {
            if key.starts_with(prefix) {
                self.cache.clear(&key);
                dropped += 1;
            }
        }
        tracing::debug!(prefix, dropped, "refreshed cached data");
    }

    /// Operational cache visibility, passed through from the store
    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    /// Try each enabled source in order; on total failure return the last
    /// error
    async fn fetch_live(
        &self,
        options: &PriceQueryOptions,
    ) -> Result<Vec<CommodityPrice>, SourceError> {
        let fetch_options = FetchOptions {
            limit: options.limit.unwrap_or(DEFAULT_FETCH_LIMIT),
            offset: options.offset.unwrap_or(0),
            filters: Vec::new(),
        };

        let mut last_error = SourceError::InvalidResponse("no sources configured".to_string());

        for source in &self.sources {
            match source.fetch_records(&fetch_options).await {
                Ok(records) => {
                    let mut prices = Vec::with_capacity(records.len());
                    for record in &records {
                        match normalize::normalize_record(record, source.source()) {
                            Ok(price) => prices.push(price),
                            Err(e) => {
                                // Drop just this record, keep the batch
                                tracing::warn!(
                                    source = source.name(),
                                    error = %e,
                                    record = ?record,
                                    "dropping malformed record"
                                );
                            }
                        }
                    }
                    return Ok(prices);
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "source failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    /// Price batch backing the derived queries
    async fn derived_input(&self) -> Vec<CommodityPrice> {
        self.get_commodity_prices(Some(PriceQueryOptions {
            limit: Some(DERIVED_QUERY_LIMIT),
            ..PriceQueryOptions::default()
        }))
        .await
    }

    fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.config.cache.enabled {
            return None;
        }
        self.cache.get(key)
    }

    fn store<T: serde::Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        if self.config.cache.enabled {
            self.cache.set(key, value, ttl_secs);
        }
    }

    /// Stale-cache leg of the fallback chain; validity is ignored on purpose
    fn stale<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let stale = self.cache.get_ignoring_validity(key);
        if stale.is_some() {
            tracing::info!(
                key,
                age_secs = self.cache.age_secs(key),
                "serving stale cache after source failure"
            );
        }
        stale
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().await;
        inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the per-key lock once no other caller is waiting on it
    async fn release_key_lock(&self, key: &str, lock: &Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        // two strong refs means only the map entry and our own clone remain
        if Arc::strong_count(lock) <= 2 {
            inflight.remove(key);
        }
    }
}

/// Deterministic cache key from data type + serialized query options
fn cache_key<T: serde::Serialize>(data_type: DataType, options: &T) -> String {
    let serialized = serde_json::to_string(options).unwrap_or_default();
    format!("{}_{}", data_type.prefix(), serialized)
}

fn apply_price_filters(
    prices: Vec<CommodityPrice>,
    options: &PriceQueryOptions,
) -> Vec<CommodityPrice> {
    prices
        .into_iter()
        .filter(|p| options.category.map_or(true, |c| p.category == c))
        .filter(|p| {
            options
                .state
                .as_deref()
                .map_or(true, |s| p.state.eq_ignore_ascii_case(s))
        })
        .filter(|p| {
            options
                .market
                .as_deref()
                .map_or(true, |m| p.market.eq_ignore_ascii_case(m))
        })
        .collect()
}

fn apply_listing_filters(
    listings: Vec<CropListing>,
    filters: &ListingFilters,
) -> Vec<CropListing> {
    listings
        .into_iter()
        .filter(|l| {
            filters
                .crop_type
                .as_deref()
                .map_or(true, |c| l.crop_type.eq_ignore_ascii_case(c))
        })
        .filter(|l| {
            filters
                .quality
                .as_deref()
                .map_or(true, |q| l.quality.eq_ignore_ascii_case(q))
        })
        .filter(|l| {
            filters
                .state
                .as_deref()
                .map_or(true, |s| l.state.eq_ignore_ascii_case(s))
        })
        .filter(|l| filters.min_price.map_or(true, |min| l.price_per_unit >= min))
        .filter(|l| filters.max_price.map_or(true, |max| l.price_per_unit <= max))
        .filter(|l| filters.status.map_or(true, |s| l.status == s))
        .collect()
}

/// Hard-coded fallback dataset, served when every source and the cache
/// have failed
///
/// Representative mandi records; `synthetic` is set since the deltas are
/// hand-written, and `source` is always `fallback`.
fn fallback_prices() -> Vec<CommodityPrice> {
    let now = Utc::now();
    vec![
        CommodityPrice {
            id: "fallback-wheat".to_string(),
            name: "Wheat".to_string(),
            symbol: "WHEA".to_string(),
            current_price: 2250.0,
            change: 50.0,
            change_percent: 2.27,
            high_24h: 2300.0,
            low_24h: 2200.0,
            volume: "1200 tons".to_string(),
            category: Category::Grains,
            market: "Azadpur Mandi".to_string(),
            state: "Delhi".to_string(),
            last_updated: now,
            source: Source::Fallback,
            synthetic: true,
        },
        CommodityPrice {
            id: "fallback-rice".to_string(),
            name: "Rice (Basmati)".to_string(),
            symbol: "RICE".to_string(),
            current_price: 3500.0,
            change: -75.0,
            change_percent: -2.10,
            high_24h: 3600.0,
            low_24h: 3450.0,
            volume: "1800 tons".to_string(),
            category: Category::Grains,
            market: "Vashi APMC".to_string(),
            state: "Maharashtra".to_string(),
            last_updated: now,
            source: Source::Fallback,
            synthetic: true,
        },
        CommodityPrice {
            id: "fallback-onion".to_string(),
            name: "Onion".to_string(),
            symbol: "ONIO".to_string(),
            current_price: 1400.0,
            change: 25.0,
            change_percent: 1.82,
            high_24h: 1470.0,
            low_24h: 1330.0,
            volume: "900 tons".to_string(),
            category: Category::Vegetables,
            market: "Koyambedu Market".to_string(),
            state: "Tamil Nadu".to_string(),
            last_updated: now,
            source: Source::Fallback,
            synthetic: true,
        },
    ]
}
