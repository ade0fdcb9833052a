//! # Mandi Market Data
//!
//! Aggregation and caching layer for Indian agricultural market data.
//! Reconciles heterogeneous government open-data feeds (Agmarknet, OGD)
//! into one canonical price model, caches results with per-data-type TTLs,
//! and degrades gracefully through a multi-tier fallback chain when sources
//! are slow, disabled, or failing.
//!
//! ## Usage
//!
//! Construct the configuration and cache once at process start and inject
//! them into the service:
//!
//! ```no_run
//! use std::sync::Arc;
//! use mandi_market_data::{CacheStore, MarketApiConfig, MarketDataService, Timeframe};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(MarketApiConfig::from_env()?);
//! let cache = Arc::new(CacheStore::open("market_cache.json"));
//! let service = MarketDataService::new(config, cache)?;
//!
//! let prices = service.get_commodity_prices(None).await;
//! for price in &prices {
//!     println!("{}: ₹{:.0} ({})", price.name, price.current_price, price.market);
//! }
//!
//! let overview = service.get_market_overview(Timeframe::Week).await;
//! println!("sentiment: {:?}", overview.sentiment);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! MarketDataService (orchestrator)
//!     ↓ cache hit?          → CacheStore (TTL + JSON file persistence)
//!     ↓ miss
//! MarketDataSource chain    → Agmarknet → OGD
//!     ↓
//! normalize                 → CommodityPrice / overview / listings / analytics
//!     ↓
//! CacheStore.set, return
//! ```
//!
//! On any source failure the orchestrator serves stale cache if one exists,
//! and a hard-coded fallback dataset otherwise. Public query methods never
//! return an error; the only fallible surface is configuration load at
//! process start.
//!
//! ## A note on synthesized figures
//!
//! The upstream feeds publish modal prices but no historical deltas.
//! Change, high/low, volume, and history series are therefore fabricated
//! placeholders, reproducible via seeded randomness and flagged through
//! `CommodityPrice::synthetic`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod normalize;
pub mod service;
pub mod source;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use cache::CacheStore;
pub use config::MarketApiConfig;
pub use error::{ConfigError, NormalizeError, SourceError};
pub use service::MarketDataService;
pub use source::{FetchOptions, MarketDataSource, RawRecord};
pub use sources::{AgmarknetSource, OgdSource};
pub use types::{
    CacheStatus, Category, CommodityPrice, CropListing, DataType, ListingFilters, MarketAnalytics,
    MarketOverview, PriceQueryOptions, PricePoint, Sentiment, Source, Timeframe,
};
