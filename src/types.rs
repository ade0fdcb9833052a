//! Types for the agricultural market data layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Data sources a record can originate from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Agmarknet mandi price feed (data.gov.in)
    Agmarknet,
    /// Open Government Data platform resource API
    Ogd,
    /// Hard-coded fallback dataset
    Fallback,
    /// Test-only scripted source
    Mock,
}

impl Source {
    /// Get the source tag string
    pub fn tag(&self) -> &'static str {
        match self {
            Source::Agmarknet => "agmarknet",
            Source::Ogd => "ogd",
            Source::Fallback => "fallback",
            Source::Mock => "mock",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Commodity categories inferred from the commodity name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Grains,
    Oilseeds,
    Vegetables,
    Fruits,
    Dairy,
    Sweeteners,
    Pulses,
    Others,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Grains => "grains",
            Category::Oilseeds => "oilseeds",
            Category::Vegetables => "vegetables",
            Category::Fruits => "fruits",
            Category::Dairy => "dairy",
            Category::Sweeteners => "sweeteners",
            Category::Pulses => "pulses",
            Category::Others => "others",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market sentiment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

/// Crop listing lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Available,
    Pending,
    Sold,
}

/// Supported chart timeframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl Timeframe {
    /// Number of days covered by the timeframe
    pub fn days(&self) -> u32 {
        match self {
            Timeframe::Week => 7,
            Timeframe::Month => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
        }
    }

    /// Parse a timeframe string, defaulting to 30d on anything unrecognized
    pub fn parse_or_month(s: &str) -> Self {
        match s {
            "7d" => Timeframe::Week,
            _ => Timeframe::Month,
        }
    }
}

/// Logical query shapes, used as cache key prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    CommodityPrices,
    MarketOverview,
    CropListings,
    PriceHistory,
    MarketAnalytics,
}

impl DataType {
    /// Cache key prefix for this data type
    pub fn prefix(&self) -> &'static str {
        match self {
            DataType::CommodityPrices => "commodity_prices",
            DataType::MarketOverview => "market_overview",
            DataType::CropListings => "crop_listings",
            DataType::PriceHistory => "price_history",
            DataType::MarketAnalytics => "market_analytics",
        }
    }
}

/// Canonical commodity price record
///
/// Prices are INR modal prices as reported by the mandi. When an upstream
/// source carries no historical deltas, `change`, `change_percent`,
/// `high_24h`, `low_24h` and `volume` are synthesized placeholders and
/// `synthetic` is set — they must not be presented as a real market signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommodityPrice {
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// Modal price in INR
    pub current_price: f64,
    /// Absolute change in INR
    pub change: f64,
    pub change_percent: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    /// Free-text volume with unit, e.g. "1200 tons"
    pub volume: String,
    pub category: Category,
    /// Mandi / market name
    pub market: String,
    pub state: String,
    pub last_updated: DateTime<Utc>,
    pub source: Source,
    /// True when the change/high/low/volume figures were fabricated
    pub synthetic: bool,
}

impl CommodityPrice {
    /// Parse the leading integer out of the free-text volume field
    pub fn volume_tons(&self) -> u64 {
        self.volume
            .split_whitespace()
            .next()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

/// Per-commodity metric shown on the overview panel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketMetric {
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub volume: String,
    pub sentiment: Sentiment,
}

/// One point of a chartable per-day price series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    /// Display date, e.g. "Aug 23"
    pub date: String,
    /// Commodity name (lowercased) -> price
    pub prices: std::collections::BTreeMap<String, f64>,
}

/// Largest movers by percentage change
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMover {
    pub name: String,
    pub change: f64,
    pub change_percent: f64,
}

/// Derived aggregate over a batch of commodity prices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    /// Sum of modal prices in INR
    pub total_market_value: f64,
    pub total_volume: String,
    pub active_markets: usize,
    pub average_price_change: f64,
    pub metrics: Vec<MarketMetric>,
    pub price_data: Vec<PricePoint>,
    pub top_movers: Vec<TopMover>,
    pub sentiment: Sentiment,
    pub last_updated: DateTime<Utc>,
}

/// Seller placeholder attached to a synthesized listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerInfo {
    pub name: String,
    pub rating: f64,
    pub verified: bool,
    pub phone: String,
}

/// A tradable unit synthesized from a commodity price
///
/// Listings are regenerated on every normalization pass and never
/// persisted independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropListing {
    pub id: String,
    pub crop_type: String,
    pub quantity: u64,
    pub unit: String,
    /// INR per unit
    pub price_per_unit: f64,
    pub total_price: f64,
    pub quality: String,
    pub harvest_date: String,
    pub location: String,
    pub state: String,
    pub seller: SellerInfo,
    pub description: String,
    pub status: ListingStatus,
    pub expires_in: String,
    pub source: Source,
}

/// Traded volume per crop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeData {
    pub crop: String,
    pub volume: u64,
    /// INR
    pub value: f64,
}

/// Market share slice, in percent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketShare {
    pub name: String,
    pub value: f64,
}

/// Textual insight derived from observed changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInsight {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub trend: Sentiment,
    pub percentage: f64,
}

/// Derived analytics over a batch of commodity prices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalytics {
    pub price_history: Vec<PricePoint>,
    pub volume_data: Vec<VolumeData>,
    /// Percentages summing to ~100
    pub market_share: Vec<MarketShare>,
    pub insights: Vec<MarketInsight>,
    pub total_market_value: f64,
    pub total_volume: u64,
}

/// Introspection data for a single cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub key: String,
    /// Unix milliseconds
    pub timestamp: i64,
    pub ttl_secs: u64,
    pub age_secs: u64,
    pub is_valid: bool,
}

/// Operational snapshot of the cache store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub entries: usize,
    /// Estimated serialized size in bytes
    pub total_size: usize,
    pub oldest_entry: Option<CacheMetadata>,
    pub newest_entry: Option<CacheMetadata>,
}

/// Query options for commodity price fetches
///
/// Serialized canonically into the cache key, so two calls with identical
/// options always hit the same entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQueryOptions {
    pub category: Option<Category>,
    pub state: Option<String>,
    pub market: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Filters for crop listing queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilters {
    pub crop_type: Option<String>,
    pub quality: Option<String>,
    pub state: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub status: Option<ListingStatus>,
}
