//! Constants and defaults for the market data layer
//!
//! Every default here can be overridden through the environment variables
//! documented on [`crate::config::MarketApiConfig`].

/// Default Agmarknet/OGD resource API base URL
pub const DEFAULT_OPEN_DATA_API_URL: &str = "https://api.data.gov.in/resource";

/// Default Agmarknet daily mandi price resource identifier
pub const DEFAULT_AGMARKNET_RESOURCE_ID: &str = "9ef84268-d588-465a-a308-a864a43d0070";

/// Default per-source rate limit (requests per hour)
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// HTTP request timeout when fetching records (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "mandi-market-data/0.1.0";

/// Default cache TTL for commodity prices (in seconds)
pub const DEFAULT_TTL_PRICES_SECS: u64 = 300;

/// Default cache TTL for derived overviews and analytics (in seconds)
pub const DEFAULT_TTL_OVERVIEW_SECS: u64 = 600;

/// Default cache TTL for historical series (in seconds)
pub const DEFAULT_TTL_HISTORICAL_SECS: u64 = 3600;

/// Default cache TTL for crop listings (in seconds)
pub const DEFAULT_TTL_LISTINGS_SECS: u64 = 900;

/// Default record count per fetch when the caller gives no limit
pub const DEFAULT_FETCH_LIMIT: u32 = 50;

/// Record count used when deriving overviews/listings/analytics
pub const DERIVED_QUERY_LIMIT: u32 = 20;

/// Bound on the synthesized change perturbation (fraction of modal price)
pub const SYNTHETIC_CHANGE_BOUND: f64 = 0.05;

/// Known market yards, exposed as a static reference list for UI pickers
pub const MARKET_YARDS: &[&str] = &[
    "Azadpur Mandi, Delhi",
    "Vashi APMC, Mumbai",
    "Koyambedu Market, Chennai",
    "Yeshwanthpur APMC, Bangalore",
    "Gaddiannaram Mandi, Hyderabad",
];

/// Known commodities, exposed as a static reference list for UI pickers
pub const COMMODITY_NAMES: &[&str] = &[
    "Wheat", "Rice", "Maize", "Bajra", "Jowar", "Soybean", "Groundnut",
    "Mustard", "Cotton", "Sugarcane", "Potato", "Onion", "Tomato",
];
