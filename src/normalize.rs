//! Data normalization and derived views
//!
//! Converts raw provider records into the canonical [`CommodityPrice`] model
//! and derives the secondary views (overview, listings, analytics) as pure
//! functions over a normalized batch.
//!
//! Upstream feeds carry no historical deltas, so change/high/low/volume are
//! synthesized as a bounded perturbation of the modal price. The perturbation
//! is drawn from an RNG seeded on the record identity, so repeated runs give
//! identical output, and every record built this way is flagged
//! `synthetic: true`.

use crate::{
    constants::SYNTHETIC_CHANGE_BOUND,
    error::NormalizeError,
    source::RawRecord,
    types::{
        Category, CommodityPrice, CropListing, ListingStatus, MarketAnalytics, MarketInsight,
        MarketMetric, MarketOverview, MarketShare, PricePoint, SellerInfo, Sentiment, Timeframe,
        TopMover, VolumeData,
    },
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};

/// Keyword table for category inference; first matching category wins
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Grains,
        &["wheat", "rice", "paddy", "corn", "maize", "barley", "millet", "bajra", "jowar", "ragi"],
    ),
    (
        Category::Oilseeds,
        &["soybean", "mustard", "groundnut", "sunflower", "cotton", "sesam", "castor"],
    ),
    (
        Category::Vegetables,
        &["potato", "onion", "tomato", "cabbage", "cauliflower", "brinjal", "okra", "chilli"],
    ),
    (
        Category::Fruits,
        &["mango", "banana", "apple", "orange", "grape", "papaya", "guava", "pomegranate"],
    ),
    (Category::Dairy, &["milk", "ghee", "butter", "paneer"]),
    (Category::Sweeteners, &["sugar", "jaggery", "gur"]),
    (
        Category::Pulses,
        &["pulse", "lentil", "gram", "pea", "bean", "arhar", "moong", "urad", "masur"],
    ),
];

/// Infer the category from a commodity name
///
/// Case-insensitive substring match against a fixed keyword table;
/// deterministic for any given input.
pub fn categorize(name: &str) -> Category {
    let lower = name.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *category;
        }
    }
    Category::Others
}

/// Stable seed derived from a record's identity
fn seed_for(parts: &[&str]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for part in parts {
        part.hash(&mut hasher);
    }
    hasher.finish()
}

/// Normalize one raw provider record into the canonical price model
///
/// Fails per-record so the caller can drop the offender and keep the batch:
/// a missing/empty commodity name or an unparseable/negative modal price is
/// a [`NormalizeError`].
pub fn normalize_record(
    raw: &RawRecord,
    source: crate::types::Source,
) -> Result<CommodityPrice, NormalizeError> {
    let name = raw
        .commodity
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(NormalizeError::MissingField("commodity"))?
        .to_string();

    let price_text = raw
        .modal_price
        .as_deref()
        .ok_or(NormalizeError::MissingField("modal_price"))?;
    let current_price: f64 = price_text
        .trim()
        .parse()
        .map_err(|_| NormalizeError::BadPrice(price_text.to_string()))?;
    if !current_price.is_finite() || current_price < 0.0 {
        return Err(NormalizeError::BadPrice(price_text.to_string()));
    }

    let market = raw
        .market
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("Unknown Market")
        .to_string();
    let state = raw
        .state
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown State")
        .to_string();

    let id = raw
        .id
        .clone()
        .unwrap_or_else(|| slug(&format!("{}-{}", name, market)));

    // No historical feed exists, so the deltas are fabricated around the
    // modal price and labeled as such.
    let mut rng = StdRng::seed_from_u64(seed_for(&[&name, &market, price_text]));
    let change = current_price * rng.gen_range(-SYNTHETIC_CHANGE_BOUND..=SYNTHETIC_CHANGE_BOUND);
    let change_percent = if current_price > 0.0 {
        (change / current_price) * 100.0
    } else {
        0.0
    };
    let volume_tons: u64 = rng.gen_range(1000..6000);

    let last_updated = raw
        .arrival_date
        .as_deref()
        .and_then(parse_arrival_date)
        .unwrap_or_else(Utc::now);

    Ok(CommodityPrice {
        symbol: symbol_of(&name),
        category: categorize(&name),
        id,
        name,
        current_price,
        change,
        change_percent,
        high_24h: current_price * (1.0 + SYNTHETIC_CHANGE_BOUND),
        low_24h: current_price * (1.0 - SYNTHETIC_CHANGE_BOUND),
        volume: format!("{} tons", volume_tons),
        market,
        state,
        last_updated,
        source,
        synthetic: true,
    })
}

/// Agmarknet reports arrival dates as DD/MM/YYYY
fn parse_arrival_date(text: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn symbol_of(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_uppercase()
}

fn slug(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

fn sentiment(change_percent: f64, threshold: f64) -> Sentiment {
    if change_percent > threshold {
        Sentiment::Bullish
    } else if change_percent < -threshold {
        Sentiment::Bearish
    } else {
        Sentiment::Neutral
    }
}

/// Build a per-day price series around the given commodities' current prices
///
/// Synthetic charting data; the variation is seeded on the commodity name so
/// the series is stable across calls.
pub fn synthesize_series(
    commodities: &[&CommodityPrice],
    days: u32,
    spread: f64,
) -> Vec<PricePoint> {
    let today = Utc::now().date_naive();

    (0..days)
        .map(|i| {
            let date = today - Duration::days((days - i) as i64);
            let mut prices = BTreeMap::new();

            for c in commodities {
                let mut rng =
                    StdRng::seed_from_u64(seed_for(&[&c.name, &date.to_string()]));
                let variation = c.current_price * rng.gen_range(-spread..=spread);
                prices.insert(c.name.to_lowercase(), c.current_price + variation);
            }

            PricePoint {
                date: date.format("%b %-d").to_string(),
                prices,
            }
        })
        .collect()
}

/// Synthesize a per-day price history for a single commodity
pub fn synthesize_history(commodity: &str, days: u32) -> Vec<PricePoint> {
    let today = Utc::now().date_naive();

    (0..days)
        .map(|i| {
            let date = today - Duration::days((days - i) as i64);
            let mut rng = StdRng::seed_from_u64(seed_for(&[commodity, &date.to_string()]));
            let mut prices = BTreeMap::new();
            prices.insert(commodity.to_lowercase(), rng.gen_range(2000.0..2500.0));

            PricePoint {
                date: date.format("%b %-d").to_string(),
                prices,
            }
        })
        .collect()
}

/// Derive the market overview aggregate from a normalized batch
pub fn to_overview(commodities: &[CommodityPrice], timeframe: Timeframe) -> MarketOverview {
    let total_volume: u64 = commodities.iter().map(|c| c.volume_tons()).sum();
    let total_value: f64 = commodities.iter().map(|c| c.current_price).sum();
    let avg_change = if commodities.is_empty() {
        0.0
    } else {
        commodities.iter().map(|c| c.change_percent).sum::<f64>() / commodities.len() as f64
    };

    let active_markets = commodities
        .iter()
        .map(|c| c.market.as_str())
        .collect::<HashSet<_>>()
        .len();

    let mut by_price: Vec<&CommodityPrice> = commodities.iter().collect();
    by_price.sort_by(|a, b| b.current_price.total_cmp(&a.current_price));
    let top: Vec<&CommodityPrice> = by_price.into_iter().take(4).collect();

    let metrics = top
        .iter()
        .map(|c| MarketMetric {
            name: c.name.clone(),
            price: c.current_price,
            change: c.change_percent,
            volume: c.volume.clone(),
            sentiment: sentiment(c.change_percent, 2.0),
        })
        .collect();

    let price_data = synthesize_series(&top, timeframe.days(), SYNTHETIC_CHANGE_BOUND);

    let mut by_move: Vec<&CommodityPrice> = commodities.iter().collect();
    by_move.sort_by(|a, b| {
        b.change_percent
            .abs()
            .total_cmp(&a.change_percent.abs())
    });
    let top_movers = by_move
        .into_iter()
        .take(3)
        .map(|c| TopMover {
            name: c.name.clone(),
            change: c.change,
            change_percent: c.change_percent,
        })
        .collect();

    MarketOverview {
        total_market_value: total_value,
        total_volume: format!("{:.1}K tons", total_volume as f64 / 1000.0),
        active_markets,
        average_price_change: avg_change,
        metrics,
        price_data,
        top_movers,
        sentiment: sentiment(avg_change, 1.0),
        last_updated: Utc::now(),
    }
}

/// Synthesize one tradable listing per price (first 10)
///
/// Quantity, quality and seller are deterministic placeholders, not real
/// inventory. Regenerated on every pass.
pub fn to_listings(commodities: &[CommodityPrice]) -> Vec<CropListing> {
    const QUALITIES: &[&str] = &["premium", "grade-a", "grade-b"];

    commodities
        .iter()
        .take(10)
        .map(|c| {
            let mut rng = StdRng::seed_from_u64(seed_for(&[&c.id, "listing"]));
            let quantity: u64 = rng.gen_range(1000..11000);
            let price_per_unit = c.current_price / 100.0;
            let quality = QUALITIES[rng.gen_range(0..QUALITIES.len())];
            let harvest_offset = rng.gen_range(0..90);
            let harvest_date = (Utc::now() - Duration::days(harvest_offset))
                .format("%Y-%m-%d")
                .to_string();

            CropListing {
                id: format!("listing-{}", c.id),
                crop_type: c.name.to_lowercase(),
                quantity,
                unit: "quintals".to_string(),
                price_per_unit,
                total_price: price_per_unit * quantity as f64,
                quality: quality.to_string(),
                harvest_date,
                location: c.market.clone(),
                state: c.state.clone(),
                seller: SellerInfo {
                    name: format!("{} Farmers Co-op", c.market),
                    rating: 4.0 + rng.gen_range(0.0..1.0),
                    verified: rng.gen_bool(0.7),
                    phone: format!("+91-{}", rng.gen_range(6_000_000_000u64..9_999_999_999u64)),
                },
                description: format!(
                    "High-quality {} from {}. Properly stored and tested.",
                    c.name, c.state
                ),
                status: ListingStatus::Available,
                expires_in: format!("{} days", rng.gen_range(1..=7)),
                source: c.source,
            }
        })
        .collect()
}

/// Derive market analytics from a normalized batch
pub fn to_analytics(commodities: &[CommodityPrice], timeframe: Timeframe) -> MarketAnalytics {
    let leaders: Vec<&CommodityPrice> = commodities.iter().take(3).collect();
    let price_history = synthesize_series(&leaders, timeframe.days(), 0.075);

    let volume_data: Vec<VolumeData> = commodities
        .iter()
        .take(5)
        .map(|c| {
            let mut rng = StdRng::seed_from_u64(seed_for(&[&c.id, "volume"]));
            let volume: u64 = rng.gen_range(500_000..2_500_000);
            VolumeData {
                crop: c.name.clone(),
                volume,
                value: c.current_price * volume as f64,
            }
        })
        .collect();

    let total_volume: u64 = volume_data.iter().map(|v| v.volume).sum();
    let market_share = volume_data
        .iter()
        .map(|v| MarketShare {
            name: v.crop.clone(),
            value: if total_volume == 0 {
                0.0
            } else {
                (v.volume as f64 / total_volume as f64) * 100.0
            },
        })
        .collect();

    let mut insights = Vec::new();
    if let Some(leader) = commodities
        .iter()
        .max_by(|a, b| a.change_percent.abs().total_cmp(&b.change_percent.abs()))
    {
        let rising = leader.change_percent > 0.0;
        insights.push(MarketInsight {
            id: 1,
            title: format!(
                "{} Prices {}",
                leader.name,
                if rising { "Rising" } else { "Falling" }
            ),
            description: format!(
                "{} prices have {} by {:.1}% due to {}.",
                leader.name,
                if rising { "increased" } else { "decreased" },
                leader.change_percent.abs(),
                if rising { "strong demand" } else { "increased supply" },
            ),
            trend: if rising {
                Sentiment::Bullish
            } else {
                Sentiment::Bearish
            },
            percentage: leader.change_percent,
        });
    }
    insights.push(MarketInsight {
        id: 2,
        title: "Trading Volume".to_string(),
        description: format!(
            "Traded volume reached {:.1}M tons this period.",
            total_volume as f64 / 1_000_000.0
        ),
        trend: Sentiment::Neutral,
        percentage: 0.0,
    });

    MarketAnalytics {
        price_history,
        total_market_value: volume_data.iter().map(|v| v.value).sum(),
        volume_data,
        market_share,
        insights,
        total_volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RawRecord;
    use crate::types::Source;

    fn raw(commodity: &str, price: &str) -> RawRecord {
        RawRecord {
            commodity: Some(commodity.to_string()),
            market: Some("Azadpur Mandi".to_string()),
            state: Some("Delhi".to_string()),
            modal_price: Some(price.to_string()),
            ..RawRecord::default()
        }
    }

    #[test]
    fn wheat_record_normalizes_to_grains() {
        let price = normalize_record(&raw("Wheat", "2250"), Source::Agmarknet).unwrap();
        assert_eq!(price.category, Category::Grains);
        assert_eq!(price.current_price, 2250.0);
        assert_eq!(price.source, Source::Agmarknet);
        assert_eq!(price.symbol, "WHEA");
        assert!(price.synthetic);
        assert!(price.change.abs() <= 2250.0 * SYNTHETIC_CHANGE_BOUND);
    }

    #[test]
    fn missing_name_and_bad_price_are_rejected() {
        let nameless = RawRecord {
            modal_price: Some("100".to_string()),
            ..RawRecord::default()
        };
        assert!(matches!(
            normalize_record(&nameless, Source::Agmarknet),
            Err(NormalizeError::MissingField("commodity"))
        ));

        assert!(matches!(
            normalize_record(&raw("Wheat", "n/a"), Source::Agmarknet),
            Err(NormalizeError::BadPrice(_))
        ));
        assert!(matches!(
            normalize_record(&raw("Wheat", "-5"), Source::Agmarknet),
            Err(NormalizeError::BadPrice(_))
        ));
    }

    #[test]
    fn category_inference_is_deterministic() {
        for _ in 0..10 {
            assert_eq!(categorize("Basmati Rice"), Category::Grains);
            assert_eq!(categorize("MUSTARD SEED"), Category::Oilseeds);
            assert_eq!(categorize("Tomato (Hybrid)"), Category::Vegetables);
            assert_eq!(categorize("Alphonso Mango"), Category::Fruits);
            assert_eq!(categorize("Jaggery"), Category::Sweeteners);
            assert_eq!(categorize("Moong Dal"), Category::Pulses);
            assert_eq!(categorize("Arhar Dal"), Category::Pulses);
            assert_eq!(categorize("Banana (Robusta)"), Category::Fruits);
            assert_eq!(categorize("Turmeric"), Category::Others);
        }
    }

    #[test]
    fn normalization_is_reproducible() {
        let a = normalize_record(&raw("Wheat", "2250"), Source::Agmarknet).unwrap();
        let b = normalize_record(&raw("Wheat", "2250"), Source::Agmarknet).unwrap();
        assert_eq!(a.change, b.change);
        assert_eq!(a.volume, b.volume);
    }

    #[test]
    fn arrival_date_parses_indian_format() {
        let mut record = raw("Wheat", "2250");
        record.arrival_date = Some("15/08/2026".to_string());
        let price = normalize_record(&record, Source::Agmarknet).unwrap();
        assert_eq!(
            price.last_updated.date_naive(),
            NaiveDate::from_ymd_opt(2026, 8, 15).unwrap()
        );
    }

    fn batch() -> Vec<CommodityPrice> {
        ["Wheat", "Onion", "Mango", "Soybean", "Milk"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut record = raw(name, &format!("{}", 1000 + i * 500));
                record.market = Some(format!("Market {}", i % 3));
                normalize_record(&record, Source::Agmarknet).unwrap()
            })
            .collect()
    }

    #[test]
    fn overview_aggregates_batch() {
        let prices = batch();
        let overview = to_overview(&prices, Timeframe::Week);

        assert_eq!(overview.active_markets, 3);
        assert_eq!(overview.metrics.len(), 4);
        assert_eq!(overview.top_movers.len(), 3);
        assert_eq!(overview.price_data.len(), 7);
        assert_eq!(
            overview.total_market_value,
            prices.iter().map(|c| c.current_price).sum::<f64>()
        );
        // metrics ranked by price, descending
        assert!(overview.metrics[0].price >= overview.metrics[1].price);
    }

    #[test]
    fn overview_of_empty_batch_is_neutral() {
        let overview = to_overview(&[], Timeframe::Month);
        assert_eq!(overview.average_price_change, 0.0);
        assert_eq!(overview.sentiment, Sentiment::Neutral);
        assert!(overview.metrics.is_empty());
        assert_eq!(overview.price_data.len(), 30);
    }

    #[test]
    fn listings_are_synthesized_per_price() {
        let prices = batch();
        let listings = to_listings(&prices);

        assert_eq!(listings.len(), prices.len());
        let first = &listings[0];
        assert_eq!(first.price_per_unit, prices[0].current_price / 100.0);
        assert_eq!(
            first.total_price,
            first.price_per_unit * first.quantity as f64
        );
        assert_eq!(first.status, ListingStatus::Available);
        assert!(first.seller.rating >= 4.0 && first.seller.rating < 5.0);
    }

    #[test]
    fn market_share_sums_to_one_hundred() {
        let analytics = to_analytics(&batch(), Timeframe::Month);
        let total: f64 = analytics.market_share.iter().map(|s| s.value).sum();
        assert!((total - 100.0).abs() < 1e-6);
        assert_eq!(analytics.insights.len(), 2);
        assert_eq!(analytics.price_history.len(), 30);
    }

    #[test]
    fn history_series_is_stable() {
        let a = synthesize_history("Wheat", 7);
        let b = synthesize_history("Wheat", 7);
        assert_eq!(a.len(), 7);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.prices, y.prices);
        }
    }
}
