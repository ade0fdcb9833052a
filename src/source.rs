//! Source adapter abstraction over external market data providers

use crate::{error::SourceError, types::Source};
use async_trait::async_trait;
use serde::Deserialize;

/// Options for a single fetch against a provider
///
/// Translates into the open-data query string
/// `api-key=…&format=json&limit=…&offset=…&filters[k]=v…`.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub limit: u32,
    pub offset: u32,
    /// Free-form `filters[<field>]=<value>` pairs passed through verbatim
    pub filters: Vec<(String, String)>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            limit: crate::constants::DEFAULT_FETCH_LIMIT,
            offset: 0,
            filters: Vec::new(),
        }
    }
}

/// Raw, provider-shaped mandi price record
///
/// Government feeds are inconsistent about field casing, so every field
/// carries its observed aliases. Nothing is required at deserialize time;
/// the normalizer decides what makes a record usable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "Commodity")]
    pub commodity: Option<String>,
    #[serde(default, alias = "Market")]
    pub market: Option<String>,
    #[serde(default, alias = "State")]
    pub state: Option<String>,
    #[serde(default, alias = "Modal_Price", alias = "price")]
    pub modal_price: Option<String>,
    #[serde(default)]
    pub arrival_date: Option<String>,
    #[serde(default, alias = "Variety")]
    pub variety: Option<String>,
}

/// Wire shape of an open-data resource API response
#[derive(Debug, Deserialize)]
pub struct RecordsResponse {
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

/// Trait for market data source adapters
///
/// One implementation per external provider. Adapters issue exactly one
/// HTTP GET per call and surface failures as [`SourceError`]; retries and
/// fallback are the orchestrator's responsibility.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch raw records from the provider
    async fn fetch_records(&self, options: &FetchOptions) -> Result<Vec<RawRecord>, SourceError>;

    /// The source tag stamped onto records normalized from this adapter
    fn source(&self) -> Source;

    /// Returns the name of this source
    fn name(&self) -> &'static str {
        self.source().tag()
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Scripted source for orchestrator tests, with call counting
    pub struct MockSource {
        records: Arc<Mutex<Option<Vec<RawRecord>>>>,
        fail: Arc<Mutex<bool>>,
        call_count: Arc<Mutex<usize>>,
        delay_ms: Arc<Mutex<u64>>,
    }

    impl Default for MockSource {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockSource {
        pub fn new() -> Self {
            Self {
                records: Arc::new(Mutex::new(None)),
                fail: Arc::new(Mutex::new(false)),
                call_count: Arc::new(Mutex::new(0)),
                delay_ms: Arc::new(Mutex::new(0)),
            }
        }

        /// Make every fetch take this long, for in-flight dedup tests
        pub fn set_delay_ms(&self, delay_ms: u64) {
            *self.delay_ms.lock().unwrap() = delay_ms;
        }

        /// Script a successful response
        pub fn set_records(&self, records: Vec<RawRecord>) {
            *self.records.lock().unwrap() = Some(records);
            *self.fail.lock().unwrap() = false;
        }

        /// Script every subsequent fetch to fail
        pub fn set_failing(&self) {
            *self.fail.lock().unwrap() = true;
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }

        /// Build a minimal well-formed record
        pub fn record(commodity: &str, market: &str, state: &str, price: &str) -> RawRecord {
            RawRecord {
                commodity: Some(commodity.to_string()),
                market: Some(market.to_string()),
                state: Some(state.to_string()),
                modal_price: Some(price.to_string()),
                ..RawRecord::default()
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for MockSource {
        async fn fetch_records(
            &self,
            options: &FetchOptions,
        ) -> Result<Vec<RawRecord>, SourceError> {
            *self.call_count.lock().unwrap() += 1;

            let delay_ms = *self.delay_ms.lock().unwrap();
            if delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }

            if *self.fail.lock().unwrap() {
                return Err(SourceError::Api {
                    status: 503,
                    body: "scripted failure".to_string(),
                });
            }

            let records = self
                .records
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| SourceError::InvalidResponse("no scripted records".to_string()))?;

            Ok(records
                .into_iter()
                .skip(options.offset as usize)
                .take(options.limit as usize)
                .collect())
        }

        fn source(&self) -> Source {
            Source::Mock
        }
    }
}
