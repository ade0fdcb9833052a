//! Agmarknet source adapter
//!
//! Fetches daily mandi prices from the Government of India open-data
//! resource API (data.gov.in).

use crate::{
    config::SourceConfig,
    constants::{COMMODITY_NAMES, MARKET_YARDS},
    error::SourceError,
    source::{FetchOptions, MarketDataSource, RawRecord},
    types::Source,
};
use async_trait::async_trait;
use reqwest::Client;

/// Agmarknet mandi price adapter
pub struct AgmarknetSource {
    config: SourceConfig,
    client: Client,
}

impl AgmarknetSource {
    /// Creates a new Agmarknet adapter from its source configuration
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let client = super::build_client()?;
        Ok(Self { config, client })
    }

    /// Known market yards, for UI pickers; no network dependency
    pub fn market_yards() -> &'static [&'static str] {
        MARKET_YARDS
    }

    /// Known commodities, for UI pickers; no network dependency
    pub fn commodity_names() -> &'static [&'static str] {
        COMMODITY_NAMES
    }
}

#[async_trait]
impl MarketDataSource for AgmarknetSource {
    async fn fetch_records(&self, options: &FetchOptions) -> Result<Vec<RawRecord>, SourceError> {
        if !self.config.enabled {
            return Err(SourceError::Disabled(self.name()));
        }

        super::fetch_resource(&self.client, &self.config, self.name(), options).await
    }

    fn source(&self) -> Source {
        Source::Agmarknet
    }
}
