//! OGD source adapter
//!
//! Secondary provider over the Open Government Data platform. Same
//! resource-API wire shape as Agmarknet but a separately configured
//! resource, so it can point at a different dataset or mirror.

use crate::{
    config::SourceConfig,
    error::SourceError,
    source::{FetchOptions, MarketDataSource, RawRecord},
    types::Source,
};
use async_trait::async_trait;
use reqwest::Client;

/// Open Government Data platform adapter
pub struct OgdSource {
    config: SourceConfig,
    client: Client,
}

impl OgdSource {
    /// Creates a new OGD adapter from its source configuration
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let client = super::build_client()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl MarketDataSource for OgdSource {
    async fn fetch_records(&self, options: &FetchOptions) -> Result<Vec<RawRecord>, SourceError> {
        if !self.config.enabled {
            return Err(SourceError::Disabled(self.name()));
        }

        super::fetch_resource(&self.client, &self.config, self.name(), options).await
    }

    fn source(&self) -> Source {
        Source::Ogd
    }
}
