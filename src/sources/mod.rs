//! Source adapter implementations

pub mod agmarknet;
pub mod ogd;

pub use agmarknet::AgmarknetSource;
pub use ogd::OgdSource;

use crate::{
    config::SourceConfig,
    constants::{REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::SourceError,
    source::{FetchOptions, RawRecord, RecordsResponse},
};
use reqwest::Client;
use std::time::Duration;

/// Build the shared HTTP client used by the open-data adapters
pub(crate) fn build_client() -> Result<Client, SourceError> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(SourceError::Network)
}

/// Build the resource API URL for a fetch
///
/// Query string shape: `api-key=…&format=json&limit=…&offset=…&filters[k]=v…`.
pub(crate) fn build_url(config: &SourceConfig, options: &FetchOptions) -> String {
    let resource_id = config.resource_id.as_deref().unwrap_or_default();
    let mut url = format!(
        "{}/{}?api-key={}&format=json&limit={}&offset={}",
        config.base_url,
        resource_id,
        config.api_key.as_deref().unwrap_or_default(),
        options.limit,
        options.offset,
    );

    for (field, value) in &options.filters {
        url.push_str(&format!("&filters[{}]={}", field, value));
    }

    url
}

/// Issue one GET against an open-data resource endpoint and decode the
/// `records` array
pub(crate) async fn fetch_resource(
    client: &Client,
    config: &SourceConfig,
    source_name: &'static str,
    options: &FetchOptions,
) -> Result<Vec<RawRecord>, SourceError> {
    let url = build_url(config, options);
    tracing::debug!(source = source_name, limit = options.limit, offset = options.offset, "fetching records");

    let response = client.get(&url).send().await.map_err(SourceError::Network)?;

    if response.status().as_u16() == 429 {
        return Err(SourceError::RateLimited);
    }

    if !response.status().is_success() {
        return Err(SourceError::Api {
            status: response.status().as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    let body = response.text().await.map_err(SourceError::Network)?;
    let decoded: RecordsResponse = serde_json::from_str(&body).map_err(|e| {
        SourceError::InvalidResponse(format!("failed to parse {} response: {}", source_name, e))
    })?;

    tracing::debug!(
        source = source_name,
        count = decoded.records.len(),
        "fetched records"
    );

    Ok(decoded.records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SourceConfig {
        SourceConfig {
            enabled: true,
            api_key: Some("test-key".to_string()),
            base_url: "https://api.data.gov.in/resource".to_string(),
            resource_id: Some("abc-123".to_string()),
            rate_limit: 100,
        }
    }

    #[test]
    fn url_carries_auth_pagination_and_filters() {
        let mut options = FetchOptions {
            limit: 25,
            offset: 50,
            filters: Vec::new(),
        };
        options
            .filters
            .push(("state".to_string(), "Punjab".to_string()));

        let url = build_url(&config(), &options);
        assert_eq!(
            url,
            "https://api.data.gov.in/resource/abc-123?api-key=test-key&format=json&limit=25&offset=50&filters[state]=Punjab"
        );
    }

    #[test]
    fn records_response_tolerates_field_aliases() {
        let body = r#"{"records":[
            {"commodity":"Wheat","market":"Azadpur","state":"Delhi","modal_price":"2250"},
            {"Commodity":"Onion","Market":"Vashi","State":"Maharashtra","Modal_Price":"1400"}
        ]}"#;
        let decoded: RecordsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.records[1].commodity.as_deref(), Some("Onion"));
        assert_eq!(decoded.records[1].modal_price.as_deref(), Some("1400"));
    }

    #[test]
    fn records_response_defaults_to_empty() {
        let decoded: RecordsResponse = serde_json::from_str("{}").unwrap();
        assert!(decoded.records.is_empty());
    }
}
