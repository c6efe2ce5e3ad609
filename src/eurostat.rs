use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::{BASE_URL, REQUEST_TIMEOUT};
use crate::domain::DatasetDescriptor;
use crate::error::EurostatError;

pub trait StatsClient: Send + Sync {
    fn fetch(&self, descriptor: &DatasetDescriptor) -> Result<Value, EurostatError>;
}

#[derive(Clone)]
pub struct EurostatHttpClient {
    client: Client,
    base_url: String,
}

impl EurostatHttpClient {
    pub fn new() -> Result<Self, EurostatError> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, EurostatError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("eurostat-sync/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| EurostatError::EurostatHttp(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| EurostatError::EurostatHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn dataset_url(&self, descriptor: &DatasetDescriptor) -> String {
        format!("{}{}", self.base_url, descriptor.code.as_str())
    }
}

impl StatsClient for EurostatHttpClient {
    fn fetch(&self, descriptor: &DatasetDescriptor) -> Result<Value, EurostatError> {
        let url = self.dataset_url(descriptor);
        let response = self
            .client
            .get(url)
            .query(&descriptor.query_pairs())
            .send()
            .map_err(|err| EurostatError::EurostatHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Eurostat request failed".to_string());
            return Err(EurostatError::EurostatStatus { status, message });
        }
        let body = response
            .text()
            .map_err(|err| EurostatError::EurostatHttp(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| EurostatError::EurostatBody(err.to_string()))
    }
}
