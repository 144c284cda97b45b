//! IP geolocation lookup.

use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Geolocation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed geolocation response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Empty geolocation response")]
    EmptyBody,

    #[error("Geolocation lookup timed out")]
    Timeout,
}

/// Lookup result. Every field is optional; services omit what they don't know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeoInfo {
    pub city: Option<String>,
    pub country: Option<String>,
    /// IANA zone name, e.g. `Europe/Berlin`
    pub timezone: Option<String>,
}

impl GeoInfo {
    /// "City, Country" when both are known, otherwise "Unknown"
    pub fn location(&self) -> String {
        match (non_empty(&self.city), non_empty(&self.country)) {
            (Some(city), Some(country)) => format!("{}, {}", city, country),
            _ => "Unknown".to_string(),
        }
    }

    pub fn timezone(&self) -> Option<&str> {
        non_empty(&self.timezone)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Resolves an address to a rough location
pub trait GeoLookup: Send + Sync + 'static {
    fn lookup(&self, ip: IpAddr) -> impl Future<Output = Result<GeoInfo, GeoError>> + Send;
}

/// JSON-over-HTTP lookup against an ip-api style endpoint
#[derive(Debug, Clone)]
pub struct HttpGeoLookup {
    client: reqwest::Client,
    /// URL template; `{ip}` is replaced with the address
    endpoint: String,
}

impl HttpGeoLookup {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn url(&self, ip: IpAddr) -> String {
        self.endpoint.replace("{ip}", &ip.to_string())
    }
}

impl GeoLookup for HttpGeoLookup {
    async fn lookup(&self, ip: IpAddr) -> Result<GeoInfo, GeoError> {
        let response = self.client.get(self.url(ip)).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        parse_response(&body)
    }
}

pub fn parse_response(body: &[u8]) -> Result<GeoInfo, GeoError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(GeoError::EmptyBody);
    }
    Ok(serde_json::from_slice(body)?)
}
