use super::util::with_retry;
use crate::core::valuation::{
    Endpoint, RentEstimate, ServiceError, ValuationProvider, ValueEstimate,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueResponse {
    price: f64,
    price_range_low: Option<f64>,
    price_range_high: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RentResponse {
    rent: f64,
    rent_range_low: Option<f64>,
    rent_range_high: Option<f64>,
}

/// Client for the RentCast automated valuation endpoints.
pub struct RentcastProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RentcastProvider {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("propval/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        address: &str,
    ) -> Result<(T, serde_json::Value), ServiceError> {
        let transport = |message: String| ServiceError::Transport { endpoint, message };

        let url = Url::parse_with_params(
            &format!("{}/{}", self.base_url, endpoint.path()),
            &[("address", address)],
        )
        .map_err(|e| transport(format!("Invalid URL: {e}")))?;
        debug!("Requesting {} estimate from {}", endpoint, url);

        let response = with_retry(
            || {
                self.client
                    .get(url.clone())
                    .header(API_KEY_HEADER, &self.api_key)
                    .send()
            },
            3,
            500,
        )
        .await
        .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ServiceError::Status {
                endpoint,
                status: status.as_u16(),
                message: body,
            });
        }

        let decode = |reason: String| ServiceError::Decode {
            endpoint,
            reason,
            body: body.clone(),
        };
        let raw: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| decode(e.to_string()))?;
        let parsed: T = match serde_json::from_value(raw.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %body,
                    "Failed to parse {} response", endpoint
                );
                return Err(decode(e.to_string()));
            }
        };
        Ok((parsed, raw))
    }
}

#[async_trait]
impl ValuationProvider for RentcastProvider {
    async fn fetch_value(&self, address: &str) -> Result<ValueEstimate, ServiceError> {
        let (value, raw): (ValueResponse, _) = self.get(Endpoint::Value, address).await?;
        debug!("Value estimate for {}: {:?}", address, value);
        Ok(ValueEstimate {
            price: value.price,
            price_range_low: value.price_range_low,
            price_range_high: value.price_range_high,
            raw,
        })
    }

    async fn fetch_rent(&self, address: &str) -> Result<RentEstimate, ServiceError> {
        let (rent, raw): (RentResponse, _) = self.get(Endpoint::Rent, address).await?;
        debug!("Rent estimate for {}: {:?}", address, rent);
        Ok(RentEstimate {
            rent: rent.rent,
            rent_range_low: rent.rent_range_low,
            rent_range_high: rent.rent_range_high,
            raw,
        })
    }
}
