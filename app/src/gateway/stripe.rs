use super::{
    GatewayError, PayoutGateway, PayoutId, PayoutRecord, PayoutRequest, PayoutStatus, SecretKey,
};
use crate::money::Cents;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

pub struct Config {
    pub api_url: Url,
    pub secret_key: SecretKey,
}

/// Issues payouts through the Stripe Payouts API.
#[derive(Debug, Clone)]
pub struct Stripe {
    payouts_url: String,
    secret_key: SecretKey,
    client: reqwest::Client,
}

impl Stripe {
    pub fn new(config: Config) -> Self {
        let base = config.api_url.as_str().trim_end_matches('/');
        Self {
            payouts_url: format!("{}/v1/payouts", base),
            secret_key: config.secret_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PayoutGateway for Stripe {
    async fn create_instant_payout(
        &self,
        request: &PayoutRequest,
    ) -> Result<PayoutRecord, GatewayError> {
        let response = self
            .client
            .post(&self.payouts_url)
            .bearer_auth(self.secret_key.as_str())
            .form(&form_fields(request))
            .send()
            .await?;

        if response.status().is_success() {
            let payout: PayoutBody = response.json().await?;
            Ok(payout.into_record())
        } else {
            let status = response.status();
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|envelope| envelope.error.message);
            log::warn!("stripe refused payout with status {}: {:?}", status, message);
            Err(GatewayError::Rejected { message })
        }
    }
}

/// Encodes a payout request as the form fields expected by `POST /v1/payouts`.
fn form_fields(request: &PayoutRequest) -> Vec<(String, String)> {
    let mut fields = vec![
        ("amount".to_owned(), request.amount.0.to_string()),
        ("currency".to_owned(), request.currency.code().to_owned()),
        ("destination".to_owned(), request.destination.0.clone()),
        ("method".to_owned(), request.method.as_str().to_owned()),
    ];
    fields.extend(
        request
            .metadata
            .iter()
            .map(|(key, value)| (format!("metadata[{}]", key), value.clone())),
    );
    fields
}

#[derive(Debug, Deserialize)]
struct PayoutBody {
    id: String,
    status: String,
    amount: i64,
}

impl PayoutBody {
    fn into_record(self) -> PayoutRecord {
        PayoutRecord {
            id: PayoutId(self.id),
            status: PayoutStatus::parse(&self.status),
            amount: Cents(self.amount),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}
