//! Contains code related to paying out user balances through an external payment processor. The
//! most important abstraction exposed by this module is [`PayoutGateway`]; the production
//! implementation talks to Stripe, see [`stripe::Stripe`].

use crate::money::{Cents, Currency};
use crate::user::{self, PaymentDestination};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub mod stripe;

const GENERIC_FAILURE: &str = "the payout could not be completed";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The processor answered and refused the payout.
    #[error("{}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Rejected { message: Option<String> },
    /// The processor could not be reached, or its answer could not be understood.
    #[error("payout gateway unavailable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("secret key must start with \"{}\"", SecretKey::PREFIX)]
    InvalidSecretKey,
    #[error("publishable key must start with \"{}\"", PublishableKey::PREFIX)]
    InvalidPublishableKey,
}

/// The opaque identifier the processor assigned to a payout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutMethod {
    Instant,
}

impl PayoutMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutMethod::Instant => "instant",
        }
    }
}

/// Status of a payout as reported by the processor's immediate response. Statuses this module
/// does not know about are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutStatus {
    Pending,
    InTransit,
    Paid,
    Failed,
    Canceled,
    Other(String),
}

impl PayoutStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => PayoutStatus::Pending,
            "in_transit" => PayoutStatus::InTransit,
            "paid" => PayoutStatus::Paid,
            "failed" => PayoutStatus::Failed,
            "canceled" => PayoutStatus::Canceled,
            other => PayoutStatus::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::InTransit => "in_transit",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Failed => "failed",
            PayoutStatus::Canceled => "canceled",
            PayoutStatus::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayoutRequest {
    pub amount: Cents,
    pub currency: Currency,
    pub destination: PaymentDestination,
    pub method: PayoutMethod,
    pub metadata: BTreeMap<String, String>,
}

impl PayoutRequest {
    /// An instant payout in the service currency, tagged with the user it belongs to.
    pub fn instant(amount: Cents, destination: PaymentDestination, user: &user::Name) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("user".to_owned(), user.0.clone());
        Self {
            amount,
            currency: Currency::Eur,
            destination,
            method: PayoutMethod::Instant,
            metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutRecord {
    pub id: PayoutId,
    pub status: PayoutStatus,
    pub amount: Cents,
}

/// Represents a gateway into the payment processor. Calls are not retried and there is no
/// idempotency key, so every call may move real money.
#[async_trait]
pub trait PayoutGateway: Send + Sync {
    async fn create_instant_payout(
        &self,
        request: &PayoutRequest,
    ) -> Result<PayoutRecord, GatewayError>;
}

/// The processor's secret API key.
#[derive(Clone)]
pub struct SecretKey(String);

impl SecretKey {
    const PREFIX: &'static str = "sk_";

    pub fn parse(key: &str) -> Result<Self, KeyError> {
        if key.starts_with(Self::PREFIX) {
            Ok(Self(key.to_owned()))
        } else {
            Err(KeyError::InvalidSecretKey)
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// True for keys of the processor's test mode, which never move real money.
    pub fn is_test_mode(&self) -> bool {
        self.0.starts_with("sk_test_")
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(\"sk_***\")")
    }
}

/// The processor's publishable key, handed to the browser.
#[derive(Debug, Clone)]
pub struct PublishableKey(String);

impl PublishableKey {
    const PREFIX: &'static str = "pk_";

    pub fn parse(key: &str) -> Result<Self, KeyError> {
        if key.starts_with(Self::PREFIX) {
            Ok(Self(key.to_owned()))
        } else {
            Err(KeyError::InvalidPublishableKey)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
