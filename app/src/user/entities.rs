use crate::money;

/// The unique, user-chosen identifier. Stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(pub String);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(pub i64);

/// An opaque token identifying where payouts are sent, e.g. a tokenized card or bank account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDestination(pub String);

#[derive(Debug)]
pub struct User {
    pub id: Id,
    pub name: Name,
    pub balance: money::Amount,
    pub payment_destination: Option<PaymentDestination>,
}

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
