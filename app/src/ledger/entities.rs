//! The ledger is the combination of a user's balance and its append-only transaction log. Every
//! change to a balance goes through [`Balance::apply`], which hands back the [`LogEntry`] that has
//! to be stored alongside the new balance.

use crate::gateway::PayoutId;
use crate::money::Amount;
use crate::user;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("unknown user")]
    UnknownUser,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Represents the user balance as loaded from storage, plus any changes applied since.
///
/// The stored balance is overwritten with [`Balance::amount`] without checking that it is still
/// the value that was loaded, so two concurrent writers can overwrite each other's updates.
#[derive(Debug, Clone)]
pub struct Balance {
    name: user::Name,
    amount: Amount,
}

impl Balance {
    pub fn new(name: user::Name, amount: Amount) -> Self {
        Self { name, amount }
    }

    pub fn name(&self) -> &user::Name {
        &self.name
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Adds a signed delta and describes the change as a log entry.
    pub fn apply(&mut self, delta: Amount, description: &str) -> LogEntry {
        let before = self.amount;
        self.amount += delta;
        LogEntry::new(&self.name, description, delta, before, self.amount, None)
    }

    /// Empties the balance after a payout of the whole amount.
    pub fn withdraw_all(&mut self, payout_id: &PayoutId) -> LogEntry {
        let before = self.amount;
        self.amount = Amount::ZERO;
        LogEntry::new(
            &self.name,
            WITHDRAWAL_DESCRIPTION,
            -before,
            before,
            Amount::ZERO,
            Some(payout_id.clone()),
        )
    }
}

pub const WITHDRAWAL_DESCRIPTION: &str = "Final withdrawal";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogId(pub i64);

/// An immutable record of one balance change.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: Option<LogId>,
    pub user_name: user::Name,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub amount: Amount,
    pub balance_before: Amount,
    pub balance_after: Amount,
    pub payout_id: Option<PayoutId>,
}

impl LogEntry {
    fn new(
        name: &user::Name,
        description: &str,
        amount: Amount,
        balance_before: Amount,
        balance_after: Amount,
        payout_id: Option<PayoutId>,
    ) -> Self {
        Self {
            id: None,
            user_name: name.clone(),
            timestamp: Utc::now(),
            description: description.to_owned(),
            amount,
            balance_before,
            balance_after,
            payout_id,
        }
    }
}
