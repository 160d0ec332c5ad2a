//! A production run accrues `cycles` fixed increments on a user's balance and then pays the whole
//! balance out. [`ProductionRun::next_cycle`] is called until it returns `None`, then
//! [`ProductionRun::request_payout`] decides whether a payout may happen, and finally either
//! [`ProductionRun::settle`] or [`ProductionRun::fail`] closes the run.

use crate::auth;
use crate::gateway::{self, PayoutRecord, PayoutRequest};
use crate::ledger;
use crate::money::Amount;
use crate::user::PaymentDestination;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("no payment destination")]
    NoPaymentDestination,
    #[error("amount out of range")]
    AmountOutOfRange,
    #[error("{0}")]
    Gateway(#[from] gateway::GatewayError),
    #[error("{0}")]
    Ledger(#[from] ledger::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Idle,
    Accruing { completed: i64 },
    AwaitingPayout { amount: Amount },
    Settled { payout: PayoutRecord },
    Failed,
}

/// One accrual step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    pub index: i64,
    pub total: i64,
}

impl Cycle {
    pub fn description(&self) -> String {
        format!("Cycle {}/{}", self.index, self.total)
    }
}

#[derive(Debug)]
pub struct ProductionRun {
    pub grant: auth::Grant,
    pub amount_per_cycle: Amount,
    pub cycles: i64,
    pub state: State,
}

impl ProductionRun {
    /// Neither `amount_per_cycle` nor `cycles` is bounded. A non-positive `cycles` runs no
    /// accrual at all.
    pub fn new(grant: &auth::Grant, amount_per_cycle: Amount, cycles: i64) -> Self {
        Self {
            grant: grant.clone(),
            amount_per_cycle,
            cycles,
            state: State::Idle,
        }
    }

    /// Advances the run to its next cycle, or returns `None` once all cycles are done.
    pub fn next_cycle(&mut self) -> Option<Cycle> {
        let completed = match self.state {
            State::Idle => 0,
            State::Accruing { completed } => completed,
            ref state => panic!(
                "run for {} cannot accrue in state {:?}",
                self.grant.name, state
            ),
        };
        if completed >= self.cycles {
            return None;
        }
        let index = completed + 1;
        self.state = State::Accruing { completed: index };
        Some(Cycle {
            index,
            total: self.cycles,
        })
    }

    /// Builds the payout for the accrued balance. Fails the run without a payout if the balance
    /// is not positive or no destination is registered.
    pub fn request_payout(
        &mut self,
        balance: Amount,
        destination: Option<PaymentDestination>,
    ) -> Result<PayoutRequest, Error> {
        match self.state {
            State::Idle | State::Accruing { .. } => {}
            ref state => panic!(
                "run for {} cannot request a payout in state {:?}",
                self.grant.name, state
            ),
        }
        if !balance.is_positive() {
            self.state = State::Failed;
            return Err(Error::InsufficientBalance);
        }
        let destination = match destination {
            Some(destination) => destination,
            None => {
                self.state = State::Failed;
                return Err(Error::NoPaymentDestination);
            }
        };
        let cents = match balance.cents() {
            Some(cents) => cents,
            None => {
                self.state = State::Failed;
                return Err(Error::AmountOutOfRange);
            }
        };
        self.state = State::AwaitingPayout { amount: balance };
        Ok(PayoutRequest::instant(cents, destination, &self.grant.name))
    }

    /// Marks the payout as issued. Returns the amount that was paid out.
    pub fn settle(&mut self, payout: PayoutRecord) -> Amount {
        let amount = match self.state {
            State::AwaitingPayout { amount } => amount,
            ref state => panic!(
                "run for {} cannot settle in state {:?}",
                self.grant.name, state
            ),
        };
        self.state = State::Settled { payout };
        amount
    }

    pub fn fail(&mut self) {
        if matches!(self.state, State::Settled { .. }) {
            panic!("run for {} has already been settled", self.grant.name);
        }
        self.state = State::Failed;
    }
}
