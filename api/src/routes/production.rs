use crate::error::JsonResult;
use crate::state::RocketState;
use crate::{access, error};
use app::{money::Amount, production};
use rocket::{post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct StartProductionRequest {
    /// Amount added to the balance by every cycle. Defaults to 1000000.
    amount_per_cycle: Option<f64>,
    /// Number of cycles to run before paying out. Defaults to 5.
    cycles: Option<i64>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct StartProductionResponse {
    success: bool,
    /// Identifier the payment processor assigned to the payout.
    payout_id: String,
    /// The balance that was paid out.
    amount: f64,
    /// Payout status as reported by the payment processor, e.g. `pending` or `paid`.
    status: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please contact support.
    Unknown,
    /// The balance after production was zero or negative.
    InsufficientBalance,
    /// No payment destination has been saved.
    NoPaymentDestination,
    /// The balance is too large to be paid out.
    AmountOutOfRange,
    /// The payment processor refused the payout. The balance was kept.
    PayoutFailed,
}

/// Run the production cycles, then pay the whole balance out to the saved payment destination.
#[openapi(tag = "Production")]
#[post("/start-production", data = "<req>")]
pub(super) async fn post(
    guard: access::SessionGuard,
    state: &State<RocketState>,
    req: Json<StartProductionRequest>,
) -> JsonResult<StartProductionResponse, Error> {
    let amount_per_cycle = req
        .amount_per_cycle
        .map(Amount)
        .unwrap_or(production::DEFAULT_AMOUNT_PER_CYCLE);
    let cycles = req.cycles.unwrap_or(production::DEFAULT_CYCLES);
    match production::start(
        guard.grant(),
        &state.db,
        state.gateway.as_ref(),
        amount_per_cycle,
        cycles,
    )
    .await
    {
        Ok(settlement) => Ok(Json(StartProductionResponse {
            success: true,
            payout_id: settlement.payout_id.0,
            amount: settlement.amount.0,
            status: settlement.status.as_str().to_owned(),
        })),
        Err(e) => match e {
            production::Error::InsufficientBalance => Err(error::bad_request(
                Error::InsufficientBalance,
                e.to_string(),
            )),
            production::Error::NoPaymentDestination => Err(error::bad_request(
                Error::NoPaymentDestination,
                e.to_string(),
            )),
            production::Error::AmountOutOfRange => Err(error::bad_request(
                Error::AmountOutOfRange,
                e.to_string(),
            )),
            production::Error::Gateway(app::gateway::GatewayError::Rejected { .. }) => {
                Err(error::bad_request(Error::PayoutFailed, e.to_string()))
            }
            production::Error::Gateway(_) | production::Error::Ledger(_) => {
                Err(error::internal_server_error(Error::Unknown, e.to_string()))
            }
        },
    }
}
