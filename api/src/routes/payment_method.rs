use crate::error::JsonResult;
use crate::state::RocketState;
use crate::{access, error};
use app::{ledger, user::PaymentDestination};
use rocket::{post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct SavePaymentMethodRequest {
    /// Token of the card or bank account that payouts are sent to, as produced by the payment
    /// processor's browser library.
    payment_method_id: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct SavePaymentMethodResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please contact support.
    Unknown,
    /// The request did not contain a payment method.
    InvalidInput,
}

/// Save the payment destination used for payouts. Replaces any previously saved destination.
#[openapi(tag = "Payments")]
#[post("/save-payment-method", data = "<req>")]
pub(super) async fn post(
    guard: access::SessionGuard,
    state: &State<RocketState>,
    req: Json<SavePaymentMethodRequest>,
) -> JsonResult<SavePaymentMethodResponse, Error> {
    let destination = match req.into_inner().payment_method_id {
        Some(id) if !id.trim().is_empty() => PaymentDestination(id),
        _ => {
            return Err(error::bad_request(
                Error::InvalidInput,
                "no payment_method_id".to_owned(),
            ))
        }
    };
    match ledger::set_payment_destination(&state.db, &guard.grant().name, &destination).await {
        Ok(()) => Ok(Json(SavePaymentMethodResponse {
            success: true,
            message: "payment method saved".to_owned(),
        })),
        Err(ledger::Error::InvalidInput(description)) => Err(error::bad_request(
            Error::InvalidInput,
            description.to_owned(),
        )),
        Err(e) => Err(error::internal_server_error(Error::Unknown, e.to_string())),
    }
}
