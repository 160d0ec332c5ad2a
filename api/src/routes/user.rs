//! Routes for querying user information.

use rocket::{get, serde::json::Json, State};
use rocket_okapi::{openapi, JsonSchema};
use serde::Serialize;
use std::fmt::Debug;

use app::user;

use crate::{
    access,
    error::{self, JsonResult},
    state::RocketState,
};

#[derive(Debug, Serialize, JsonSchema)]
struct UserModel {
    /// Registered user name.
    name: String,
    /// Current balance.
    balance: f64,
    /// True if a payment destination has been saved, which is required for payouts.
    has_payment_destination: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct UserResponse {
    user: UserModel,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please contact support.
    Unknown,
}

/// Get user details, such as the current balance.
#[openapi(tag = "User")]
#[get("/user")]
pub(super) async fn get(
    guard: access::SessionGuard,
    state: &State<RocketState>,
) -> Option<JsonResult<UserResponse, Error>> {
    match user::get(guard.grant(), &state.db).await {
        Ok(Some(user)) => Some(Ok(Json(UserResponse {
            user: UserModel {
                name: user.name.0,
                balance: user.balance.0,
                has_payment_destination: user.payment_destination.is_some(),
            },
        }))),
        Ok(None) => None,
        Err(e) => Some(Err(error::internal_server_error(
            Error::Unknown,
            e.to_string(),
        ))),
    }
}
