//! Add top-level routes as submodules here.

use crate::{
    error::{self, Error, JsonError, Unhandled},
    state::RocketState,
};
use app::QueryRange;
use rocket::{catch, catchers, routes, serde::json::Json, Build, FromForm, Rocket};
use rocket_okapi::{
    openapi_get_routes,
    swagger_ui::{make_swagger_ui, DefaultModelRendering, SwaggerUIConfig},
};
use schemars::JsonSchema;
use serde::Serialize;

mod logs;
mod payment_method;
mod production;
mod session;
mod user;

const MIN_LIMIT: i64 = 1;
const MAX_LIMIT: i64 = 250;

#[derive(FromForm, JsonSchema)]
struct Range {
    limit: Option<String>,
    offset: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RangeError {
    /// Invalid limit.
    InvalidLimit,
    /// Invalid offset.
    InvalidOffset,
    /// Unexpected error, please contact support.
    Unknown,
}

impl Range {
    fn query_range(self) -> Result<QueryRange, JsonError<RangeError>> {
        Ok(QueryRange {
            limit: Self::parse_limit(self.limit)?,
            offset: Self::parse_offset(self.offset)?,
        })
    }

    fn parse_limit(s: Option<String>) -> Result<i64, JsonError<RangeError>> {
        let limit: i64 = s.unwrap_or_else(|| "100".to_owned()).parse().map_err(|_| {
            error::bad_request(RangeError::InvalidLimit, "limit is not a number".to_owned())
        })?;
        if limit < MIN_LIMIT {
            Err(error::bad_request(
                RangeError::InvalidLimit,
                format!("limit must be at least {}", MIN_LIMIT),
            ))
        } else if limit > MAX_LIMIT {
            Err(error::bad_request(
                RangeError::InvalidLimit,
                format!("limit can be at most {}", MAX_LIMIT),
            ))
        } else {
            Ok(limit)
        }
    }

    fn parse_offset(s: Option<String>) -> Result<i64, JsonError<RangeError>> {
        let offset = s.unwrap_or_else(|| "0".to_owned()).parse().map_err(|_| {
            error::bad_request(
                RangeError::InvalidOffset,
                "offset is not a number".to_owned(),
            )
        })?;
        if offset < 0 {
            Err(error::bad_request(
                RangeError::InvalidOffset,
                "offset must be positive".to_owned(),
            ))
        } else {
            Ok(offset)
        }
    }
}

const API: &str = "/api";

pub fn register(rocket: Rocket<Build>, state: RocketState) -> Rocket<Build> {
    let rocket = rocket
        .manage(state)
        .mount(
            "/",
            routes![
                session::index,
                session::login_page,
                session::login,
                session::register,
                session::logout,
            ],
        )
        .mount(
            API,
            openapi_get_routes![
                payment_method::post,
                production::post,
                user::get,
                logs::list,
            ],
        )
        .register(
            API,
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        );
    mount_swagger(rocket)
}

pub fn mount_swagger(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount(
        format!("{}/swagger", API),
        make_swagger_ui(&SwaggerUIConfig {
            url: "../openapi.json".to_owned(),
            default_model_rendering: DefaultModelRendering::Model,
            show_extensions: true,
            ..Default::default()
        }),
    )
}

#[catch(400)]
fn bad_request() -> Json<Error<Unhandled>> {
    error::unhandled(Unhandled::MalformedRequest, "malformed request")
}

#[catch(401)]
fn unauthorized() -> Json<Error<Unhandled>> {
    error::unhandled(Unhandled::Unauthenticated, "not authenticated")
}

#[catch(404)]
fn not_found() -> Json<Error<Unhandled>> {
    error::unhandled(Unhandled::NotFound, "not found")
}

#[catch(422)]
fn unprocessable() -> Json<Error<Unhandled>> {
    error::unhandled(Unhandled::MalformedRequest, "malformed request body")
}

#[catch(500)]
fn internal_error() -> Json<Error<Unhandled>> {
    error::unhandled(Unhandled::Unknown, "unexpected error")
}
