//! Sessions are kept in a private (encrypted and signed) cookie holding the user name. The
//! [`SessionGuard`] turns that cookie back into an [`app::auth::Grant`].

use okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket::{
    async_trait,
    http::{Cookie, CookieJar, Status},
    request::{FromRequest, Outcome},
    Request,
};
use rocket_okapi::{
    gen::OpenApiGenerator,
    request::{OpenApiFromRequest, RequestHeaderInput},
};
use thiserror::Error;

use crate::state::RocketState;

const SESSION_COOKIE: &str = "user";

pub struct SessionGuard(app::auth::Grant);

impl SessionGuard {
    pub fn grant(&self) -> &app::auth::Grant {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("{0}")]
    Unexpected(String),
}

pub fn start_session(cookies: &CookieJar<'_>, grant: &app::auth::Grant) {
    cookies.add_private(Cookie::new(SESSION_COOKIE, grant.name.0.clone()));
}

pub fn end_session(cookies: &CookieJar<'_>) {
    cookies.remove_private(SESSION_COOKIE);
}

#[async_trait]
impl<'r> FromRequest<'r> for SessionGuard {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let name = match req.cookies().get_private(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_owned(),
            None => return Outcome::Error((Status::Unauthorized, Error::Unauthenticated)),
        };
        let state = match req.rocket().state::<RocketState>() {
            Some(state) => state,
            None => {
                return Outcome::Error((
                    Status::InternalServerError,
                    Error::Unexpected("application state is not managed".to_owned()),
                ))
            }
        };
        match app::auth::session_grant(&state.db, &name).await {
            Ok(grant) => Outcome::Success(Self(grant)),
            Err(app::auth::Error::AccessDenied) => {
                log::info!("session for unknown user {:?}", name);
                Outcome::Error((Status::Unauthorized, Error::Unauthenticated))
            }
            Err(e) => {
                log::error!("failed to resolve session for {:?}: {}", name, e);
                Outcome::Error((Status::InternalServerError, Error::Unexpected(e.to_string())))
            }
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for SessionGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        let security_scheme = SecurityScheme {
            description: Some(format!(
                "Requires the \"{}\" session cookie set by logging in.",
                SESSION_COOKIE
            )),
            data: SecuritySchemeData::ApiKey {
                name: SESSION_COOKIE.to_owned(),
                location: "cookie".to_owned(),
            },
            extensions: Object::default(),
        };
        let mut security_req = SecurityRequirement::new();
        security_req.insert(SESSION_COOKIE.to_owned(), Vec::new());
        Ok(RequestHeaderInput::Security(
            SESSION_COOKIE.to_owned(),
            security_scheme,
            security_req,
        ))
    }
}
