//! Browser routes: the landing page and the form-based login flow.

use rocket::{
    form::Form, get, http::CookieJar, post, response::content::RawHtml, response::Redirect, uri,
    FromForm, State,
};

use crate::{access, pages, state::RocketState};

#[derive(FromForm)]
pub(super) struct Credentials {
    name: Option<String>,
    password: Option<String>,
}

impl Credentials {
    fn parts(&self) -> (&str, &str) {
        (
            self.name.as_deref().unwrap_or_default(),
            self.password.as_deref().unwrap_or_default(),
        )
    }
}

#[get("/")]
pub(super) async fn index(
    guard: Option<access::SessionGuard>,
    state: &State<RocketState>,
) -> Result<RawHtml<String>, Redirect> {
    let guard = guard.ok_or_else(|| Redirect::to(uri!(login_page)))?;
    let balance = match app::ledger::get_balance(&state.db, &guard.grant().name).await {
        Ok(balance) => balance,
        Err(e) => {
            log::error!("failed to load balance for {}: {}", guard.grant().name, e);
            None
        }
    };
    Ok(pages::landing(
        guard.grant().name.as_str(),
        balance.map(|b| b.0),
        state.publishable_key.as_str(),
    ))
}

#[get("/login")]
pub(super) fn login_page() -> RawHtml<String> {
    pages::login(None)
}

#[post("/login", data = "<form>")]
pub(super) async fn login(
    form: Form<Credentials>,
    cookies: &CookieJar<'_>,
    state: &State<RocketState>,
) -> Result<Redirect, RawHtml<String>> {
    let (name, password) = form.parts();
    match app::auth::authenticate(&state.db, name, password).await {
        Ok(grant) => {
            access::start_session(cookies, &grant);
            Ok(Redirect::to(uri!(index)))
        }
        Err(app::auth::Error::AccessDenied) => Err(pages::login(Some("invalid credentials"))),
        Err(e) => {
            log::error!("login failed for {:?}: {}", name, e);
            Err(pages::login(Some("unexpected error, please try again")))
        }
    }
}

#[post("/register", data = "<form>")]
pub(super) async fn register(
    form: Form<Credentials>,
    cookies: &CookieJar<'_>,
    state: &State<RocketState>,
) -> Result<Redirect, RawHtml<String>> {
    let (name, password) = form.parts();
    match app::auth::register(&state.db, name, password).await {
        Ok(grant) => {
            access::start_session(cookies, &grant);
            Ok(Redirect::to(uri!(index)))
        }
        Err(app::user::Error::Database(e)) => {
            log::error!("registration failed for {:?}: {}", name, e);
            Err(pages::login(Some("unexpected error, please try again")))
        }
        Err(e) => Err(pages::login(Some(&e.to_string()))),
    }
}

#[post("/logout")]
pub(super) fn logout(cookies: &CookieJar<'_>) -> Redirect {
    access::end_session(cookies);
    Redirect::to(uri!(login_page))
}
