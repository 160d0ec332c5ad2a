use std::sync::Arc;

use anyhow::Context;
use app::database;
use app::gateway::{stripe, PublishableKey, SecretKey};
use rocket::figment::providers::Env;
use rocket::{launch, Build, Rocket};
use serde::Deserialize;
use url::Url;

/// Process configuration. Read from Rocket's figment, so `Rocket.toml` and `ROCKET_*` variables
/// work, merged with the unprefixed variables listed in [`RAW_ENV`].
#[derive(Deserialize)]
struct Config {
    /// Rocket's own key, used to encrypt the session cookie.
    secret_key: String,
    #[serde(default = "default_database_url")]
    database_url: String,
    stripe_secret_key: String,
    stripe_publishable_key: String,
    #[serde(default = "default_stripe_api_url")]
    stripe_api_url: Url,
}

const RAW_ENV: &[&str] = &[
    "STRIPE_SECRET_KEY",
    "STRIPE_PUBLISHABLE_KEY",
    "STRIPE_API_URL",
    "DATABASE_URL",
];

fn default_database_url() -> String {
    "sqlite://money_production.db".to_owned()
}

fn default_stripe_api_url() -> Url {
    Url::parse("https://api.stripe.com").expect("static url")
}

struct Keys {
    secret: SecretKey,
    publishable: PublishableKey,
}

impl Config {
    fn keys(&self) -> anyhow::Result<Keys> {
        if self.secret_key.trim().is_empty() {
            anyhow::bail!("secret_key is empty");
        }
        Ok(Keys {
            secret: SecretKey::parse(&self.stripe_secret_key)
                .context("invalid stripe_secret_key")?,
            publishable: PublishableKey::parse(&self.stripe_publishable_key)
                .context("invalid stripe_publishable_key")?,
        })
    }
}

#[launch]
async fn rocket() -> _ {
    env_logger::init();

    let figment = rocket::Config::figment().merge(Env::raw().only(RAW_ENV));
    match start_server(Rocket::custom(figment)).await {
        Ok(rocket) => rocket,
        Err(e) => {
            log::error!("refusing to start: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn start_server(rocket: Rocket<Build>) -> anyhow::Result<Rocket<Build>> {
    let config: Config = rocket
        .figment()
        .extract()
        .context("missing or malformed configuration")?;
    let keys = config.keys()?;

    let db = database::connect(&config.database_url)
        .await
        .with_context(|| format!("could not open database {}", config.database_url))?;
    database::run_migrations(&db).await.context("migrations failed")?;
    #[cfg(debug_assertions)]
    database::seed_development_data(&db, &keys.secret)
        .await
        .context("seeding failed")?;

    let gateway = stripe::Stripe::new(stripe::Config {
        api_url: config.stripe_api_url,
        secret_key: keys.secret,
    });
    log::info!("starting with database {}", config.database_url);

    Ok(api::register(rocket, db, Arc::new(gateway), keys.publishable))
}
