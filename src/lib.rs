#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{figment::Figment, Build, Rocket};

pub mod api;
pub mod config;
pub mod election;
pub mod error;
pub mod logging;
pub mod model;

use config::{ConfigFairing, StoreFairing};
use logging::LoggerFairing;
use model::Store;

/// Assemble the server from `Rocket.toml` and the environment. The store is
/// chosen and connected during ignition.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(StoreFairing)
}

/// Assemble the server around an existing store.
pub fn rocket_for_store(figment: Figment, store: Store) -> Rocket<Build> {
    rocket::custom(figment)
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(ConfigFairing)
        .manage(store)
}

/// Configuration for tests. Tokens are signed with [`config::Config::example`]'s secret.
#[cfg(test)]
pub(crate) fn test_figment() -> Figment {
    rocket::Config::figment()
        .merge(("log_level", rocket::config::LogLevel::Off))
        .merge(("jwt_secret", "test-secret"))
        .merge(("read_policy", "open"))
}

/// An `Authorization` header carrying a valid token for the given role.
#[cfg(test)]
pub(crate) fn auth_header(role: model::auth::Role) -> rocket::http::Header<'static> {
    use model::auth::{Caller, Claims};

    let config = config::Config::example();
    let token = Claims::for_caller(&Caller::example(role))
        .encode(&config)
        .unwrap();
    rocket::http::Header::new("Authorization", format!("Bearer {token}"))
}
