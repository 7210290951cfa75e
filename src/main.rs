#![allow(proc_macro_derive_resolution_fallback)] // See: https://github.com/diesel-rs/diesel/issues/1785

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate diesel;
#[macro_use]
extern crate derive_more;
#[macro_use]
extern crate log;

mod api;
mod config;
mod db;
mod error;
mod form;
mod migrations;
mod models;
mod schema;
mod views;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use std::io;

use self::api::AppState;
use self::config::Config;

/// Converts a failure during startup into the `io::Error` returned by `main`.
fn startup_error<E: std::fmt::Display>(e: E) -> io::Error {
    error!("{}", e);
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_rt::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(startup_error)?;

    // Create a connection pool to the database
    let pool = db::connect(&config.database_url, config.pool_size).map_err(startup_error)?;

    // Bring the schema up to date before accepting requests
    {
        let conn = pool.get().map_err(startup_error)?;
        let applied = migrations::run_pending(&conn).map_err(startup_error)?;
        if applied.is_empty() {
            debug!("Schema is up to date");
        }
    }

    let state = AppState {
        db: pool,
        templates: views::templates().map_err(startup_error)?,
    };

    info!(
        "Listening on {} (database: {})",
        config.listen_addr, config.database_url
    );

    HttpServer::new(move || {
        App::new()
            .data(state.clone())
            .wrap(Logger::default())
            .configure(api::routes)
    })
    .bind(config.listen_addr)?
    .run()
    .await
}
