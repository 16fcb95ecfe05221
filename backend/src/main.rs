mod config;
mod engine;
mod job_controller;
mod services;
mod store;

use crate::config::AppConfig;
use crate::job_controller::state::JobsState;
use crate::store::MappingStore;
use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|err| {
        error!("invalid configuration: {}", err);
        io::Error::new(io::ErrorKind::InvalidInput, err)
    })?;
    info!("configuration: {:?}", config);

    let store = MappingStore::open(&config).map_err(|err| {
        error!("cannot open {}: {}", config.database.display(), err);
        io::Error::other(err)
    })?;

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new();

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    let address = config.bind_address();
    let json_limit = config.json_limit;
    info!("Server running at http://{}", address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(services::json_config(json_limit))
            .app_data(services::query_config())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(jobs_state.clone()))
            .configure(services::configure)
    })
    .bind(address)?
    .run()
    .await
}
