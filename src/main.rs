use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenvy::dotenv;
use log::{error, info};

use betboard::config::Config;
use betboard::store::PgStore;
use betboard::utils::jwt::JwtKeys;
use betboard::{configure, cors, AppState};

async fn run() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {e}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let store = PgStore::connect(&config.database_url, config.database_max_connections)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    store
        .run_migrations()
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let jwt = JwtKeys::new(config.jwt_secret.clone(), config.jwt_ttl_hours);
    let state = web::Data::new(AppState::new(Arc::new(store), jwt, config.bcrypt_cost));

    if let Some(admin) = &config.bootstrap_admin {
        state
            .admins
            .ensure_admin(&admin.username, &admin.email, &admin.password)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    }

    let origins = config.cors_origins.clone();
    let bind = (config.host.clone(), config.port);
    info!("Starting server on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(&origins))
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}

fn main() -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run())
}
