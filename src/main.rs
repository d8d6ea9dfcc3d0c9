use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use directory::config::AppConfig;
use directory::handlers;
use directory::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|err| {
        log::error!("Invalid configuration: {err}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
    })?;

    let state = AppState::from_config(&config).await.map_err(|err| {
        log::error!("Failed to initialize store: {err}");
        std::io::Error::new(std::io::ErrorKind::Other, err)
    })?;

    let bind_address = config.bind_address();
    let state = web::Data::new(state);

    log::info!(
        "🚀 Starting Local Business Directory on {} (store: {})",
        bind_address,
        state.backend
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}
