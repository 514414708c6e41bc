use actix_web::{App, HttpServer, middleware, web};
use plantguard_server::config::AppConfig;
use plantguard_server::inference::{InferenceService, ModelLoader};
use plantguard_server::preprocess::DecodeLimits;
use plantguard_server::routes::{build_cors, configure_frontend, configure_routes};
use plantguard_server::state::AppState;
use shared::PredictionSource;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let mode = ModelLoader::new(&config.model_path).load().map_err(|e| {
        log::error!("Failed to load model at startup: {}", e);
        std::io::Error::other(format!("Model loading failed: {}", e))
    })?;

    let service = InferenceService::new(mode, DecodeLimits::from(&config.limits));
    if service.source() == PredictionSource::Demo {
        log::warn!("Serving DEMO predictions; every response carries \"source\": \"demo\"");
    }
    log::info!("{} classes: {:?}", service.class_names().len(), service.class_names().as_slice());

    if config.cors.allows_any_origin() {
        log::warn!("CORS allows any origin");
    } else if config.cors.allowed_origins.is_empty() {
        log::info!("CORS disabled; set CORS_ALLOWED_ORIGINS to allow browser clients on other origins");
    }

    let frontend_dir = config.frontend_dir.clone().filter(|dir| {
        let exists = dir.is_dir();
        if !exists {
            log::warn!("FRONTEND_DIR {} does not exist; not serving the web client", dir.display());
        }
        exists
    });

    let state = web::Data::new(AppState::new(service, config.limits.clone()));
    let cors = config.cors.clone();
    let bind_address = config.bind_address();

    log::info!("Starting server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&cors))
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_routes)
            .configure(|cfg| configure_frontend(cfg, frontend_dir.as_deref()))
    })
    .client_request_timeout(config.limits.request_timeout);

    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.bind(&bind_address)?.run().await
}
