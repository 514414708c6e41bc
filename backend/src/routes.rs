use std::path::Path;
use std::time::Instant;

use actix_cors::Cors;
use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::rt::time;
use actix_web::{HttpResponse, web};
use futures_util::TryStreamExt;
use log::info;
use shared::PredictionResponse;
use uuid::Uuid;

use crate::config::CorsConfig;
use crate::error::InferenceError;
use crate::inference::PredictionResult;
use crate::state::AppState;

pub const PING_MESSAGE: &str = "Hello, I am alive";
pub const FILE_FIELD: &str = "file";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ping").route(web::get().to(ping)))
        .service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/model").route(web::get().to(model_status)));
}

/// Serves the built web client. Registered after the API routes.
pub fn configure_frontend(cfg: &mut web::ServiceConfig, frontend_dir: Option<&Path>) {
    if let Some(dir) = frontend_dir {
        cfg.service(Files::new("/", dir).index_file("index.html"));
    }
}

pub fn build_cors(config: &CorsConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600);

    if config.allows_any_origin() {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }
    if config.allow_credentials {
        cors = cors.supports_credentials();
    }
    cors
}

async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(PING_MESSAGE)
}

async fn model_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.service.status())
}

async fn predict(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, InferenceError> {
    let request_id = Uuid::new_v4();
    let started = Instant::now();

    // One deadline for the upload and the inference.
    let timeout = state.limits.request_timeout;
    let (result, upload_bytes) = time::timeout(timeout, receive_and_predict(state.clone(), &mut payload))
        .await
        .map_err(|_| InferenceError::Timeout(timeout.as_secs()))??;

    info!(
        "[{}] {} ({:.3}) source={} bytes={} in {:?}",
        request_id,
        result.label,
        result.confidence,
        result.source,
        upload_bytes,
        started.elapsed()
    );
    Ok(HttpResponse::Ok().json(PredictionResponse::from(result)))
}

async fn receive_and_predict(
    state: web::Data<AppState>,
    payload: &mut Multipart,
) -> Result<(PredictionResult, usize), InferenceError> {
    let image = read_file_field(payload, state.limits.max_upload_bytes).await?;
    let upload_bytes = image.len();
    let result = run_prediction(state, image).await?;
    Ok((result, upload_bytes))
}

/// The slot moves into the blocking job, so it is only released when the
/// work finishes, not when a timed-out request gives up waiting.
async fn run_prediction(
    state: web::Data<AppState>,
    image: Vec<u8>,
) -> Result<PredictionResult, InferenceError> {
    let slot = state.acquire_slot().await?;
    let worker = state.clone();
    web::block(move || {
        let _slot = slot;
        worker.service.predict(&image)
    })
    .await
    .map_err(|e| InferenceError::Internal(e.to_string()))?
}

/// Reads the `file` field, counting every byte of the body against `limit`.
async fn read_file_field(payload: &mut Multipart, limit: usize) -> Result<Vec<u8>, InferenceError> {
    let mut received = 0usize;
    let mut image: Option<Vec<u8>> = None;

    while let Some(mut field) = payload.try_next().await? {
        let wanted = image.is_none() && field.name() == Some(FILE_FIELD);
        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            received += chunk.len();
            if received > limit {
                return Err(InferenceError::PayloadTooLarge { limit });
            }
            if wanted {
                data.extend_from_slice(&chunk);
            }
        }
        if wanted {
            image = Some(data);
        }
    }

    image.ok_or(InferenceError::MissingFile)
}
