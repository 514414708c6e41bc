use gloo_console::error;
use gloo_file::File as GlooFile;
use gloo_net::http::{Request, Response};
use shared::{ErrorResponse, ModelStatus, PredictionResponse};

pub const PREDICT_URL: &str = "/predict";
pub const MODEL_URL: &str = "/model";
pub const FILE_FIELD: &str = "file";

/// Uploads one image as the `file` multipart field.
pub async fn predict(file: &GlooFile) -> Result<PredictionResponse, String> {
    let form_data =
        web_sys::FormData::new().map_err(|_| "Could not create form data".to_string())?;
    form_data
        .append_with_blob(FILE_FIELD, file.as_ref())
        .map_err(|_| "Could not attach the image".to_string())?;

    let response = Request::post(PREDICT_URL)
        .body(form_data)
        .map_err(|e| format!("Failed to build request: {}", e))?
        .send()
        .await
        .map_err(|e| {
            error!(format!("Predict request failed: {:?}", e));
            format!("Network error: {}", e)
        })?;

    if response.ok() {
        response
            .json::<PredictionResponse>()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))
    } else {
        Err(error_message(response).await)
    }
}

pub async fn model_status() -> Result<ModelStatus, String> {
    let response = Request::get(MODEL_URL)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    if !response.ok() {
        return Err(error_message(response).await);
    }
    response
        .json::<ModelStatus>()
        .await
        .map_err(|e| format!("Failed to parse model status: {}", e))
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    describe_error(status, &body)
}

/// Prefers the message from a structured error body.
pub fn describe_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => format!("Server error: {}", status),
        Err(_) => format!("Server error: {} - {}", status, body.trim()),
    }
}
