use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::UploadLimits;
use crate::error::InferenceError;
use crate::inference::InferenceService;

/// Everything a request handler needs. Built once in `main` and shared
/// through `web::Data`.
pub struct AppState {
    pub service: InferenceService,
    pub limits: UploadLimits,
    permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(service: InferenceService, limits: UploadLimits) -> Self {
        let permits = Arc::new(Semaphore::new(limits.max_concurrent_inferences));
        Self {
            service,
            limits,
            permits,
        }
    }

    /// Waits for a free inference slot. Hold the permit until the work is done.
    pub async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit, InferenceError> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| InferenceError::Internal("inference slots closed".to_string()))
    }

    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}
