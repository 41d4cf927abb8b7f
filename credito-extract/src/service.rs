//! Seams around the single outbound call and the backoff wait

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::media::MediaType;

/// Everything one attempt sends to the service
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub document: Vec<u8>,
    pub media_type: MediaType,
    pub instruction: String,
}

/// One outbound call to a document-understanding service.
///
/// Implementations return the raw text answer and classify their own
/// failures into `ExtractError` kinds; retrying is the caller's job.
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn generate(&self, request: &ExtractionRequest) -> Result<String>;
}

/// Timed suspension between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Non-blocking wait on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
