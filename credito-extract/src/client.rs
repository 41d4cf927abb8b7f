//! Resilient extraction client: one request, driven through the retry
//! state machine, validated into an `ExtractionResult`.

use credito_core::ExtractionResult;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::media::MediaType;
use crate::prompt::EXTRACTION_PROMPT;
use crate::response::parse_extraction;
use crate::retry::{RetryPolicy, RetryState};
use crate::service::{DocumentService, ExtractionRequest, Sleeper, TokioSleeper};

pub struct ExtractionClient<S, Z = TokioSleeper> {
    service: S,
    sleeper: Z,
    policy: RetryPolicy,
}

impl<S: DocumentService> ExtractionClient<S, TokioSleeper> {
    pub fn new(service: S) -> Self {
        Self::with_sleeper(service, TokioSleeper)
    }
}

impl<S: DocumentService, Z: Sleeper> ExtractionClient<S, Z> {
    pub fn with_sleeper(service: S, sleeper: Z) -> Self {
        Self {
            service,
            sleeper,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Extract credit entries and the account holder name from a document.
    ///
    /// Transient failures are retried with exponential backoff and only
    /// surface (as `ExtractError::Exhausted`) once the attempt budget is spent.
    /// Every other failure is returned right away.
    pub async fn extract(&self, document: &[u8], media_type: MediaType) -> Result<ExtractionResult> {
        let request = ExtractionRequest {
            document: document.to_vec(),
            media_type,
            instruction: EXTRACTION_PROMPT.to_string(),
        };
        info!(
            bytes = request.document.len(),
            media_type = %request.media_type,
            "starting extraction"
        );

        let mut state = RetryState::Attempting(0);
        loop {
            match state {
                RetryState::Attempting(attempt) => {
                    debug!(attempt = attempt + 1, max = self.policy.max_attempts, "calling extraction service");
                    let outcome = self.attempt(&request).await;
                    if let Err(err) = &outcome {
                        warn!(attempt = attempt + 1, kind = ?err.kind(), error = %err, "extraction attempt failed");
                    }

                    let transition = self.policy.advance(attempt, outcome);
                    if let Some(wait) = transition.wait {
                        info!(wait_ms = wait.as_millis() as u64, "backing off before retry");
                        self.sleeper.sleep(wait).await;
                    }
                    state = transition.next;
                }
                RetryState::Success(result) => {
                    info!(
                        entries = result.entries.len(),
                        has_name = !result.client_name.is_empty(),
                        "extraction succeeded"
                    );
                    return Ok(result);
                }
                RetryState::FatalFailure(err) | RetryState::ExhaustedFailure(err) => return Err(err),
            }
        }
    }

    async fn attempt(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        let text = self.service.generate(request).await?;
        parse_extraction(&text)
    }
}

