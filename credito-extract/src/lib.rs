//! credito-extract: resilient client for the external statement extraction service

pub mod client;
pub mod credentials;
pub mod error;
pub mod gemini;
pub mod media;
pub mod prompt;
pub mod response;
pub mod retry;
pub mod service;

pub use client::ExtractionClient;
pub use credentials::{ApiKey, API_KEY_ENV};
pub use error::{AuthProblem, ErrorKind, ExtractError, Result};
pub use gemini::{GeminiConfig, GeminiService};
pub use media::MediaType;
pub use retry::{RetryPolicy, RetryState, Transition};
pub use service::{DocumentService, ExtractionRequest, Sleeper, TokioSleeper};
