//! Seam to the text-generation backend.

use thiserror::Error;

use crate::context::NaranjoContext;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("reasoning service unavailable: {0}")]
    Unavailable(String),

    #[error("reasoning request failed: {message}")]
    Request { message: String },

    #[error("reasoning service returned an empty response")]
    EmptyResponse,

    #[error("reasoning queue has stopped")]
    Disconnected,
}

/// Backend that answers questions 3-5 for a patient.
///
/// Implementations block; the [`ReasoningQueue`](crate::ReasoningQueue)
/// runs them on its own thread.
pub trait ReasoningService: Send + Sync + 'static {
    fn check_health(&self) -> bool;

    /// Raw reply text, expected to hold a JSON object with an `answers` array.
    fn reason(&self, context: &NaranjoContext) -> Result<String, ServiceError>;
}
