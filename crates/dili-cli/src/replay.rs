//! Reasoning service that answers with a reply saved to disk.

use dili_naranjo::{NaranjoContext, ReasoningService, ServiceError};

/// Replays one stored reply for every request.
#[derive(Debug, Clone)]
pub struct ReplayService {
    reply: String,
}

impl ReplayService {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl ReasoningService for ReplayService {
    fn check_health(&self) -> bool {
        !self.reply.trim().is_empty()
    }

    fn reason(&self, _context: &NaranjoContext) -> Result<String, ServiceError> {
        if self.reply.trim().is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(self.reply.clone())
    }
}
