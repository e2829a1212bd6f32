//! Naranjo adverse drug reaction causality assessment for checkpoint
//! inhibitor hepatotoxicity.
//!
//! Seven of the ten questions have fixed answers. Questions 3-5 come from a
//! [`ReasoningService`] fed with a [`NaranjoContext`]; its reply is parsed
//! strictly and merged into a scored [`NaranjoAssessment`]. Requests go
//! through a [`ReasoningQueue`] that runs one at a time. Literature search
//! queries are screened and sanitized by [`prepare_query`].

pub mod assessment;
pub mod context;
pub mod literature;
pub mod parse;
pub mod queue;
pub mod questions;
pub mod service;

pub use assessment::{NaranjoAssessment, NaranjoCategory};
pub use context::{NaranjoContext, grade_changes};
pub use literature::{
    MAX_QUERY_CHARS, MIN_QUERY_CHARS, PreparedQuery, QueryCheck, contains_sensitive_info,
    prepare_query, sanitize_query, validate_query,
};
pub use parse::{AiReasoning, ParsedReasoning, parse_reasoning};
pub use queue::{
    DEFAULT_HEALTH_TIMEOUT, DEFAULT_REQUEST_DELAY, DEFAULT_REQUEST_TIMEOUT, PendingReasoning,
    QueueEvent, QueueOptions, ReasoningOutcome, ReasoningQueue, RequestId,
};
pub use questions::{
    Answer, Confidence, QUESTION_COUNT, QUESTIONS, QuestionAnswer, REASONED_QUESTIONS,
    ScoringRule, fixed_answer, question_text, scoring_rule,
};
pub use service::{ReasoningService, ServiceError};
