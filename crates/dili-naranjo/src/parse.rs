//! Strict decoding of reasoning service output.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::questions::{QuestionAnswer, REASONED_QUESTIONS};

/// Answers the service gave for the reasoned questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReasoning {
    pub answers: Vec<QuestionAnswer>,
    #[serde(default)]
    pub overall_assessment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedReasoning {
    Parsed(AiReasoning),
    Unparseable { raw: String, reason: String },
}

impl ParsedReasoning {
    pub fn parse_error(&self) -> Option<&str> {
        match self {
            Self::Parsed(_) => None,
            Self::Unparseable { reason, .. } => Some(reason),
        }
    }
}

/// Decodes a service reply.
///
/// A surrounding markdown fence and any prose around the outermost JSON
/// object are ignored. Answers to questions other than 3-5 are discarded.
pub fn parse_reasoning(raw: &str) -> ParsedReasoning {
    let unparseable = |reason: String| ParsedReasoning::Unparseable {
        raw: raw.to_string(),
        reason,
    };

    let Some(json) = json_object(strip_fence(raw)) else {
        return unparseable("no JSON object found in response".to_string());
    };
    let mut reasoning: AiReasoning = match serde_json::from_str(json) {
        Ok(reasoning) => reasoning,
        Err(e) => return unparseable(e.to_string()),
    };

    reasoning
        .answers
        .retain(|answer| REASONED_QUESTIONS.contains(&answer.question));
    if reasoning.answers.is_empty() {
        warn!("reasoning response had no answers for questions 3-5");
    }
    ParsedReasoning::Parsed(reasoning)
}

fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (e.g. `json`) on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
