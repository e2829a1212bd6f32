//! Ten-question assessment assembled from fixed and reasoned answers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parse::ParsedReasoning;
use crate::questions::{QUESTION_COUNT, QuestionAnswer, REASONED_QUESTIONS, fixed_answer};

const NO_RESPONSE: &str = "No AI response available";
const PARSE_FAILED: &str = "Failed to parse AI response";
const DEFAULT_OVERALL: &str = "Assessment based on available data";
const PARSE_FAILED_OVERALL: &str = "Error processing AI response";

/// Causality category for a total Naranjo score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NaranjoCategory {
    Definite,
    Probable,
    Possible,
    Doubtful,
}

impl NaranjoCategory {
    pub fn from_score(score: i32) -> Self {
        match score {
            9.. => Self::Definite,
            5..=8 => Self::Probable,
            1..=4 => Self::Possible,
            _ => Self::Doubtful,
        }
    }
}

impl fmt::Display for NaranjoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Definite => "Definite",
            Self::Probable => "Probable",
            Self::Possible => "Possible",
            Self::Doubtful => "Doubtful",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaranjoAssessment {
    /// Exactly one answer per question, in question order.
    pub answers: Vec<QuestionAnswer>,
    pub overall_assessment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    pub score: i32,
    pub category: NaranjoCategory,
}

impl NaranjoAssessment {
    /// Fills all ten questions from fixed answers and the parsed reply.
    pub fn merge(parsed: &ParsedReasoning) -> Self {
        let reasoned: &[QuestionAnswer] = match parsed {
            ParsedReasoning::Parsed(reasoning) => reasoning.answers.as_slice(),
            ParsedReasoning::Unparseable { .. } => &[],
        };
        let parse_error = parsed.parse_error().map(str::to_string);
        let overall = match parsed {
            ParsedReasoning::Parsed(reasoning) => reasoning
                .overall_assessment
                .clone()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OVERALL.to_string()),
            ParsedReasoning::Unparseable { .. } => PARSE_FAILED_OVERALL.to_string(),
        };
        let missing = if parse_error.is_some() {
            PARSE_FAILED
        } else {
            NO_RESPONSE
        };

        let answers: Vec<QuestionAnswer> = (1..=QUESTION_COUNT)
            .map(|question| {
                fixed_answer(question)
                    .or_else(|| {
                        reasoned
                            .iter()
                            .find(|answer| answer.question == question)
                            .cloned()
                    })
                    .unwrap_or_else(|| QuestionAnswer::unknown(question, missing))
            })
            .collect();
        let score = answers.iter().map(QuestionAnswer::points).sum();

        Self {
            answers,
            overall_assessment: overall,
            parse_error,
            score,
            category: NaranjoCategory::from_score(score),
        }
    }

    pub fn answer(&self, question: u8) -> Option<&QuestionAnswer> {
        self.answers.iter().find(|answer| answer.question == question)
    }

    /// True when every reasoned question came back from the service.
    pub fn is_complete(&self) -> bool {
        self.parse_error.is_none()
            && REASONED_QUESTIONS.iter().all(|&question| {
                self.answer(question)
                    .is_some_and(|answer| answer.reasoning != NO_RESPONSE)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::AiReasoning;
    use crate::questions::{Answer, Confidence};

    fn reasoned(answers: &[(u8, Answer)]) -> ParsedReasoning {
        ParsedReasoning::Parsed(AiReasoning {
            answers: answers
                .iter()
                .map(|&(question, answer)| {
                    QuestionAnswer::new(question, answer, "from data", Confidence::Medium)
                })
                .collect(),
            overall_assessment: None,
        })
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(NaranjoCategory::from_score(9), NaranjoCategory::Definite);
        assert_eq!(NaranjoCategory::from_score(8), NaranjoCategory::Probable);
        assert_eq!(NaranjoCategory::from_score(5), NaranjoCategory::Probable);
        assert_eq!(NaranjoCategory::from_score(4), NaranjoCategory::Possible);
        assert_eq!(NaranjoCategory::from_score(1), NaranjoCategory::Possible);
        assert_eq!(NaranjoCategory::from_score(0), NaranjoCategory::Doubtful);
        assert_eq!(NaranjoCategory::from_score(-3), NaranjoCategory::Doubtful);
    }

    #[test]
    fn fixed_answers_alone_score_four() {
        // Q1 +1, Q2 +2, Q10 +1
        let assessment = NaranjoAssessment::merge(&reasoned(&[]));
        assert_eq!(assessment.answers.len(), 10);
        assert_eq!(assessment.score, 4);
        assert_eq!(assessment.category, NaranjoCategory::Possible);
        assert_eq!(assessment.answer(3).unwrap().reasoning, NO_RESPONSE);
        assert!(!assessment.is_complete());
        assert_eq!(assessment.overall_assessment, DEFAULT_OVERALL);
    }

    #[test]
    fn reasoned_answers_are_scored() {
        let parsed = reasoned(&[(3, Answer::Yes), (4, Answer::Yes), (5, Answer::No)]);
        let assessment = NaranjoAssessment::merge(&parsed);
        assert_eq!(assessment.score, 4 + 1 + 2 + 2);
        assert_eq!(assessment.category, NaranjoCategory::Definite);
        assert!(assessment.is_complete());
    }

    #[test]
    fn unparseable_reply_carries_error() {
        let parsed = ParsedReasoning::Unparseable {
            raw: "oops".to_string(),
            reason: "no JSON object found in response".to_string(),
        };
        let assessment = NaranjoAssessment::merge(&parsed);
        assert_eq!(
            assessment.parse_error.as_deref(),
            Some("no JSON object found in response")
        );
        assert_eq!(assessment.answer(5).unwrap().reasoning, PARSE_FAILED);
        assert_eq!(assessment.overall_assessment, PARSE_FAILED_OVERALL);
        assert_eq!(assessment.score, 4);
    }
}
