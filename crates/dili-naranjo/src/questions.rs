//! The ten Naranjo questions, their scoring, and the answers fixed for
//! checkpoint-inhibitor hepatotoxicity.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub const QUESTION_COUNT: u8 = 10;

/// Questions answered by the reasoning service; the rest are fixed.
pub const REASONED_QUESTIONS: [u8; 3] = [3, 4, 5];

pub const QUESTIONS: [&str; QUESTION_COUNT as usize] = [
    "Are there previous conclusive reports on this reaction?",
    "Did the adverse events appear after the suspected drug was given?",
    "Did the adverse reaction improve when the drug was discontinued or a specific antagonist was given?",
    "Did the adverse reaction appear when the drug was re-administered?",
    "Are there alternative causes that could have caused the reaction?",
    "Did the reaction reappear when a placebo was given?",
    "Was the drug detected in any body fluid in toxic concentrations?",
    "Was the reaction more severe when the dose was increased, or less severe when the dose was decreased?",
    "Did the patient have a similar reaction to the same or similar drugs in any previous exposure?",
    "Was the adverse event confirmed by any objective evidence?",
];

/// Question text for a 1-based question number.
pub fn question_text(question: u8) -> Option<&'static str> {
    QUESTIONS.get(usize::from(question).checked_sub(1)?).copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Answer {
    Yes,
    No,
    Unknown,
}

impl Answer {
    /// Case-insensitive; accepts "don't know" for `Unknown`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "unknown" | "don't know" | "dont know" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::Unknown => "Unknown",
        })
    }
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).ok_or_else(|| {
            serde::de::Error::unknown_variant(&value, &["Yes", "No", "Unknown"])
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(serde::de::Error::unknown_variant(
                &value,
                &["High", "Medium", "Low"],
            )),
        }
    }
}

/// Points awarded per answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRule {
    pub yes: i32,
    pub no: i32,
    pub unknown: i32,
}

impl ScoringRule {
    const fn new(yes: i32, no: i32) -> Self {
        Self { yes, no, unknown: 0 }
    }

    pub fn points(&self, answer: Answer) -> i32 {
        match answer {
            Answer::Yes => self.yes,
            Answer::No => self.no,
            Answer::Unknown => self.unknown,
        }
    }
}

const SCORING_RULES: [ScoringRule; QUESTION_COUNT as usize] = [
    ScoringRule::new(1, 0),
    ScoringRule::new(2, -1),
    ScoringRule::new(1, 0),
    ScoringRule::new(2, -1),
    ScoringRule::new(-1, 2),
    ScoringRule::new(-1, 1),
    ScoringRule::new(1, 0),
    ScoringRule::new(1, 0),
    ScoringRule::new(1, 0),
    ScoringRule::new(1, 0),
];

pub fn scoring_rule(question: u8) -> Option<ScoringRule> {
    SCORING_RULES
        .get(usize::from(question).checked_sub(1)?)
        .copied()
}

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    #[serde(deserialize_with = "question_number")]
    pub question: u8,
    pub answer: Answer,
    pub reasoning: String,
    pub confidence: Confidence,
}

impl QuestionAnswer {
    pub fn new(
        question: u8,
        answer: Answer,
        reasoning: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            question,
            answer,
            reasoning: reasoning.into(),
            confidence,
        }
    }

    pub fn unknown(question: u8, reasoning: impl Into<String>) -> Self {
        Self::new(question, Answer::Unknown, reasoning, Confidence::Low)
    }

    /// Points this answer contributes; 0 for out-of-range questions.
    pub fn points(&self) -> i32 {
        scoring_rule(self.question).map_or(0, |rule| rule.points(self.answer))
    }
}

/// Question numbers arrive as `3` or `"3"`.
fn question_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u8),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(number) => Ok(number),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid question number '{text}'"))),
    }
}

/// Answer used for every question the reasoning service does not handle.
pub fn fixed_answer(question: u8) -> Option<QuestionAnswer> {
    let (answer, reasoning, confidence) = match question {
        1 => (
            Answer::Yes,
            "Immune checkpoint inhibitor-induced hepatotoxicity is well-documented in the literature.",
            Confidence::High,
        ),
        2 => (
            Answer::Yes,
            "This drug has been previously reported to the NIH (National Institutes of Health).",
            Confidence::High,
        ),
        6 => (
            Answer::Unknown,
            "No information available regarding placebo rechallenge.",
            Confidence::Low,
        ),
        7 => (
            Answer::Unknown,
            "Drug levels in body fluids were not measured.",
            Confidence::Low,
        ),
        8 => (
            Answer::Unknown,
            "This information cannot be determined from the provided data.",
            Confidence::Low,
        ),
        9 => (
            Answer::Unknown,
            "No information available about previous exposure to similar drugs.",
            Confidence::Low,
        ),
        10 => (
            Answer::Yes,
            "Hepatotoxicity confirmed by objective laboratory evidence (liver function tests).",
            Confidence::High,
        ),
        _ => return None,
    };
    Some(QuestionAnswer::new(question, answer, reasoning, confidence))
}
