//! Delimiter detection for tab, comma, or whitespace separated exports.
//!
//! Each candidate is scored on the first lines of the file by how many
//! separators a line carries and how consistent that count is across lines.
//! Tab outranks comma, which outranks whitespace; a matching file extension
//! multiplies the score.

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// Lines inspected from the start of the file.
const PROBE_LINES: usize = 10;
/// Minimum score for a delimiter to be accepted.
const MIN_SCORE: f64 = 0.5;
const EXTENSION_BONUS: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Delimiter {
    Tab,
    Comma,
    /// Runs of spaces or tabs.
    Whitespace,
}

impl Delimiter {
    pub const ALL: [Delimiter; 3] = [Delimiter::Tab, Delimiter::Comma, Delimiter::Whitespace];

    /// Separator byte once whitespace runs have been collapsed to tabs.
    pub fn byte(self) -> u8 {
        match self {
            Self::Tab | Self::Whitespace => b'\t',
            Self::Comma => b',',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Tab => "Tab (TSV)",
            Self::Comma => "Comma (CSV)",
            Self::Whitespace => "Space (TXT)",
        }
    }

    fn weight(self) -> f64 {
        match self {
            Self::Tab => 1.2,
            Self::Comma => 1.0,
            Self::Whitespace => 0.8,
        }
    }

    fn count(self, line: &str) -> usize {
        match self {
            Self::Tab => line.matches('\t').count(),
            Self::Comma => line.matches(',').count(),
            Self::Whitespace => line.split_whitespace().count().saturating_sub(1),
        }
    }

    fn from_extension(file_name: &str) -> Option<Self> {
        let (_, extension) = file_name.rsplit_once('.')?;
        if extension.eq_ignore_ascii_case("csv") {
            Some(Self::Comma)
        } else if extension.eq_ignore_ascii_case("tsv") {
            Some(Self::Tab)
        } else {
            None
        }
    }
}

/// Winning delimiter and how sure the detector is (0.0 to 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelimiterGuess {
    pub delimiter: Delimiter,
    pub confidence: f64,
}

/// Picks the most plausible delimiter for `content`.
///
/// `file_name` is only used for its extension.
pub fn detect_delimiter(content: &str, file_name: Option<&str>) -> Result<DelimiterGuess> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(PROBE_LINES)
        .collect();
    if lines.len() < 2 {
        return Err(IngestError::InsufficientLines { lines: lines.len() });
    }
    let hint = file_name.and_then(Delimiter::from_extension);

    let mut best: Option<DelimiterGuess> = None;
    for delimiter in Delimiter::ALL {
        let mut score = score(&lines, delimiter);
        if hint == Some(delimiter) {
            score *= EXTENSION_BONUS;
        }
        if best.is_none_or(|current| score > current.confidence) {
            best = Some(DelimiterGuess {
                delimiter,
                confidence: score,
            });
        }
    }
    match best {
        Some(guess) if guess.confidence >= MIN_SCORE => Ok(DelimiterGuess {
            confidence: guess.confidence.min(1.0),
            ..guess
        }),
        Some(guess) => Err(IngestError::UndetectedDelimiter {
            score: guess.confidence,
        }),
        None => Err(IngestError::UndetectedDelimiter { score: 0.0 }),
    }
}

fn score(lines: &[&str], delimiter: Delimiter) -> f64 {
    let counts: Vec<usize> = lines
        .iter()
        .map(|line| delimiter.count(line))
        .filter(|count| *count > 0)
        .collect();
    let (Some(&max), Some(&min)) = (counts.iter().max(), counts.iter().min()) else {
        return 0.0;
    };
    let average = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
    let consistency = 1.0 - (max - min) as f64 / max as f64;
    let coverage = counts.len() as f64 / lines.len() as f64;

    let penalty = match delimiter {
        Delimiter::Whitespace => whitespace_penalty(lines),
        Delimiter::Tab if lines[0].matches(' ').count() as f64 > average => 0.2,
        _ => 0.0,
    };
    (average * consistency * coverage * delimiter.weight() - penalty).max(0.0)
}

/// Quoted text with spaces, or wide space padding, argues against whitespace.
fn whitespace_penalty(lines: &[&str]) -> f64 {
    let mut penalty = 0.0;
    for line in lines.iter().take(3) {
        if has_quoted_whitespace(line, '"') || has_quoted_whitespace(line, '\'') {
            penalty += 0.3;
        }
        if padding_runs(line) > 2 {
            penalty += 0.2;
        }
    }
    f64::min(penalty, 0.8)
}

fn has_quoted_whitespace(line: &str, quote: char) -> bool {
    let segments: Vec<&str> = line.split(quote).collect();
    // odd segments sit between a pair of quotes
    segments
        .iter()
        .enumerate()
        .skip(1)
        .step_by(2)
        .any(|(index, segment)| index + 1 < segments.len() && segment.contains(char::is_whitespace))
}

fn padding_runs(line: &str) -> usize {
    let mut runs = 0;
    let mut current = 0;
    for ch in line.chars() {
        if ch.is_whitespace() {
            current += 1;
        } else {
            if current >= 2 {
                runs += 1;
            }
            current = 0;
        }
    }
    if current >= 2 {
        runs += 1;
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_tab_separated_export() {
        let content = "patient_no\tday_num\tdrug_name\n1\t0\taspirin\n1\t2\theparin\n";
        let guess = detect_delimiter(content, Some("sample_drug_data.txt")).unwrap();
        assert_eq!(guess.delimiter, Delimiter::Tab);
        assert!(guess.confidence > 0.5);
    }

    #[test]
    fn detects_comma_separated_file() {
        let content = "a,b,c\n1,2,3\n4,5,6\n";
        let guess = detect_delimiter(content, None).unwrap();
        assert_eq!(guess.delimiter, Delimiter::Comma);
    }

    #[test]
    fn detects_space_separated_file() {
        let content = "patient day drug\n1 1 aspirin\n1 2 heparin\n";
        let guess = detect_delimiter(content, Some("drugs.txt")).unwrap();
        assert_eq!(guess.delimiter, Delimiter::Whitespace);
    }

    #[test]
    fn extension_breaks_close_calls() {
        // one comma and one tab per line: tab weight wins without a hint
        let content = "a,b\tc\n1,2\t3\n";
        assert_eq!(
            detect_delimiter(content, None).unwrap().delimiter,
            Delimiter::Tab
        );
        assert_eq!(
            detect_delimiter(content, Some("x.csv")).unwrap().delimiter,
            Delimiter::Comma
        );
    }

    #[test]
    fn rejects_single_line() {
        assert!(matches!(
            detect_delimiter("a,b,c\n", None),
            Err(IngestError::InsufficientLines { lines: 1 })
        ));
    }

    #[test]
    fn rejects_undelimited_text() {
        assert!(matches!(
            detect_delimiter("alpha\nbeta\n", None),
            Err(IngestError::UndetectedDelimiter { .. })
        ));
    }

    #[test]
    fn quoted_whitespace_is_detected() {
        assert!(has_quoted_whitespace(r#"1,"two words",3"#, '"'));
        assert!(!has_quoted_whitespace(r#"1,"one",3"#, '"'));
        assert!(!has_quoted_whitespace(r#"unterminated "quote here"#, '"'));
    }
}
