//! Trigrams and the raw record line format
//!
//! One record per line: `<trigram> <t1> <t2> ... <tN>`, timings in seconds.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Three characters; the middle one is the character under study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Trigram(pub [char; 3]);

impl Trigram {
    pub fn new(first: char, target: char, last: char) -> Self {
        Self([first, target, last])
    }

    pub fn target(&self) -> char {
        self.0[1]
    }

    pub fn chars(&self) -> [char; 3] {
        self.0
    }

    pub fn contains(&self, c: char) -> bool {
        self.0.contains(&c)
    }
}

impl fmt::Display for Trigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{}{}{}", a, b, c)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordLineError {
    #[error("empty record")]
    Empty,
    #[error("'{0}' is not a three-character trigram")]
    BadTrigram(String),
    #[error("'{0}' is not a timing in seconds")]
    BadTiming(String),
    #[error("record for '{0}' has no timings")]
    NoTimings(String),
}

impl FromStr for Trigram {
    type Err = RecordLineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), Some(c), None) => Ok(Trigram::new(a, b, c)),
            _ => Err(RecordLineError::BadTrigram(s.to_string())),
        }
    }
}

/// A trigram with one elapsed time per repetition
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSample {
    pub trigram: Trigram,
    /// Elapsed seconds, in recording order
    pub timings: Vec<f64>,
}

impl TimingSample {
    pub fn new(trigram: Trigram, timings: Vec<f64>) -> Self {
        Self { trigram, timings }
    }

    /// Render as one record line, newline included
    pub fn to_line(&self) -> String {
        let mut line = self.trigram.to_string();
        for t in &self.timings {
            line.push(' ');
            line.push_str(&t.to_string());
        }
        line.push('\n');
        line
    }

    /// Parse one record line; trailing whitespace is ignored
    pub fn parse_line(line: &str) -> Result<Self, RecordLineError> {
        // Leading whitespace is kept: a trigram may start with a space
        let line = line.trim_end();
        if line.is_empty() {
            return Err(RecordLineError::Empty);
        }
        let (trigram, rest) = split_trigram(line)?;
        let timings = rest
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| RecordLineError::BadTiming(t.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if timings.is_empty() {
            return Err(RecordLineError::NoTimings(trigram.to_string()));
        }
        Ok(Self { trigram, timings })
    }
}

/// The trigram occupies the first three characters of a line
fn split_trigram(line: &str) -> Result<(Trigram, &str), RecordLineError> {
    let end = line
        .char_indices()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    let (head, rest) = line.split_at(end);
    if !rest.is_empty() && !rest.starts_with(' ') {
        let token = line.split_whitespace().next().unwrap_or(line);
        return Err(RecordLineError::BadTrigram(token.to_string()));
    }
    Ok((head.parse()?, rest))
}
