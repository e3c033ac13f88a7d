//! Per-character effort estimates from trigram timings

use super::color::ColorScale;
use super::records::TrigramRecord;
use crate::fingers::{Hand, HandFingerMap};
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

/// How per-character times are derived from trigram times
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum EffortMode {
    /// Least-squares fit of trigram time as a sum of character times
    #[default]
    Model,
    /// Mean over all trigrams containing the character
    Average,
    /// Mean over trigrams with the character in the middle
    AverageCenter,
}

impl fmt::Display for EffortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Model => "model",
            Self::Average => "average",
            Self::AverageCenter => "average-center",
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("no timings for any configured character")]
    NoData,
    #[error("cannot fit {hand} hand model: characters do not vary independently in the recorded trigrams")]
    Singular { hand: Hand },
    #[error("smallest effort is {0:.4} s; adjust the hand bias so every effort stays positive")]
    NonPositiveScale(f64),
}

/// Estimated time of one character, in seconds after bias removal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharEffort {
    pub ch: char,
    /// `None` when no recorded trigram involves the character
    pub seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandEfforts {
    pub hand: Hand,
    pub chars: Vec<CharEffort>,
}

/// Efforts for both hands, normalized against the fastest character
#[derive(Debug, Clone, PartialEq)]
pub struct EffortReport {
    pub mode: EffortMode,
    pub hands: Vec<HandEfforts>,
    /// Smallest effort in seconds; the unit of relative effort
    pub min: f64,
    pub max: f64,
}

impl EffortReport {
    /// Estimate efforts for every character in `map`.
    ///
    /// `bias` gives the per-hand overhead in seconds subtracted from every
    /// timing.
    pub fn estimate(
        records: &[TrigramRecord],
        map: &HandFingerMap,
        bias: impl Fn(Hand) -> f64,
        mode: EffortMode,
    ) -> Result<Self, AnalysisError> {
        let mut hands = Vec::with_capacity(Hand::ALL.len());
        for hand in Hand::ALL {
            let chars = map.hand_chars(hand);
            let seconds = match mode {
                EffortMode::Model => fit_model(records, &chars, bias(hand))
                    .ok_or(AnalysisError::Singular { hand })?,
                EffortMode::Average => averages(records, &chars, bias(hand), false),
                EffortMode::AverageCenter => averages(records, &chars, bias(hand), true),
            };
            hands.push(HandEfforts {
                hand,
                chars: chars
                    .into_iter()
                    .zip(seconds)
                    .map(|(ch, seconds)| CharEffort { ch, seconds })
                    .collect(),
            });
        }

        let known: Vec<f64> = hands
            .iter()
            .flat_map(|h| h.chars.iter().filter_map(|c| c.seconds))
            .collect();
        let min = known.iter().copied().reduce(f64::min).ok_or(AnalysisError::NoData)?;
        let max = known.iter().copied().fold(min, f64::max);
        if min <= 0.0 {
            return Err(AnalysisError::NonPositiveScale(min));
        }

        Ok(Self { mode, hands, min, max })
    }

    /// Effort relative to the fastest character
    pub fn relative(&self, seconds: f64) -> f64 {
        seconds / self.min
    }

    pub fn color_scale(&self) -> ColorScale {
        ColorScale::new(1.0, self.max / self.min)
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let scale = self.color_scale();
        writeln!(out, "Effort scale: {}", self.min)?;
        for hand in &self.hands {
            writeln!(out, "\nHand: {}", hand.hand)?;
            for c in &hand.chars {
                match c.seconds {
                    Some(seconds) => {
                        let effort = self.relative(seconds);
                        writeln!(out, "Char {}: {:.2}  color: {}", c.ch, effort, scale.hex(effort))?
                    }
                    None => writeln!(out, "Char {}: no data", c.ch)?,
                }
            }
        }
        Ok(())
    }
}

fn averages(records: &[TrigramRecord], chars: &[char], bias: f64, center: bool) -> Vec<Option<f64>> {
    chars
        .iter()
        .map(|&ch| {
            let means: Vec<f64> = records
                .iter()
                .filter(|r| if center { r.trigram.target() == ch } else { r.trigram.contains(ch) })
                .filter_map(TrigramRecord::mean)
                .collect();
            if means.is_empty() {
                None
            } else {
                Some(means.iter().sum::<f64>() / means.len() as f64 - bias)
            }
        })
        .collect()
}

/// Least squares without intercept: every best timing is a row, every hand
/// character occurring in the trigram contributes its own unknown time.
/// Characters never seen get `None`. Returns `None` for a singular system.
fn fit_model(records: &[TrigramRecord], chars: &[char], bias: f64) -> Option<Vec<Option<f64>>> {
    let seen: Vec<usize> = (0..chars.len())
        .filter(|&j| records.iter().any(|r| r.trigram.contains(chars[j]) && !r.timings.is_empty()))
        .collect();
    let n = seen.len();

    // Normal equations: (X^T X) beta = X^T y
    let mut xtx = vec![vec![0.0; n]; n];
    let mut xty = vec![0.0; n];
    for record in records {
        let row: Vec<usize> = (0..n).filter(|&k| record.trigram.contains(chars[seen[k]])).collect();
        if row.is_empty() {
            continue;
        }
        for &timing in &record.timings {
            let y = timing - bias;
            for &a in &row {
                xty[a] += y;
                for &b in &row {
                    xtx[a][b] += 1.0;
                }
            }
        }
    }

    let beta = solve(xtx, xty)?;
    let mut out = vec![None; chars.len()];
    for (k, &j) in seen.iter().enumerate() {
        out[j] = Some(beta[k]);
    }
    Some(out)
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |m, v| m.max(v.abs()))
        .max(1.0);
    let eps = 1e-9 * scale;

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < eps {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col].clone();
        for row in col + 1..n {
            let factor = a[row][col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for (k, p) in pivot_row.iter().enumerate().skip(col) {
                a[row][k] -= factor * p;
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingers::tests::small_map;
    use crate::recording::Trigram;
    use assert_matches::assert_matches;

    fn record(t: &str, timings: &[f64]) -> TrigramRecord {
        TrigramRecord {
            trigram: t.parse::<Trigram>().unwrap(),
            timings: timings.to_vec(),
        }
    }

    fn efforts(report: &EffortReport, hand: Hand) -> Vec<(char, Option<f64>)> {
        report
            .hands
            .iter()
            .find(|h| h.hand == hand)
            .unwrap()
            .chars
            .iter()
            .map(|c| (c.ch, c.seconds))
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Timings built as exact sums of per-char times
    fn additive_records() -> Vec<TrigramRecord> {
        // left: f=.1 g=.2 d=.3 s=.4 a=.5; right: j=.1 h=.2 k=.3 l=.4 ;=.5
        vec![
            record("dfs", &[0.8]),
            record("sfa", &[1.0]),
            record("dga", &[1.0]),
            record("sga", &[1.1]),
            record("sda", &[1.2]),
            record("kjl", &[0.8]),
            record("lj;", &[1.0]),
            record("kh;", &[1.0]),
            record("lh;", &[1.1]),
            record("lk;", &[1.2]),
        ]
    }

    #[test]
    fn solve_simple_system() {
        let x = solve(vec![vec![2.0, 1.0], vec![1.0, 3.0]], vec![3.0, 5.0]).unwrap();
        assert!(close(x[0], 0.8));
        assert!(close(x[1], 1.4));
    }

    #[test]
    fn solve_needs_pivoting() {
        let x = solve(vec![vec![0.0, 1.0], vec![1.0, 0.0]], vec![2.0, 3.0]).unwrap();
        assert!(close(x[0], 3.0));
        assert!(close(x[1], 2.0));
    }

    #[test]
    fn solve_rejects_singular() {
        assert!(solve(vec![vec![1.0, 1.0], vec![1.0, 1.0]], vec![1.0, 1.0]).is_none());
    }

    #[test]
    fn model_recovers_additive_times() {
        let report =
            EffortReport::estimate(&additive_records(), &small_map(), |_| 0.0, EffortMode::Model)
                .unwrap();
        let left = efforts(&report, Hand::Left);
        let expected = [('f', 0.1), ('g', 0.2), ('d', 0.3), ('s', 0.4), ('a', 0.5)];
        for ((ch, got), (want_ch, want)) in left.iter().zip(expected) {
            assert_eq!(*ch, want_ch);
            assert!(close(got.unwrap(), want), "{}: {:?}", ch, got);
        }
        assert!(close(report.min, 0.1));
        assert!(close(report.max, 0.5));
    }

    #[test]
    fn model_subtracts_bias() {
        let records: Vec<_> = additive_records()
            .into_iter()
            .map(|mut r| {
                r.timings[0] += 0.05;
                r
            })
            .collect();
        let report =
            EffortReport::estimate(&records, &small_map(), |_| 0.05, EffortMode::Model).unwrap();
        assert!(close(report.min, 0.1));
    }

    #[test]
    fn model_with_too_few_trigrams_is_singular() {
        let records = vec![record("dfs", &[0.8]), record("kjl", &[0.8])];
        let err =
            EffortReport::estimate(&records, &small_map(), |_| 0.0, EffortMode::Model).unwrap_err();
        assert_matches!(err, AnalysisError::Singular { hand: Hand::Left });
    }

    #[test]
    fn average_modes() {
        let records = vec![record("dfs", &[0.6, 0.8]), record("sda", &[0.9])];
        let report =
            EffortReport::estimate(&records, &small_map(), |_| 0.0, EffortMode::Average).unwrap();
        let left = efforts(&report, Hand::Left);
        assert_eq!(left[0].0, 'f');
        assert!(close(left[0].1.unwrap(), 0.7));
        assert_eq!(left[1], ('g', None));
        assert!(close(left[2].1.unwrap(), 0.8));

        let report =
            EffortReport::estimate(&records, &small_map(), |_| 0.0, EffortMode::AverageCenter)
                .unwrap();
        let left = efforts(&report, Hand::Left);
        assert_eq!(left[2], ('d', Some(0.9)));
        assert_eq!(left[3], ('s', None));
    }

    #[test]
    fn no_records_is_no_data() {
        let err = EffortReport::estimate(&[], &small_map(), |_| 0.0, EffortMode::Average).unwrap_err();
        assert_eq!(err, AnalysisError::NoData);
    }

    #[test]
    fn oversized_bias_is_rejected() {
        let records = vec![record("dfs", &[0.5])];
        let err =
            EffortReport::estimate(&records, &small_map(), |_| 1.0, EffortMode::Average).unwrap_err();
        assert_matches!(err, AnalysisError::NonPositiveScale(_));
    }

    #[test]
    fn printed_report() {
        let records = vec![record("dfs", &[0.2]), record("sda", &[0.4])];
        let report =
            EffortReport::estimate(&records, &small_map(), |_| 0.0, EffortMode::AverageCenter)
                .unwrap();
        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Effort scale: 0.2\n"));
        assert!(text.contains("\nHand: left\n"));
        assert!(text.contains("Char f: 1.00  color: #ffffff"));
        assert!(text.contains("Char d: 2.00  color: #8a36f8"));
        assert!(text.contains("Char g: no data"));
    }
}
