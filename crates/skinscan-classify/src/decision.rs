//! Raw model scores → benign/malignant verdict.

use crate::{ClassifyError, Result};
use serde::Serialize;
use std::fmt;

/// Single-output models flag malignancy strictly above this probability.
pub const MALIGNANT_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    Benign,
    Malignant,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Benign => "Benign",
            Label::Malignant => "Malignant",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour the result line is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayColor {
    /// Warning red, for high-risk verdicts.
    Alert,
    Normal,
}

impl DisplayColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            DisplayColor::Alert => [255, 0, 0],
            DisplayColor::Normal => [0, 0, 0],
        }
    }
}

/// Outcome of one classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub label: Label,
    /// Probability of `label`, in [0, 1].
    pub confidence: f32,
}

impl Verdict {
    pub fn is_high_risk(&self) -> bool {
        self.label == Label::Malignant
    }

    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }

    /// Percentage with exactly two decimals, e.g. `"73.00"`.
    pub fn confidence_text(&self) -> String {
        format!("{:.2}", self.confidence_percent())
    }

    pub fn display_color(&self) -> DisplayColor {
        if self.is_high_risk() {
            DisplayColor::Alert
        } else {
            DisplayColor::Normal
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}% confidence)", self.label, self.confidence_text())
    }
}

/// Map the model's output vector to a verdict.
///
/// * one score `p`: malignancy probability, Malignant iff `p > 0.5`
/// * two scores `[benign, malignant]`: the larger wins, ties go to Benign
///
/// Any other length is rejected instead of guessed at, and so is any score
/// outside [0, 1] (logits, NaN, ±inf).
pub fn decide(scores: &[f32]) -> Result<Verdict> {
    if !(1..=2).contains(&scores.len()) {
        return Err(ClassifyError::UnsupportedOutputShape { len: scores.len() });
    }
    if let Some(index) = scores.iter().position(|s| !(0.0..=1.0).contains(s)) {
        return Err(ClassifyError::InvalidScore { index, value: scores[index] });
    }

    let verdict = match *scores {
        [p] if p > MALIGNANT_THRESHOLD => Verdict { label: Label::Malignant, confidence: p },
        [p] => Verdict { label: Label::Benign, confidence: 1.0 - p },
        [benign, malignant] if malignant > benign => Verdict {
            label: Label::Malignant,
            confidence: malignant,
        },
        [benign, _] => Verdict { label: Label::Benign, confidence: benign },
        _ => return Err(ClassifyError::UnsupportedOutputShape { len: scores.len() }),
    };
    Ok(verdict)
}
