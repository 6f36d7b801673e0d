// skinscan-classify/src/lib.rs
// ============================================================
// skinscan-classify  –  lesion classification stage
// Runs a pretrained benign/malignant network on one photo and
// turns its raw scores into a labelled verdict.
// ------------------------------------------------------------
// Pipeline: DynamicImage → InputTensor → Vec<f32> → Verdict
// ------------------------------------------------------------
// Public API
//   * decide(scores)              – scores → Verdict
//   * Classifier::classify(img)   – full pipeline, scoped model
//   * ClassifyQueue::spawn(c)     – serialize overlapping requests
//   * present(outcome, presenter) – request boundary
// ============================================================

//! skinscan – classification layer
//!
//! [`decide`] is the pure core: a one-element output is read as a malignancy
//! probability, a two-element output as `[benign, malignant]` scores. Every
//! other length is a [`ClassifyError::UnsupportedOutputShape`].
//!
//! [`Classifier`] wires `skinscan-preprocess` and `skinscan-model` together.
//! The model is acquired per call and dropped before `classify` returns, so a
//! classifier holds no runtime state between requests.

mod classifier;
mod decision;
mod error;
mod present;
mod queue;
mod source;

pub use classifier::{Classifier, ClassifierConfig};
pub use decision::{decide, DisplayColor, Label, Verdict, MALIGNANT_THRESHOLD};
pub use error::{ClassifyError, Result};
pub use present::{present, Presenter};
pub use queue::{ClassifyQueue, Pending};
pub use source::ImageSource;
