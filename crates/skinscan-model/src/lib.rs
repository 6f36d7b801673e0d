//! # skinscan-model
//!
//! The model boundary of skinscan: a pretrained lesion classifier exported to
//! ONNX, wrapped behind the [`InferenceModel`] trait so the decision logic never
//! sees the runtime.
//!
//! ## Features
//!
//! - Serializable [`ModelConfig`] (JSON on disk)
//! - ONNX Runtime backed [`OnnxClassifier`] taking `[1, side, side, 3]` f32 input
//! - Scoped acquisition via [`ModelProvider`] + [`with_model`]: the session is
//!   loaded for one classification and dropped on every exit path

use serde::{Deserialize, Serialize};
use skinscan_preprocess::{InputTensor, DEFAULT_SIDE};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod onnx;
pub mod scope;

pub use onnx::{validate_model, OnnxClassifier, OnnxModelProvider};
pub use scope::{with_model, ModelProvider};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to load model {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },
    #[error("model expects {expected}x{expected} input, got {actual}x{actual}")]
    InputShape { expected: u32, actual: u32 },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model produced no outputs")]
    MissingOutput,
    #[error("config error: {0}")]
    Config(String),
}

impl ModelError {
    /// `true` when the artifact itself could not be brought up.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, ModelError::NotFound(_) | ModelError::Load { .. } | ModelError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Configuration for loading the classifier artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file
    pub model_path: PathBuf,
    /// Square input side the model was exported with
    pub input_side: u32,
    /// Graph optimization level, 0 (disabled) to 3 (all)
    pub optimization_level: u8,
    /// Intra-op thread count; runtime default when unset
    pub intra_threads: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/skin_lesion.onnx"),
            input_side: DEFAULT_SIDE,
            optimization_level: 3,
            intra_threads: None,
        }
    }
}

impl ModelConfig {
    /// Config pointing at `model_path` with every other field defaulted.
    pub fn for_model(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| ModelError::Config(format!("{}: {e}", path.display())))
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| ModelError::Config(e.to_string()))?;
        std::fs::write(path, text)
            .map_err(|e| ModelError::Config(format!("{}: {e}", path.display())))
    }
}

/// Anything that maps one normalized image tensor to a raw score vector.
pub trait InferenceModel {
    /// Square side the model accepts.
    fn input_side(&self) -> u32;

    /// Run the model once. The output is returned as-is; interpreting its
    /// length is the caller's business.
    fn infer(&mut self, input: &InputTensor) -> Result<Vec<f32>>;
}

impl<M: InferenceModel + ?Sized> InferenceModel for Box<M> {
    fn input_side(&self) -> u32 {
        (**self).input_side()
    }

    fn infer(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        (**self).infer(input)
    }
}

/// Reject tensors that don't match the model's square input.
pub fn check_input_side(model_side: u32, input: &InputTensor) -> Result<()> {
    if input.side() != model_side {
        return Err(ModelError::InputShape {
            expected: model_side,
            actual: input.side(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use skinscan_preprocess::Preprocessor;
    use tempfile::tempdir;

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(config.input_side, 224);
        assert_eq!(config.optimization_level, 3);
        assert!(config.intra_threads.is_none());
    }

    #[test]
    fn test_config_json_roundtrip_on_disk() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("model.json");
        let config = ModelConfig {
            model_path: PathBuf::from("/tmp/lesion.onnx"),
            input_side: 128,
            optimization_level: 1,
            intra_threads: Some(2),
        };

        config.to_json_file(&path).unwrap();
        assert_eq!(ModelConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ModelConfig = serde_json::from_str(r#"{"model_path": "m.onnx"}"#).unwrap();
        assert_eq!(config.model_path, PathBuf::from("m.onnx"));
        assert_eq!(config.input_side, 224);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = ModelConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
        assert!(err.is_load_failure());
    }

    #[test]
    fn test_input_side_check() {
        let t = Preprocessor::new(8).unwrap().run(&DynamicImage::new_rgb8(3, 3)).unwrap();
        assert!(check_input_side(8, &t).is_ok());
        assert!(matches!(
            check_input_side(224, &t),
            Err(ModelError::InputShape { expected: 224, actual: 8 })
        ));
    }
}
