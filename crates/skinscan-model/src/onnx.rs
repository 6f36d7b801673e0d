//! ONNX Runtime backend
//!
//! Loads the exported lesion classifier into an `ort` session and feeds it the
//! NHWC tensor produced by `skinscan-preprocess`.

use crate::{check_input_side, InferenceModel, ModelConfig, ModelError, ModelProvider, Result};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use skinscan_preprocess::InputTensor;
use std::path::PathBuf;

fn optimization_level(level: u8) -> GraphOptimizationLevel {
    match level {
        0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}

fn build_session(config: &ModelConfig) -> ort::Result<Session> {
    let mut builder = Session::builder()?
        .with_optimization_level(optimization_level(config.optimization_level))?;
    if let Some(threads) = config.intra_threads {
        builder = builder.with_intra_threads(threads)?;
    }
    builder.commit_from_file(&config.model_path)
}

/// Lesion classifier session. Dropping it releases the runtime session.
pub struct OnnxClassifier {
    session: Session,
    input_side: u32,
    model_path: PathBuf,
}

impl OnnxClassifier {
    /// Load and optimize the ONNX model, preparing it for inference.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        if !config.model_path.is_file() {
            return Err(ModelError::NotFound(config.model_path.clone()));
        }

        let session = build_session(config).map_err(|e| ModelError::Load {
            path: config.model_path.clone(),
            message: e.to_string(),
        })?;
        log::debug!("loaded model {}", config.model_path.display());

        Ok(Self {
            session,
            input_side: config.input_side,
            model_path: config.model_path.clone(),
        })
    }

    fn run(&mut self, batch: Array4<f32>) -> ort::Result<Option<Vec<f32>>> {
        let input = Tensor::from_array(batch)?;
        let outputs = self.session.run(ort::inputs![input])?;
        if outputs.len() == 0 {
            return Ok(None);
        }
        let (_shape, scores) = outputs[0].try_extract_tensor::<f32>()?;
        Ok(Some(scores.to_vec()))
    }
}

impl InferenceModel for OnnxClassifier {
    fn input_side(&self) -> u32 {
        self.input_side
    }

    fn infer(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        check_input_side(self.input_side, input)?;
        self.run(input.view().to_owned())
            .map_err(|e| ModelError::Inference(e.to_string()))?
            .ok_or(ModelError::MissingOutput)
    }
}

impl Drop for OnnxClassifier {
    fn drop(&mut self) {
        log::debug!("released model {}", self.model_path.display());
    }
}

/// Loads a fresh [`OnnxClassifier`] from the same config on every acquisition.
#[derive(Debug, Clone)]
pub struct OnnxModelProvider {
    config: ModelConfig,
}

impl OnnxModelProvider {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl ModelProvider for OnnxModelProvider {
    type Model = OnnxClassifier;

    fn acquire(&self) -> Result<OnnxClassifier> {
        OnnxClassifier::load(&self.config)
    }
}

/// Check that a model artifact loads, then release it.
pub fn validate_model(config: &ModelConfig) -> Result<()> {
    let model = OnnxClassifier::load(config)?;

    // Basic validation - check if we can create a session
    drop(model);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_model_is_not_found() {
        let temp_dir = tempdir().unwrap();
        let config = ModelConfig::for_model(temp_dir.path().join("absent.onnx"));

        let err = OnnxClassifier::load(&config).err().unwrap();
        assert!(matches!(err, ModelError::NotFound(_)));
        assert!(err.is_load_failure());
    }

    #[test]
    fn test_directory_is_not_a_model() {
        let temp_dir = tempdir().unwrap();
        let config = ModelConfig::for_model(temp_dir.path());

        assert!(matches!(validate_model(&config), Err(ModelError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_model_is_load_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bad.onnx");
        std::fs::write(&path, b"definitely not a protobuf graph").unwrap();
        let config = ModelConfig::for_model(path.clone());

        let err = OnnxClassifier::load(&config).err().unwrap();
        assert!(matches!(err, ModelError::Load { ref path, .. } if path.ends_with("bad.onnx")));
        assert!(err.is_load_failure());
        assert!(matches!(validate_model(&config), Err(ModelError::Load { .. })));
    }

    #[test]
    fn test_provider_surfaces_load_failure() {
        let provider = OnnxModelProvider::new(ModelConfig::for_model("/nonexistent/lesion.onnx"));
        assert_eq!(provider.config().input_side, 224);
        assert!(matches!(provider.acquire(), Err(ModelError::NotFound(_))));
    }

    #[test]
    fn test_optimization_level_mapping() {
        assert!(matches!(optimization_level(0), GraphOptimizationLevel::Disable));
        assert!(matches!(optimization_level(2), GraphOptimizationLevel::Level2));
        assert!(matches!(optimization_level(9), GraphOptimizationLevel::Level3));
    }
}
