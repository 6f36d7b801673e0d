use crate::{decide, ClassifyError, Result, Verdict};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use skinscan_model::{with_model, InferenceModel, ModelConfig, ModelProvider, OnnxModelProvider};
use skinscan_preprocess::{Preprocessor, ResizeFilter};
use std::path::Path;

/// Everything needed to build an ONNX-backed [`Classifier`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub model: ModelConfig,
    pub resize_filter: ResizeFilter,
}

impl ClassifierConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClassifyError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| ClassifyError::Config(format!("{}: {e}", path.display())))
    }
}

/// Preprocess → scoped inference → decision, for one image at a time.
pub struct Classifier<P> {
    preprocessor: Preprocessor,
    provider: P,
}

impl Classifier<OnnxModelProvider> {
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let preprocessor =
            Preprocessor::with_filter(config.model.input_side, config.resize_filter)?;
        Ok(Self::new(preprocessor, OnnxModelProvider::new(config.model.clone())))
    }
}

impl<P: ModelProvider> Classifier<P> {
    pub fn new(preprocessor: Preprocessor, provider: P) -> Self {
        Self { preprocessor, provider }
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Classify one image. The model is loaded for this call only.
    pub fn classify(&self, image: &DynamicImage) -> Result<Verdict> {
        log::debug!("starting classification of {}x{} image", image.width(), image.height());

        let tensor = self.preprocessor.run(image)?;
        let scores = with_model(&self.provider, |model| {
            model.infer(&tensor).map_err(ClassifyError::from)
        })?;

        log::debug!("model output length: {}", scores.len());
        for (i, score) in scores.iter().enumerate() {
            log::debug!("class {i} confidence: {score}");
        }

        let verdict = decide(&scores)?;
        log::info!("classification completed: {verdict}");
        Ok(verdict)
    }
}
