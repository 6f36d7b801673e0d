use skinscan_model::ModelError;
use skinscan_preprocess::PreprocessError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("model could not be loaded: {0}")]
    ModelLoad(#[source] ModelError),
    #[error("no image acquired: {0}")]
    ImageAcquisition(String),
    #[error("image processing failed: {0}")]
    ImageProcessing(#[from] PreprocessError),
    #[error("inference failed: {0}")]
    Inference(#[source] ModelError),
    #[error("unsupported model output: expected 1 or 2 scores, got {len}")]
    UnsupportedOutputShape { len: usize },
    #[error("model produced score {value} at index {index}, expected a probability in [0, 1]")]
    InvalidScore { index: usize, value: f32 },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("classification queue is closed")]
    QueueClosed,
}

impl From<ModelError> for ClassifyError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Config(detail) => ClassifyError::Config(detail),
            e if e.is_load_failure() => ClassifyError::ModelLoad(e),
            e => ClassifyError::Inference(e),
        }
    }
}

impl ClassifyError {
    /// Text shown to the user when a request fails.
    pub fn user_message(&self) -> String {
        match self {
            ClassifyError::ModelLoad(e) => format!("Error loading model: {e}"),
            ClassifyError::ImageAcquisition(detail) => {
                format!("Failed to retrieve image! {detail}")
            }
            ClassifyError::ImageProcessing(e) => format!("Error processing image: {e}"),
            ClassifyError::Config(detail) => format!("Invalid configuration: {detail}"),
            other => format!("Error classifying image: {other}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_split_by_kind() {
        let load: ClassifyError = ModelError::NotFound("m.onnx".into()).into();
        assert!(matches!(load, ClassifyError::ModelLoad(_)));

        let run: ClassifyError = ModelError::Inference("bad graph".into()).into();
        assert!(matches!(run, ClassifyError::Inference(_)));

        let cfg: ClassifyError = ModelError::Config("cfg.json: EOF".into()).into();
        assert!(matches!(cfg, ClassifyError::Config(ref d) if d == "cfg.json: EOF"));
    }

    #[test]
    fn user_messages() {
        let e = ClassifyError::from(ModelError::NotFound("m.onnx".into()));
        assert_eq!(e.user_message(), "Error loading model: model file not found: m.onnx");

        let e = ClassifyError::ImageProcessing(PreprocessError::InvalidSide(0));
        assert_eq!(
            e.user_message(),
            "Error processing image: target side must be positive, got 0"
        );

        let e = ClassifyError::UnsupportedOutputShape { len: 3 };
        assert!(e.user_message().contains("expected 1 or 2 scores, got 3"));

        let e = ClassifyError::ImageAcquisition("no data".into());
        assert!(e.user_message().starts_with("Failed to retrieve image!"));

        let e = ClassifyError::Config("cfg.json: expected value".into());
        assert_eq!(e.user_message(), "Invalid configuration: cfg.json: expected value");

        let e = ClassifyError::InvalidScore { index: 0, value: 1.5 };
        assert_eq!(
            e.user_message(),
            "Error classifying image: model produced score 1.5 at index 0, \
             expected a probability in [0, 1]"
        );
    }
}
