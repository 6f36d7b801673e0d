use crate::{ClassifyError, Result};
use image::DynamicImage;
use std::path::PathBuf;

/// Where a photo comes from. Capture itself happens elsewhere; this only
/// turns whatever was handed over into a decoded image.
#[derive(Debug, Clone)]
pub enum ImageSource {
    File(PathBuf),
    /// Encoded bytes (PNG/JPEG) as returned by a picker or camera intent.
    Bytes(Vec<u8>),
}

impl ImageSource {
    pub fn acquire(&self) -> Result<DynamicImage> {
        match self {
            ImageSource::File(path) => image::open(path).map_err(|e| {
                ClassifyError::ImageAcquisition(format!("{}: {e}", path.display()))
            }),
            ImageSource::Bytes(bytes) if bytes.is_empty() => {
                Err(ClassifyError::ImageAcquisition("no image data returned".into()))
            }
            ImageSource::Bytes(bytes) => image::load_from_memory(bytes)
                .map_err(|e| ClassifyError::ImageAcquisition(e.to_string())),
        }
    }
}
