//! Scoped model acquisition.
//!
//! The classifier is not kept around between requests: each classification
//! acquires a model, uses it, and lets it drop before returning, whether the
//! work succeeded or not.

use crate::{InferenceModel, ModelError};

/// Source of freshly loaded models.
pub trait ModelProvider {
    type Model: InferenceModel;

    fn acquire(&self) -> Result<Self::Model, ModelError>;
}

impl<P: ModelProvider + ?Sized> ModelProvider for &P {
    type Model = P::Model;

    fn acquire(&self) -> Result<Self::Model, ModelError> {
        (**self).acquire()
    }
}

/// Acquire a model, run `f` with it, release it.
///
/// Acquisition failures are converted into the caller's error type; the model
/// is dropped when `f` returns, including on the error path.
pub fn with_model<P, T, E, F>(provider: &P, f: F) -> Result<T, E>
where
    P: ModelProvider + ?Sized,
    E: From<ModelError>,
    F: FnOnce(&mut P::Model) -> Result<T, E>,
{
    let mut model = provider.acquire()?;
    f(&mut model)
}
