use std::borrow::Cow;

use crate::{error::EnhanceError, presets::PresetParams, video::types::Frame};

/// Core trait that every enhancement stage implements
///
/// Operators never mutate their input. A stage whose parameters make it a
/// no-op hands back `Cow::Borrowed(frame)` so the caller can skip a copy.
pub trait Operator: Send + Sync {
    /// Returns the unique name of this operator, used in logs and errors
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of this operator
    fn description(&self) -> &'static str;

    /// Apply the operator to one frame
    ///
    /// # Arguments
    ///
    /// * `frame` - The input frame, left untouched
    /// * `params` - The active preset's parameters
    ///
    /// # Returns
    ///
    /// The processed frame, the input itself when the stage is a no-op, or an
    /// error that the pipeline recovers from by keeping the input.
    fn apply<'a>(
        &self,
        frame: &'a Frame,
        params: &PresetParams,
    ) -> Result<Cow<'a, Frame>, EnhanceError>;
}

/// Shared precondition: operators refuse frames without pixels
pub(crate) fn ensure_not_empty(operator: &'static str, frame: &Frame) -> Result<(), EnhanceError> {
    if frame.is_empty() {
        Err(EnhanceError::EmptyFrame { operator })
    } else {
        Ok(())
    }
}

/// Shared precondition: float parameters must be finite
pub(crate) fn ensure_finite(
    operator: &'static str,
    parameter: &'static str,
    value: f32,
) -> Result<(), EnhanceError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EnhanceError::NonFiniteParameter { operator, parameter })
    }
}
