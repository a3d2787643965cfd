use crate::frame::{Frame, Mask};
use anyhow::Result;

/// Trait for background matting strategies
/// Allows swapping between different ways of finding the background (color key, background subtraction, ...)
pub trait BackgroundMatting {
    /// Compute which pixels of a frame belong to the background
    ///
    /// # Arguments
    /// * `frame` - Observation frame of shape (height, width, 3)
    ///
    /// # Returns
    /// * Mask of shape (height, width); true marks a pixel to be replaced
    fn get_mask(&self, frame: &Frame) -> Result<Mask>;
}

impl<M: BackgroundMatting + ?Sized> BackgroundMatting for Box<M> {
    fn get_mask(&self, frame: &Frame) -> Result<Mask> {
        (**self).get_mask(frame)
    }
}
