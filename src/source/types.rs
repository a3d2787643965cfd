use crate::frame::{Frame, Shape};
use anyhow::Result;

/// Trait for sources of natural background imagery
/// Allows swapping between flat colors, noise, still images and videos
pub trait ImageSource {
    /// Produce the current background frame
    ///
    /// # Returns
    /// * RGB frame of shape (height, width, 3) matching [`ImageSource::shape`]
    fn get_image(&mut self) -> Result<Frame>;

    /// Refresh internal state at an episode boundary
    ///
    /// This is where sources backed by files pick and decode a new one.
    fn reset(&mut self) -> Result<()> {
        // Default implementation: no-op for stateless sources
        Ok(())
    }

    /// Spatial size of every frame this source produces
    fn shape(&self) -> Shape;
}

impl<S: ImageSource + ?Sized> ImageSource for Box<S> {
    fn get_image(&mut self) -> Result<Frame> {
        (**self).get_image()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn shape(&self) -> Shape {
        (**self).shape()
    }
}
