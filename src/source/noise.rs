use super::types::ImageSource;
use crate::frame::{Frame, Shape};
use anyhow::Result;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

pub const DEFAULT_NOISE_STRENGTH: f32 = 50.0;

/// Gaussian noise background, half-rectified
///
/// Every value is `max(0, strength * N(0, 1))`, freshly sampled on each call.
/// Values are not bounded above.
pub struct NoiseSource<R: Rng = StdRng> {
    shape: Shape,
    strength: f32,
    rng: R,
}

impl<R: Rng> NoiseSource<R> {
    pub fn new(shape: Shape, rng: R) -> Self {
        Self::with_strength(shape, DEFAULT_NOISE_STRENGTH, rng)
    }

    pub fn with_strength(shape: Shape, strength: f32, rng: R) -> Self {
        Self {
            shape,
            strength,
            rng,
        }
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }
}

impl<R: Rng> ImageSource for NoiseSource<R> {
    fn get_image(&mut self) -> Result<Frame> {
        let strength = self.strength;
        let rng = &mut self.rng;
        Ok(Array3::from_shape_simple_fn(
            (self.shape.height, self.shape.width, 3),
            || {
                let sample: f32 = rng.sample(StandardNormal);
                (strength * sample).max(0.0)
            },
        ))
    }

    fn shape(&self) -> Shape {
        self.shape
    }
}
