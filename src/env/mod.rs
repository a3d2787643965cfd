mod bouncing;
mod wrapper;

pub use bouncing::{BouncingSquareEnv, Push};
pub use wrapper::{EpisodeState, RenderMode, Rendered, ReplaceBackgroundEnv};

use crate::frame::{Frame, Shape};
use anyhow::Result;

/// Outcome of one environment step
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Frame,
    pub reward: f32,
    pub done: bool,
}

/// Trait for environments that emit image observations
pub trait Environment {
    type Action;

    /// Start a new episode and return its first observation
    fn reset(&mut self) -> Result<Frame>;

    /// Advance the episode by one action
    fn step(&mut self, action: Self::Action) -> Result<Step>;

    /// Get the (height, width) of every observation
    fn observation_shape(&self) -> Shape;
}
