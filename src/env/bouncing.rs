use super::{Environment, Step};
use crate::frame::{filled, Frame, Shape};
use anyhow::Result;

/// Action of [`BouncingSquareEnv`]: a nudge to the square's velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    None,
    Left,
    Right,
    Up,
    Down,
}

impl Push {
    pub const ALL: [Push; 5] = [Push::None, Push::Left, Push::Right, Push::Up, Push::Down];
}

const MAX_SPEED: i64 = 4;

/// Toy environment: a colored square bouncing around a black screen
///
/// Rewards 1.0 for every wall bounce. Episodes end after `max_steps` steps.
pub struct BouncingSquareEnv {
    shape: Shape,
    size: usize,
    color: [f32; 3],
    max_steps: usize,

    position: (i64, i64),
    velocity: (i64, i64),
    steps: usize,
}

impl BouncingSquareEnv {
    pub fn new(shape: Shape, max_steps: usize) -> Self {
        let size = (shape.height.min(shape.width) / 8).max(1);
        Self {
            shape,
            size,
            color: [236.0, 236.0, 236.0],
            max_steps,
            position: (0, 0),
            velocity: (1, 1),
            steps: 0,
        }
    }

    /// Top-left corner of the square as (y, x)
    pub fn position(&self) -> (i64, i64) {
        self.position
    }

    pub fn square_size(&self) -> usize {
        self.size
    }

    fn render(&self) -> Frame {
        let mut frame = filled(self.shape, [0.0; 3]);
        let (top, left) = (self.position.0 as usize, self.position.1 as usize);
        for y in top..(top + self.size).min(self.shape.height) {
            for x in left..(left + self.size).min(self.shape.width) {
                for c in 0..3 {
                    frame[[y, x, c]] = self.color[c];
                }
            }
        }
        frame
    }

    /// Move one axis, reflecting off the walls; returns whether it bounced
    fn advance(position: &mut i64, velocity: &mut i64, limit: i64) -> bool {
        let next = *position + *velocity;
        if next < 0 || next > limit {
            *velocity = -*velocity;
            *position = next.clamp(0, limit);
            true
        } else {
            *position = next;
            false
        }
    }
}

impl Environment for BouncingSquareEnv {
    type Action = Push;

    fn reset(&mut self) -> Result<Frame> {
        self.position = (
            (self.shape.height.saturating_sub(self.size) / 2) as i64,
            (self.shape.width.saturating_sub(self.size) / 2) as i64,
        );
        self.velocity = (1, 1);
        self.steps = 0;
        Ok(self.render())
    }

    fn step(&mut self, action: Push) -> Result<Step> {
        let (dy, dx) = match action {
            Push::None => (0, 0),
            Push::Left => (0, -1),
            Push::Right => (0, 1),
            Push::Up => (-1, 0),
            Push::Down => (1, 0),
        };
        self.velocity.0 = (self.velocity.0 + dy).clamp(-MAX_SPEED, MAX_SPEED);
        self.velocity.1 = (self.velocity.1 + dx).clamp(-MAX_SPEED, MAX_SPEED);

        let max_y = self.shape.height.saturating_sub(self.size) as i64;
        let max_x = self.shape.width.saturating_sub(self.size) as i64;
        let bounced_y = Self::advance(&mut self.position.0, &mut self.velocity.0, max_y);
        let bounced_x = Self::advance(&mut self.position.1, &mut self.velocity.1, max_x);

        self.steps += 1;
        let reward = if bounced_y || bounced_x { 1.0 } else { 0.0 };

        Ok(Step {
            observation: self.render(),
            reward,
            done: self.steps >= self.max_steps,
        })
    }

    fn observation_shape(&self) -> Shape {
        self.shape
    }
}
