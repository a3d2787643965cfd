use super::{Environment, Step};
use crate::error::BackgroundError;
use crate::frame::{composite, to_rgb_image, Frame, Shape};
use crate::matting::BackgroundMatting;
use crate::output::OutputSink;
use crate::source::ImageSource;
use anyhow::Result;

/// Where the wrapper is in the episode lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    AwaitingReset,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Show the last composited frame on the attached viewer
    Human,
    /// Hand back the last composited frame
    RgbArray,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Whether the viewer is still open after showing the frame
    Human { open: bool },
    RgbArray(Frame),
}

/// Observation wrapper that swaps the background of every frame for natural content
///
/// The matting strategy decides which pixels are background; the image source
/// supplies what goes there. The source is reset at the start of every episode.
pub struct ReplaceBackgroundEnv<E, M, S> {
    env: E,
    matting: M,
    source: S,
    state: EpisodeState,
    last_frame: Option<Frame>,
    viewer: Option<Box<dyn OutputSink>>,
}

impl<E, M, S> ReplaceBackgroundEnv<E, M, S>
where
    E: Environment,
    M: BackgroundMatting,
    S: ImageSource,
{
    /// Wrap `env`; the source must produce frames of the environment's observation shape
    pub fn new(env: E, matting: M, source: S) -> Result<Self> {
        let expected = env.observation_shape();
        let actual = source.shape();
        if expected != actual {
            return Err(BackgroundError::ShapeMismatch {
                what: "background source",
                expected,
                actual,
            }
            .into());
        }

        tracing::info!("Replacing backgrounds of {} observations", expected);

        Ok(Self {
            env,
            matting,
            source,
            state: EpisodeState::AwaitingReset,
            last_frame: None,
            viewer: None,
        })
    }

    /// Attach the sink used by [`RenderMode::Human`]
    pub fn with_viewer(mut self, viewer: Box<dyn OutputSink>) -> Self {
        self.viewer = Some(viewer);
        self
    }

    /// Replace the masked pixels of `frame` with the source's current image
    pub fn observation(&mut self, mut frame: Frame) -> Result<Frame> {
        let _span = tracing::debug_span!("replace_background").entered();

        let mask = self.matting.get_mask(&frame)?;
        let background = self.source.get_image()?;
        composite(&mut frame, &mask, &background)?;

        self.last_frame = Some(frame.clone());
        Ok(frame)
    }

    pub fn render(&mut self, mode: RenderMode) -> Result<Rendered> {
        let frame = self
            .last_frame
            .as_ref()
            .ok_or(BackgroundError::NothingRendered)?;

        match mode {
            RenderMode::RgbArray => Ok(Rendered::RgbArray(frame.clone())),
            RenderMode::Human => {
                let viewer = self.viewer.as_mut().ok_or(BackgroundError::NoViewer)?;
                viewer.write_frame(&to_rgb_image(frame)?)?;
                Ok(Rendered::Human {
                    open: viewer.is_open(),
                })
            }
        }
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E, M, S> Environment for ReplaceBackgroundEnv<E, M, S>
where
    E: Environment,
    M: BackgroundMatting,
    S: ImageSource,
{
    type Action = E::Action;

    fn reset(&mut self) -> Result<Frame> {
        self.source.reset()?;
        let frame = self.env.reset()?;
        self.state = EpisodeState::Running;
        self.observation(frame)
    }

    fn step(&mut self, action: E::Action) -> Result<Step> {
        if self.state != EpisodeState::Running {
            return Err(BackgroundError::NotReset.into());
        }

        let step = self.env.step(action)?;
        Ok(Step {
            observation: self.observation(step.observation)?,
            ..step
        })
    }

    fn observation_shape(&self) -> Shape {
        self.env.observation_shape()
    }
}
