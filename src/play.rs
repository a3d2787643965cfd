use crate::env::{Environment, RenderMode, Rendered, ReplaceBackgroundEnv};
use crate::frame::to_rgb_image;
use crate::matting::BackgroundMatting;
use crate::output::OutputSink;
use crate::source::ImageSource;
use anyhow::{Context, Result};

/// Summary of one played episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Episode {
    pub steps: usize,
    pub reward: f32,
    /// The human viewer closed before the episode finished
    pub viewer_closed: bool,
}

/// Play one episode, choosing actions with `policy`
///
/// Every composited observation, from the reset frame through the terminal
/// one, goes to `recorder` and, if `human` is set, to the wrapper's viewer.
pub fn play_episode<E, M, S, F>(
    env: &mut ReplaceBackgroundEnv<E, M, S>,
    mut recorder: Option<&mut dyn OutputSink>,
    human: bool,
    mut policy: F,
) -> Result<Episode>
where
    E: Environment,
    M: BackgroundMatting,
    S: ImageSource,
    F: FnMut() -> E::Action,
{
    let mut episode = Episode {
        steps: 0,
        reward: 0.0,
        viewer_closed: false,
    };

    if let Some(recorder) = recorder.as_deref_mut() {
        recorder.begin_episode()?;
    }

    env.reset().context("Failed to reset environment")?;
    if !present(env, recorder.as_deref_mut(), human)? {
        episode.viewer_closed = true;
        return Ok(episode);
    }

    loop {
        let step = env.step(policy()).context("Failed to step environment")?;
        episode.steps += 1;
        episode.reward += step.reward;

        if !present(env, recorder.as_deref_mut(), human)? {
            episode.viewer_closed = true;
            return Ok(episode);
        }
        if step.done {
            return Ok(episode);
        }
    }
}

/// Send the last composited frame out; false once the viewer has closed
fn present<E, M, S>(
    env: &mut ReplaceBackgroundEnv<E, M, S>,
    recorder: Option<&mut (dyn OutputSink + '_)>,
    human: bool,
) -> Result<bool>
where
    E: Environment,
    M: BackgroundMatting,
    S: ImageSource,
{
    if let Some(recorder) = recorder {
        if let Rendered::RgbArray(frame) = env.render(RenderMode::RgbArray)? {
            recorder.write_frame(&to_rgb_image(&frame)?)?;
        }
    }

    if human {
        if let Rendered::Human { open: false } = env.render(RenderMode::Human)? {
            tracing::info!("Viewer closed");
            return Ok(false);
        }
    }

    Ok(true)
}
