use anyhow::{bail, Context, Result};
use clap::Parser;
use natural_env::env::{BouncingSquareEnv, Push, ReplaceBackgroundEnv};
use natural_env::frame::Shape;
use natural_env::matting::ColorKeyMatting;
use natural_env::output::{FrameDumper, LoopbackViewer, OutputSink};
use natural_env::play::play_episode;
use natural_env::source::{self, ImageSource, SourceConfig, SourceKind, DEFAULT_NOISE_STRENGTH};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Background source to draw replacement pixels from
    #[arg(long, value_enum, default_value_t = SourceKind::Color)]
    imgsource: SourceKind,

    /// Glob pattern for the image or video files
    #[arg(long)]
    resource_files: Option<String>,

    /// Color of the fixed-color source, as R,G,B
    #[arg(long, value_parser = parse_color, default_value = "0,0,0")]
    color: [u8; 3],

    /// Background color to key out of observations, as R,G,B
    #[arg(long, value_parser = parse_color, default_value = "0,0,0")]
    key_color: [u8; 3],

    /// Strength of the noise source
    #[arg(long, default_value_t = DEFAULT_NOISE_STRENGTH)]
    noise_strength: f32,

    /// Existing directory to dump composited frames into
    #[arg(long)]
    dump_video: Option<PathBuf>,

    /// v4l2loopback device to show frames on
    #[arg(long)]
    viewer_device: Option<PathBuf>,

    /// Observation width
    #[arg(long, default_value_t = 160)]
    width: usize,

    /// Observation height
    #[arg(long, default_value_t = 210)]
    height: usize,

    /// Number of episodes to play
    #[arg(long, default_value_t = 1)]
    episodes: usize,

    /// Steps per episode
    #[arg(long, default_value_t = 500)]
    max_steps: usize,

    /// Seed for background and action randomness
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn parse_color(s: &str) -> Result<[u8; 3], String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u8>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    <[u8; 3]>::try_from(parts).map_err(|p| format!("expected R,G,B, got {} components", p.len()))
}

/// Expand `~` and the glob pattern into a sorted file list
fn resolve_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let expanded = match (pattern.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest).display().to_string(),
        _ => pattern.to_string(),
    };

    let mut files = glob::glob(&expanded)
        .with_context(|| format!("Invalid glob pattern {pattern}"))?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read a matched path")?;
    files.sort();

    if files.is_empty() {
        bail!("Pattern {} does not match any files", pattern);
    }
    tracing::info!("Pattern {} matched {} files", pattern, files.len());
    Ok(files)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("natural-env starting");
    tracing::info!("Observation: {}x{}", args.width, args.height);

    let shape = Shape::new(args.height, args.width);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut config = SourceConfig::new(args.imgsource, shape);
    config.color = args.color;
    config.noise_strength = args.noise_strength;
    if matches!(args.imgsource, SourceKind::Images | SourceKind::Videos) {
        let pattern = args
            .resource_files
            .as_deref()
            .context("--resource-files is required for image and video sources")?;
        config.files = resolve_files(pattern)?;
    }

    let background = source::create_source(&config, StdRng::seed_from_u64(rng.gen()))
        .context("Failed to create background source")?;

    let base = BouncingSquareEnv::new(shape, args.max_steps);
    let matting = ColorKeyMatting::new(args.key_color);
    tracing::info!("Keying out background color {:?}", matting.color());
    let mut env = ReplaceBackgroundEnv::new(base, matting, background)?;

    let has_viewer = args.viewer_device.is_some();
    if let Some(device) = &args.viewer_device {
        let viewer = LoopbackViewer::new(device, (args.width * 4) as u32, (args.height * 4) as u32)
            .context("Failed to initialize viewer")?;
        env = env.with_viewer(Box::new(viewer));
    }

    let mut dumper = args
        .dump_video
        .as_ref()
        .map(FrameDumper::new)
        .transpose()
        .context("Failed to initialize frame dump")?;

    play(&mut env, dumper.as_mut(), has_viewer, args.episodes, &mut rng)
}

fn play<S: ImageSource>(
    env: &mut ReplaceBackgroundEnv<BouncingSquareEnv, ColorKeyMatting, S>,
    mut dumper: Option<&mut FrameDumper>,
    has_viewer: bool,
    episodes: usize,
    rng: &mut StdRng,
) -> Result<()> {
    let mut total_steps = 0usize;
    let mut total_time = Duration::ZERO;

    for index in 0..episodes {
        tracing::info!("Starting episode {}", index);

        let start = Instant::now();
        let recorder = dumper.as_deref_mut().map(|d| d as &mut dyn OutputSink);
        let episode = play_episode(env, recorder, has_viewer, || {
            Push::ALL.choose(&mut *rng).copied().unwrap_or(Push::None)
        })?;
        total_time += start.elapsed();
        total_steps += episode.steps;

        tracing::info!(
            "Episode {} finished: steps={}, reward={}, avg step={:.2}ms",
            index,
            episode.steps,
            episode.reward,
            total_time.as_secs_f64() * 1000.0 / total_steps.max(1) as f64
        );

        if episode.viewer_closed {
            tracing::info!("Viewer closed, stopping");
            break;
        }
    }

    Ok(())
}
