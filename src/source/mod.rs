mod color;
pub mod decode;
mod image_file;
mod noise;
pub mod types;
mod video;

pub use color::{FixedColorSource, RandomColorSource};
pub use decode::{AutoDecoder, FfmpegDecoder, GifDecoder, VideoDecoder};
pub use image_file::{load_image, RandomImageSource};
pub use noise::{NoiseSource, DEFAULT_NOISE_STRENGTH};
pub use types::ImageSource;
pub use video::RandomVideoSource;

use crate::frame::Shape;
use anyhow::Result;
use rand::rngs::StdRng;
use std::path::PathBuf;

/// Background source variants selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    /// One constant color
    FixedColor,
    /// A random flat color per episode
    Color,
    /// Rectified Gaussian noise every frame
    Noise,
    /// A random still image per episode
    Images,
    /// A random video per episode, looping
    Videos,
}

/// Everything needed to build any background source
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub shape: Shape,
    pub files: Vec<PathBuf>,
    pub color: [u8; 3],
    pub noise_strength: f32,
}

impl SourceConfig {
    pub fn new(kind: SourceKind, shape: Shape) -> Self {
        Self {
            kind,
            shape,
            files: Vec::new(),
            color: [0, 0, 0],
            noise_strength: DEFAULT_NOISE_STRENGTH,
        }
    }
}

/// Create the background source described by `config`
pub fn create_source(config: &SourceConfig, rng: StdRng) -> Result<Box<dyn ImageSource>> {
    tracing::info!("Creating {:?} background source", config.kind);

    let source: Box<dyn ImageSource> = match config.kind {
        SourceKind::FixedColor => Box::new(FixedColorSource::new(config.shape, config.color)),
        SourceKind::Color => Box::new(RandomColorSource::new(config.shape, rng)),
        SourceKind::Noise => Box::new(NoiseSource::with_strength(
            config.shape,
            config.noise_strength,
            rng,
        )),
        SourceKind::Images => Box::new(RandomImageSource::new(
            config.shape,
            config.files.clone(),
            rng,
        )?),
        SourceKind::Videos => Box::new(RandomVideoSource::new(
            config.shape,
            config.files.clone(),
            rng,
        )?),
    };

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackgroundError;
    use rand::SeedableRng;

    #[test]
    fn factory_builds_sources_of_the_configured_shape() {
        for kind in [SourceKind::FixedColor, SourceKind::Color, SourceKind::Noise] {
            let config = SourceConfig::new(kind, Shape::new(6, 7));
            let mut source = create_source(&config, StdRng::seed_from_u64(0)).unwrap();

            assert_eq!(source.shape(), Shape::new(6, 7));
            source.reset().unwrap();
            assert_eq!(source.get_image().unwrap().dim(), (6, 7, 3));
        }
    }

    #[test]
    fn file_backed_sources_need_files() {
        for kind in [SourceKind::Images, SourceKind::Videos] {
            let config = SourceConfig::new(kind, Shape::new(2, 2));
            let err = create_source(&config, StdRng::seed_from_u64(0)).err().unwrap();
            assert!(matches!(
                err.downcast_ref::<BackgroundError>(),
                Some(BackgroundError::EmptyFileList)
            ));
        }
    }
}
