use super::types::ImageSource;
use crate::error::BackgroundError;
use crate::frame::{from_rgb_image, resize_rgb, Frame, Shape};
use anyhow::{Context, Result};
use image::RgbImage;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Still-image background, a new random file picked at every reset
pub struct RandomImageSource<R: Rng = StdRng> {
    shape: Shape,
    files: Vec<PathBuf>,
    rng: R,
    image: Frame,
    current: PathBuf,
}

impl<R: Rng> RandomImageSource<R> {
    /// Create the source and load its first image
    ///
    /// # Arguments
    /// * `shape` - Size every image is resized to
    /// * `files` - Candidate image files, must not be empty
    /// * `rng` - Random source used to pick files
    pub fn new(shape: Shape, files: Vec<PathBuf>, rng: R) -> Result<Self> {
        if files.is_empty() {
            return Err(BackgroundError::EmptyFileList.into());
        }

        tracing::info!("Random image source over {} files at {}", files.len(), shape);

        let mut source = Self {
            shape,
            files,
            rng,
            image: Frame::zeros((shape.height, shape.width, 3)),
            current: PathBuf::new(),
        };
        source.reset()?;
        Ok(source)
    }

    /// File the current image was decoded from
    pub fn current_path(&self) -> &Path {
        &self.current
    }
}

impl<R: Rng> ImageSource for RandomImageSource<R> {
    fn get_image(&mut self) -> Result<Frame> {
        Ok(self.image.clone())
    }

    fn reset(&mut self) -> Result<()> {
        let path = self
            .files
            .choose(&mut self.rng)
            .ok_or(BackgroundError::EmptyFileList)?
            .clone();

        tracing::debug!("Loading background image {}", path.display());
        let image = load_image(&path)?;
        self.image = from_rgb_image(&resize_rgb(&image, self.shape));
        self.current = path;
        Ok(())
    }

    fn shape(&self) -> Shape {
        self.shape
    }
}

/// Decode an image file into RGB
///
/// The file handle lives only for the duration of the decode.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let _span = tracing::debug_span!("decode_image").entered();

    let decoded = image::open(path)
        .with_context(|| format!("Failed to decode image {}", path.display()))?;

    Ok(decoded.to_rgb8())
}
