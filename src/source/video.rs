use super::decode::{AutoDecoder, VideoDecoder};
use super::types::ImageSource;
use crate::error::BackgroundError;
use crate::frame::{from_rgb_image, resize_rgb, Frame, Shape};
use anyhow::Result;
use image::RgbImage;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Video background that plays one random file frame by frame
///
/// When the current video runs out, the source resets itself and keeps
/// playing from a freshly picked file, so it never needs outside help to loop.
pub struct RandomVideoSource<R: Rng = StdRng, D: VideoDecoder = AutoDecoder> {
    shape: Shape,
    files: Vec<PathBuf>,
    rng: R,
    decoder: D,

    // Decoded frames of the current file and the index of the next one to serve
    frames: Vec<RgbImage>,
    cursor: usize,
    current: PathBuf,
}

impl<R: Rng> RandomVideoSource<R, AutoDecoder> {
    pub fn new(shape: Shape, files: Vec<PathBuf>, rng: R) -> Result<Self> {
        Self::with_decoder(shape, files, rng, AutoDecoder::default())
    }
}

impl<R: Rng, D: VideoDecoder> RandomVideoSource<R, D> {
    /// Create the source with a specific decoder and decode its first video
    pub fn with_decoder(shape: Shape, files: Vec<PathBuf>, rng: R, decoder: D) -> Result<Self> {
        if files.is_empty() {
            return Err(BackgroundError::EmptyFileList.into());
        }

        tracing::info!("Random video source over {} files at {}", files.len(), shape);

        let mut source = Self {
            shape,
            files,
            rng,
            decoder,
            frames: Vec::new(),
            cursor: 0,
            current: PathBuf::new(),
        };
        source.reset()?;
        Ok(source)
    }

    /// Number of frames in the current video
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Index of the frame the next `get_image` will return
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_path(&self) -> &Path {
        &self.current
    }
}

impl<R: Rng, D: VideoDecoder> ImageSource for RandomVideoSource<R, D> {
    fn get_image(&mut self) -> Result<Frame> {
        if self.cursor >= self.frames.len() {
            tracing::debug!(
                "Video {} exhausted after {} frames, looping",
                self.current.display(),
                self.frames.len()
            );
            self.reset()?;
        }

        let frame = &self.frames[self.cursor];
        self.cursor += 1;

        Ok(from_rgb_image(&resize_rgb(frame, self.shape)))
    }

    fn reset(&mut self) -> Result<()> {
        let path = self
            .files
            .choose(&mut self.rng)
            .ok_or(BackgroundError::EmptyFileList)?
            .clone();

        tracing::debug!("Decoding background video {}", path.display());
        let frames = self.decoder.decode(&path)?;
        if frames.is_empty() {
            return Err(BackgroundError::EmptyVideo(path).into());
        }

        tracing::debug!("Decoded {} frames", frames.len());
        self.frames = frames;
        self.cursor = 0;
        self.current = path;
        Ok(())
    }

    fn shape(&self) -> Shape {
        self.shape
    }
}
