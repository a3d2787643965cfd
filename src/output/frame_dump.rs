use super::OutputSink;
use anyhow::{bail, Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Records composited frames as PNG sequences, one directory per episode
///
/// Layout: `<root>/episode_0000/frame_000000.png`, ...
pub struct FrameDumper {
    root: PathBuf,
    episode: Option<usize>,
    frame: usize,
    resolution: (u32, u32),
}

impl FrameDumper {
    /// `root` must be an existing directory
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            bail!("Dump directory {} does not exist", root.display());
        }

        tracing::info!("Dumping frames to {}", root.display());

        Ok(Self {
            root: root.to_path_buf(),
            episode: None,
            frame: 0,
            resolution: (0, 0),
        })
    }

    fn episode_dir(&self, episode: usize) -> PathBuf {
        self.root.join(format!("episode_{episode:04}"))
    }
}

impl OutputSink for FrameDumper {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if self.episode.is_none() {
            self.begin_episode()?;
        }
        let dir = self.episode_dir(self.episode.unwrap_or_default());

        let path = dir.join(format!("frame_{:06}.png", self.frame));
        frame
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        self.frame += 1;
        self.resolution = frame.dimensions();
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn begin_episode(&mut self) -> Result<()> {
        let episode = self.episode.map_or(0, |e| e + 1);
        let dir = self.episode_dir(episode);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        tracing::debug!("Recording episode {} to {}", episode, dir.display());
        self.episode = Some(episode);
        self.frame = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_land_in_per_episode_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut dumper = FrameDumper::new(dir.path()).unwrap();
        let frame = RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3]));

        dumper.begin_episode().unwrap();
        dumper.write_frame(&frame).unwrap();
        dumper.write_frame(&frame).unwrap();
        dumper.begin_episode().unwrap();
        dumper.write_frame(&frame).unwrap();

        assert!(dir.path().join("episode_0000/frame_000000.png").is_file());
        assert!(dir.path().join("episode_0000/frame_000001.png").is_file());
        assert!(dir.path().join("episode_0001/frame_000000.png").is_file());
        assert_eq!(dumper.resolution(), (3, 2));

        let saved = image::open(dir.path().join("episode_0001/frame_000000.png"))
            .unwrap()
            .to_rgb8();
        assert_eq!(saved, frame);
    }

    #[test]
    fn first_frame_opens_an_episode_implicitly() {
        let dir = tempfile::tempdir().unwrap();
        let mut dumper = FrameDumper::new(dir.path()).unwrap();

        dumper
            .write_frame(&RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 0])))
            .unwrap();
        assert!(dir.path().join("episode_0000/frame_000000.png").is_file());
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FrameDumper::new(dir.path().join("absent")).is_err());
    }
}
