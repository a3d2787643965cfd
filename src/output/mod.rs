mod frame_dump;
mod loopback;

pub use frame_dump::FrameDumper;
pub use loopback::LoopbackViewer;

use anyhow::Result;
use image::RgbImage;

/// Trait for destinations of composited frames (viewers, recorders)
pub trait OutputSink {
    /// Write a frame to the output
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);

    /// Called when a new episode starts
    fn begin_episode(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether the output still accepts frames
    fn is_open(&self) -> bool {
        true
    }
}
