use super::types::BackgroundMatting;
use crate::error::BackgroundError;
use crate::frame::{Frame, Mask};
use anyhow::Result;
use ndarray::{Axis, Zip};

/// Color-keyed matting
///
/// A pixel is background when all three channels equal the key color exactly.
/// Simple, but effective for games drawn on a flat backdrop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorKeyMatting {
    color: [f32; 3],
}

impl ColorKeyMatting {
    pub fn new(color: [u8; 3]) -> Self {
        Self {
            color: color.map(f32::from),
        }
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }
}

impl BackgroundMatting for ColorKeyMatting {
    fn get_mask(&self, frame: &Frame) -> Result<Mask> {
        let _span = tracing::debug_span!("color_key_mask").entered();

        let channels = frame.len_of(Axis(2));
        if channels != 3 {
            return Err(BackgroundError::ChannelCount(channels).into());
        }

        let mask = Zip::from(frame.lanes(Axis(2))).map_collect(|pixel| {
            pixel
                .iter()
                .zip(self.color.iter())
                .all(|(value, key)| value == key)
        });

        Ok(mask)
    }
}
