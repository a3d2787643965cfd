use crate::error::BackgroundError;
use anyhow::Result;
use image::{imageops, RgbImage};
use ndarray::{Array2, Array3, Axis, Zip};
use std::fmt;

/// Observation frame: (height, width, 3) in RGB order
///
/// Values are usually 0-255 but are not clamped; noise backgrounds go above.
pub type Frame = Array3<f32>;

/// Replacement mask aligned with a frame: true = take the background pixel
pub type Mask = Array2<bool>;

/// Spatial size of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub height: usize,
    pub width: usize,
}

impl Shape {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn of_frame(frame: &Frame) -> Self {
        let (height, width, _) = frame.dim();
        Self { height, width }
    }

    pub fn of_mask(mask: &Mask) -> Self {
        let (height, width) = mask.dim();
        Self { height, width }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Frame of the given shape with every pixel set to `color`
pub fn filled(shape: Shape, color: [f32; 3]) -> Frame {
    Array3::from_shape_fn((shape.height, shape.width, 3), |(_, _, c)| color[c])
}

/// Fail unless `frame` is a 3-channel frame of `expected` size
pub fn ensure_shape(what: &'static str, frame: &Frame, expected: Shape) -> Result<()> {
    let channels = frame.len_of(Axis(2));
    if channels != 3 {
        return Err(BackgroundError::ChannelCount(channels).into());
    }
    let actual = Shape::of_frame(frame);
    if actual != expected {
        return Err(BackgroundError::ShapeMismatch {
            what,
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

/// Resize an RGB image to `shape` with bilinear filtering
///
/// Images already at the target size are returned as-is.
pub fn resize_rgb(image: &RgbImage, shape: Shape) -> RgbImage {
    let target = (shape.width as u32, shape.height as u32);
    if image.dimensions() == target {
        return image.clone();
    }

    imageops::resize(image, target.0, target.1, imageops::FilterType::Triangle)
}

/// Convert an RGB image into a frame
pub fn from_rgb_image(image: &RgbImage) -> Frame {
    let (width, height) = image.dimensions();
    Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
        image.get_pixel(x as u32, y as u32)[c] as f32
    })
}

/// Convert a frame back into an 8-bit RGB image, clamping to [0, 255]
pub fn to_rgb_image(frame: &Frame) -> Result<RgbImage> {
    let channels = frame.len_of(Axis(2));
    if channels != 3 {
        return Err(BackgroundError::ChannelCount(channels).into());
    }

    let shape = Shape::of_frame(frame);
    Ok(RgbImage::from_fn(
        shape.width as u32,
        shape.height as u32,
        |x, y| {
            let (x, y) = (x as usize, y as usize);
            image::Rgb([
                frame[[y, x, 0]].clamp(0.0, 255.0) as u8,
                frame[[y, x, 1]].clamp(0.0, 255.0) as u8,
                frame[[y, x, 2]].clamp(0.0, 255.0) as u8,
            ])
        },
    ))
}

/// Overwrite the pixels of `frame` selected by `mask` with those of `background`
///
/// All three must share the same (height, width); `background` is only read.
pub fn composite(frame: &mut Frame, mask: &Mask, background: &Frame) -> Result<()> {
    let _span = tracing::debug_span!("composite").entered();

    let shape = Shape::of_frame(frame);
    ensure_shape("observation", frame, shape)?;
    ensure_shape("background", background, shape)?;
    let mask_shape = Shape::of_mask(mask);
    if mask_shape != shape {
        return Err(BackgroundError::ShapeMismatch {
            what: "mask",
            expected: shape,
            actual: mask_shape,
        }
        .into());
    }

    Zip::from(frame.lanes_mut(Axis(2)))
        .and(mask)
        .and(background.lanes(Axis(2)))
        .for_each(|mut pixel, &replace, bg| {
            if replace {
                pixel.assign(&bg);
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn composite_replaces_only_masked_pixels() {
        let shape = Shape::new(2, 3);
        let mut frame = filled(shape, [1.0, 2.0, 3.0]);
        let background = filled(shape, [9.0, 8.0, 7.0]);
        let mut mask = Array2::from_elem((2, 3), false);
        mask[[1, 2]] = true;

        composite(&mut frame, &mask, &background).unwrap();

        for y in 0..2 {
            for x in 0..3 {
                let expected = if (y, x) == (1, 2) {
                    [9.0, 8.0, 7.0]
                } else {
                    [1.0, 2.0, 3.0]
                };
                for c in 0..3 {
                    assert_eq!(frame[[y, x, c]], expected[c]);
                }
            }
        }
        assert_eq!(background, filled(shape, [9.0, 8.0, 7.0]));
    }

    #[test]
    fn composite_rejects_mismatched_background() {
        let mut frame = filled(Shape::new(2, 2), [0.0; 3]);
        let background = filled(Shape::new(3, 2), [0.0; 3]);
        let mask = Array2::from_elem((2, 2), true);

        let err = composite(&mut frame, &mask, &background).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BackgroundError>(),
            Some(BackgroundError::ShapeMismatch { what: "background", .. })
        ));
    }

    #[test]
    fn composite_rejects_mismatched_mask() {
        let mut frame = filled(Shape::new(2, 2), [0.0; 3]);
        let background = filled(Shape::new(2, 2), [0.0; 3]);
        let mask = Array2::from_elem((2, 1), true);

        let err = composite(&mut frame, &mask, &background).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BackgroundError>(),
            Some(BackgroundError::ShapeMismatch { what: "mask", .. })
        ));
    }

    #[test]
    fn rgb_image_conversion_clamps_out_of_range_values() {
        let mut frame = filled(Shape::new(1, 2), [10.0, 20.0, 30.0]);
        frame[[0, 1, 0]] = 400.0;
        frame[[0, 1, 1]] = -5.0;

        let image = to_rgb_image(&frame).unwrap();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(image.get_pixel(1, 0).0, [255, 0, 30]);

        let back = from_rgb_image(&image);
        assert_eq!(Shape::of_frame(&back), Shape::new(1, 2));
        assert_eq!(back[[0, 0, 2]], 30.0);
    }

    #[test]
    fn resize_produces_target_dimensions() {
        let image = RgbImage::from_pixel(8, 4, image::Rgb([5, 6, 7]));
        let resized = resize_rgb(&image, Shape::new(3, 5));
        assert_eq!(resized.dimensions(), (5, 3));
        assert_eq!(resized.get_pixel(2, 1).0, [5, 6, 7]);
    }
}
