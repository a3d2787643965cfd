use super::OutputSink;
use anyhow::{Context, Result};
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Human viewer backed by a v4l2loopback device
///
/// Any V4L2 client (a video player, a browser) pointed at the device shows the
/// composited observations live.
pub struct LoopbackViewer {
    file: File,
    width: u32,
    height: u32,
    open: bool,
}

impl LoopbackViewer {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback viewer at {} ({}x{})",
            path.display(),
            width,
            height
        );

        // v4l2loopback accepts raw frame data written to the device file
        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        Ok(Self {
            file,
            width,
            height,
            open: true,
        })
    }
}

/// Pack an RGB image as YUYV 4:2:2, two pixels per four bytes
///
/// Chroma is averaged over each horizontal pair; an odd last column is paired
/// with itself.
fn pack_yuyv(image: &RgbImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let pairs = width.div_ceil(2) as usize;
    let mut packed = Vec::with_capacity(pairs * height as usize * 4);

    for row in image.rows() {
        let row: Vec<&image::Rgb<u8>> = row.collect();
        for pair in row.chunks(2) {
            let left = luma_chroma(pair[0]);
            let right = pair.get(1).map_or(left, |p| luma_chroma(p));

            packed.extend_from_slice(&[
                left.0,
                ((left.1 as u16 + right.1 as u16) / 2) as u8,
                right.0,
                ((left.2 as u16 + right.2 as u16) / 2) as u8,
            ]);
        }
    }

    packed
}

/// BT.601 full-range Y, U, V in 8.8 fixed point
fn luma_chroma(pixel: &image::Rgb<u8>) -> (u8, u8, u8) {
    let [r, g, b] = pixel.0.map(i32::from);

    let y = (77 * r + 150 * g + 29 * b) >> 8;
    let u = ((-43 * r - 85 * g + 128 * b) >> 8) + 128;
    let v = ((128 * r - 107 * g - 21 * b) >> 8) + 128;

    (
        y.clamp(0, 255) as u8,
        u.clamp(0, 255) as u8,
        v.clamp(0, 255) as u8,
    )
}

impl OutputSink for LoopbackViewer {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        // Observations are tiny; scale up to the device resolution
        let frame = if frame.dimensions() != (self.width, self.height) {
            image::imageops::resize(
                frame,
                self.width,
                self.height,
                image::imageops::FilterType::Nearest,
            )
        } else {
            frame.clone()
        };

        let yuyv_data = pack_yuyv(&frame);

        if let Err(err) = self.file.write_all(&yuyv_data) {
            self.open = false;
            return Err(err).context("Failed to write frame to v4l2loopback device");
        }

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuyv_packs_two_pixels_into_four_bytes() {
        let image = RgbImage::from_pixel(4, 2, image::Rgb([255, 255, 255]));
        let yuyv = pack_yuyv(&image);

        assert_eq!(yuyv.len(), 4 * 2 * 2);
        assert_eq!(&yuyv[..4], &[255, 128, 255, 128]);
    }

    #[test]
    fn odd_width_pairs_last_pixel_with_itself() {
        let mut image = RgbImage::from_pixel(3, 1, image::Rgb([0, 0, 0]));
        image.put_pixel(2, 0, image::Rgb([255, 255, 255]));

        let yuyv = pack_yuyv(&image);
        assert_eq!(yuyv, [0, 128, 0, 128, 255, 128, 255, 128]);
    }

    #[test]
    fn black_is_zero_luma_neutral_chroma() {
        assert_eq!(luma_chroma(&image::Rgb([0, 0, 0])), (0, 128, 128));
        let (_, u, v) = luma_chroma(&image::Rgb([255, 0, 0]));
        assert!(u < 128 && v > 128);
    }

    #[test]
    fn writes_scaled_frames_to_the_device_file() {
        let dir = tempfile::tempdir().unwrap();
        let device = dir.path().join("video10");
        std::fs::write(&device, b"").unwrap();

        let mut viewer = LoopbackViewer::new(&device, 8, 4).unwrap();
        viewer
            .write_frame(&RgbImage::from_pixel(2, 1, image::Rgb([0, 0, 0])))
            .unwrap();

        assert!(viewer.is_open());
        assert_eq!(std::fs::metadata(&device).unwrap().len(), 8 * 4 * 2);
    }
}
