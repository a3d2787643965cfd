use crate::error::BackgroundError;
use anyhow::{anyhow, bail, Context, Result};
use image::{AnimationDecoder, DynamicImage, RgbImage};
use serde::Deserialize;
use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Trait for turning a video file into its full sequence of RGB frames
pub trait VideoDecoder {
    /// Decode every frame of the file at `path`
    ///
    /// Any file handle or child process is released before returning,
    /// on success and on failure alike.
    fn decode(&mut self, path: &Path) -> Result<Vec<RgbImage>>;
}

/// Animated GIF decoding through the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct GifDecoder;

impl VideoDecoder for GifDecoder {
    fn decode(&mut self, path: &Path) -> Result<Vec<RgbImage>> {
        let _span = tracing::debug_span!("decode_gif").entered();

        let file = File::open(path)
            .with_context(|| format!("Failed to open video {}", path.display()))?;
        let decoder = image::codecs::gif::GifDecoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to read GIF header of {}", path.display()))?;
        let frames = decoder
            .into_frames()
            .collect_frames()
            .with_context(|| format!("Failed to decode GIF frames of {}", path.display()))?;

        Ok(frames
            .into_iter()
            .map(|frame| DynamicImage::ImageRgba8(frame.into_buffer()).to_rgb8())
            .collect())
    }
}

/// Decoding through external `ffprobe`/`ffmpeg` processes
///
/// Frames are requested as packed rgb24, so no channel reordering is needed.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegDecoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Width and height of the first video stream
    fn probe(&self, path: &Path) -> Result<(u32, u32)> {
        let out = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-print_format",
                "json",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .with_context(|| format!("Failed to run {}", self.ffprobe.display()))?;
        if !out.status.success() {
            return Err(BackgroundError::Decode {
                path: path.to_path_buf(),
                reason: format!(
                    "ffprobe failed: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            }
            .into());
        }

        parse_probe(&out.stdout)
            .with_context(|| format!("Unusable ffprobe output for {}", path.display()))
    }
}

/// Coded frame size of the first stream in `ffprobe -print_format json` output
pub fn parse_probe(json: &[u8]) -> Result<(u32, u32)> {
    #[derive(Deserialize)]
    struct ProbeStream {
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json).context("Failed to parse ffprobe output")?;
    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| anyhow!("no video stream found"))?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => Ok((width, height)),
        (width, height) => bail!("invalid frame size {:?}x{:?}", width, height),
    }
}

/// Arguments for decoding the first video stream of `path` to packed rgb24
///
/// Rotation metadata is ignored so frames keep the coded size `ffprobe` reports.
fn decode_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-noautorotate", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_owned());
    args.extend(
        ["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"]
            .iter()
            .map(OsString::from),
    );
    args
}

/// Cut a raw rgb24 stream into `width` x `height` frames
pub fn split_frames(bytes: &[u8], width: u32, height: u32) -> Result<Vec<RgbImage>> {
    let frame_len = width as usize * height as usize * 3;
    if frame_len == 0 {
        bail!("frame size {}x{} is empty", width, height);
    }
    if bytes.len() % frame_len != 0 {
        bail!(
            "got {} bytes, expected a multiple of {}",
            bytes.len(),
            frame_len
        );
    }

    bytes
        .chunks_exact(frame_len)
        .map(|chunk| {
            RgbImage::from_raw(width, height, chunk.to_vec())
                .ok_or_else(|| anyhow!("frame buffer too small"))
        })
        .collect()
}

impl VideoDecoder for FfmpegDecoder {
    fn decode(&mut self, path: &Path) -> Result<Vec<RgbImage>> {
        let _span = tracing::debug_span!("decode_ffmpeg").entered();

        let (width, height) = self.probe(path)?;
        tracing::debug!("Decoding {} at {}x{}", path.display(), width, height);

        let out = Command::new(&self.ffmpeg)
            .args(decode_args(path))
            .output()
            .with_context(|| format!("Failed to run {}", self.ffmpeg.display()))?;
        if !out.status.success() {
            return Err(BackgroundError::Decode {
                path: path.to_path_buf(),
                reason: format!(
                    "ffmpeg failed: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            }
            .into());
        }

        split_frames(&out.stdout, width, height).map_err(|err| {
            BackgroundError::Decode {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
            .into()
        })
    }
}

/// Picks a decoder by file extension: GIFs in-process, everything else via ffmpeg
#[derive(Debug, Clone, Default)]
pub struct AutoDecoder {
    gif: GifDecoder,
    ffmpeg: FfmpegDecoder,
}

impl AutoDecoder {
    pub fn new(ffmpeg: FfmpegDecoder) -> Self {
        Self {
            gif: GifDecoder,
            ffmpeg,
        }
    }

    fn is_gif(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"))
    }
}

impl VideoDecoder for AutoDecoder {
    fn decode(&mut self, path: &Path) -> Result<Vec<RgbImage>> {
        if Self::is_gif(path) {
            self.gif.decode(path)
        } else {
            self.ffmpeg.decode(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::RgbaImage;

    fn write_gif(path: &Path, colors: &[[u8; 3]]) {
        let file = File::create(path).unwrap();
        let mut encoder = GifEncoder::new(file);
        let frames = colors.iter().map(|&[r, g, b]| {
            image::Frame::new(RgbaImage::from_pixel(6, 4, image::Rgba([r, g, b, 255])))
        });
        encoder.encode_frames(frames).unwrap();
    }

    #[test]
    fn gif_decodes_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.gif");
        write_gif(&path, &[[255, 0, 0], [0, 255, 0], [0, 0, 255]]);

        let frames = GifDecoder.decode(&path).unwrap();

        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.dimensions() == (6, 4)));
    }

    #[test]
    fn auto_decoder_routes_gifs_in_process() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CLIP.GIF");
        write_gif(&path, &[[1, 2, 3], [4, 5, 6]]);

        let mut decoder = AutoDecoder::new(FfmpegDecoder::new(
            "/nonexistent/ffmpeg",
            "/nonexistent/ffprobe",
        ));
        assert_eq!(decoder.decode(&path).unwrap().len(), 2);
    }

    #[test]
    fn missing_ffmpeg_binaries_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"").unwrap();

        let mut decoder = FfmpegDecoder::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        assert!(decoder.decode(&path).is_err());
    }

    #[test]
    fn probe_reports_coded_frame_size() {
        let json = br#"{"streams":[{"index":0,"codec_type":"video","width":4,"height":2,
            "side_data_list":[{"rotation":-90}]}]}"#;
        assert_eq!(parse_probe(json).unwrap(), (4, 2));
    }

    #[test]
    fn probe_without_streams_is_rejected() {
        assert!(parse_probe(br#"{"streams":[]}"#).is_err());
        assert!(parse_probe(br#"{}"#).is_err());
        assert!(parse_probe(b"not json").is_err());
    }

    #[test]
    fn probe_without_frame_size_is_rejected() {
        assert!(parse_probe(br#"{"streams":[{"width":0,"height":2}]}"#).is_err());
        assert!(parse_probe(br#"{"streams":[{"width":4}]}"#).is_err());
    }

    #[test]
    fn raw_stream_splits_into_whole_frames() {
        // 2x1 frames: red|blue, then green|white
        let bytes = [
            255, 0, 0, 0, 0, 255, //
            0, 255, 0, 255, 255, 255,
        ];
        let frames = split_frames(&bytes, 2, 1).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(frames[0].get_pixel(1, 0).0, [0, 0, 255]);
        assert_eq!(frames[1].get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(frames[1].get_pixel(1, 0).0, [255, 255, 255]);
    }

    #[test]
    fn raw_stream_with_partial_frame_is_rejected() {
        assert!(split_frames(&[0; 7], 2, 1).is_err());
        assert!(split_frames(&[0; 6], 0, 1).is_err());
        assert!(split_frames(&[], 2, 1).unwrap().is_empty());
    }

    #[test]
    fn decode_keeps_coded_orientation_of_the_probed_stream() {
        let args = decode_args(Path::new("clip.mp4"));
        let args: Vec<&str> = args.iter().filter_map(|a| a.to_str()).collect();

        let input = args.iter().position(|&a| a == "-i").unwrap();
        let no_rotate = args.iter().position(|&a| a == "-noautorotate").unwrap();
        assert!(no_rotate < input);
        assert_eq!(args[input + 1], "clip.mp4");
        assert!(args.windows(2).any(|w| w == ["-map", "0:v:0"]));
        assert_eq!(args.last(), Some(&"pipe:1"));
    }

    #[test]
    fn missing_gif_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GifDecoder.decode(&dir.path().join("absent.gif")).is_err());
    }
}
