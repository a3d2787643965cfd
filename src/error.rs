use crate::frame::Shape;
use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds raised by the compositing pipeline.
///
/// These travel through `anyhow::Error`; callers that care about the kind
/// can recover it with `downcast_ref::<BackgroundError>()`.
#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("candidate file list is empty")]
    EmptyFileList,

    #[error("{what} has shape {actual}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: Shape,
        actual: Shape,
    },

    #[error("frame must have 3 channels, got {0}")]
    ChannelCount(usize),

    #[error("video {} decoded to zero frames", .0.display())]
    EmptyVideo(PathBuf),

    #[error("failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("environment must be reset before stepping")]
    NotReset,

    #[error("no frame has been composited yet")]
    NothingRendered,

    #[error("human rendering requires an attached viewer")]
    NoViewer,
}
