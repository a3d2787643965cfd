//! Replace the flat background of simulated observations with natural imagery.
//!
//! A [`matting::BackgroundMatting`] strategy finds the background pixels of each
//! frame, a [`source::ImageSource`] supplies replacement content, and
//! [`env::ReplaceBackgroundEnv`] fuses the two around any [`env::Environment`].

pub mod env;
pub mod error;
pub mod frame;
pub mod matting;
pub mod output;
pub mod play;
pub mod source;

pub use error::BackgroundError;
pub use frame::{Frame, Mask, Shape};
