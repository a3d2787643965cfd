mod color_key;
pub mod types;

pub use color_key::ColorKeyMatting;
pub use types::BackgroundMatting;
