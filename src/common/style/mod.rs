//! Style value types used by formatting snapshots.

pub mod color;
pub mod text;

pub use color::RGBColor;
pub use text::VerticalPosition;
