//! Text-level style values.

mod pos;

pub use pos::VerticalPosition;
