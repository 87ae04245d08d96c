//! Common value types and XML helpers shared by the document model and the
//! replacement engine.

pub mod style;
pub mod xml;

pub use style::{RGBColor, VerticalPosition};
