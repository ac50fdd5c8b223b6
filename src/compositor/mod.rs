//! Span compositing for the review display.
//!
//! - `offsets`: line/column <-> absolute offset over the visible window
//! - `palette`: named colours
//! - `layers`: pattern, mark and target layering
//! - `ansi`: terminal rendering

pub mod ansi;
pub mod layers;
pub mod offsets;
pub mod palette;

pub use ansi::to_ansi;
pub use layers::{
    compose, Composition, DisplayLine, Fill, Layers, Paint, Reveal, Segment, SpanCompositor, VisibleWindow,
};
pub use offsets::{to_absolute_offset, to_line_col, LineCol, LineMap, OffsetError};
pub use palette::{Rgb, Swatch, DEFAULT_MARK_COLOR, PALETTE};
