//! Screen composition and input handling.
//!
//! - **style**: styled text blocks (colors, borders, padding, alignment)
//! - **compositor**: turns a `Model` into a full frame
//! - **keymapper**: raw terminal bytes to `Command`s
//!
//! # Rendering
//!
//! The compositor is pure: it builds a plain grid, then paints runs through a
//! `StyleRenderer`. `AnsiRenderer` emits 24-bit SGR sequences for the wire;
//! `PlainRenderer` leaves text untouched, which is what the tests compare.

pub mod compositor;
pub mod keymapper;
pub mod style;

pub use compositor::{Compositor, ViewConfig};
pub use keymapper::KeyMapper;
pub use style::AnsiRenderer;
