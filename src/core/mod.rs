//! Core session state.
//!
//! This module contains the transport-independent view logic:
//!
//! - **shape**: bouncing shapes and their edge physics
//! - **page**: content pages and the page content table
//! - **model**: per-session state machine driven by commands and ticks
//!
//! # Architecture
//!
//! ```text
//! Model
//! ├── Shape × 4 (position, velocity, glyph form, color)
//! ├── current page (None = home)
//! └── AnimationSettings (tick interval, timeout, margins)
//! ```

pub mod model;
pub mod page;
pub mod shape;

pub use model::{AnimationSettings, Cmd, Command, Model};
pub use page::{Page, PageTable};
