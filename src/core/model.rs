//! Per-session view state and the animation state machine.
//!
//! A `Model` is driven by `Command`s: key presses mapped by the transport,
//! terminal resizes, and ticks scheduled by the session loop. Every update
//! returns a `Cmd` telling the loop what to do next.

use std::time::{Duration, Instant};

use rand::Rng;

use super::page::{Page, PageTable};
use super::shape::{Bounds, Margins, Shape};
use crate::config::AnimationConfig;

/// Size assumed until the client reports one
pub const DEFAULT_SIZE: (u16, u16) = (80, 24);

/// Timing and layout knobs for the home screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationSettings {
    pub tick_interval: Duration,
    /// Sessions older than this are closed on the next tick
    pub session_timeout: Duration,
    pub margins: Margins,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self::from(&AnimationConfig::default())
    }
}

impl From<&AnimationConfig> for AnimationSettings {
    fn from(config: &AnimationConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_ms.max(1)),
            session_timeout: Duration::from_secs(config.session_timeout_secs),
            margins: Margins {
                top: config.top_margin,
                bottom: config.bottom_margin,
            },
        }
    }
}

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    SelectPage(Page),
    Back,
    Tick(Instant),
    Resize { width: u16, height: u16 },
}

/// What the session loop should do after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd {
    /// Nothing to schedule
    None,
    /// Deliver a `Command::Tick` after this delay
    Tick(Duration),
    /// End the session
    Quit,
}

/// Session view state
#[derive(Debug, Clone)]
pub struct Model {
    /// Terminal dimensions
    pub width: u16,
    pub height: u16,
    pub shapes: Vec<Shape>,
    /// Open page, `None` on the home screen
    pub current: Option<Page>,
    started: Instant,
    settings: AnimationSettings,
}

impl Model {
    /// Create a model with one shape per page
    pub fn new<R: Rng + ?Sized>(
        settings: AnimationSettings,
        pages: &PageTable,
        rng: &mut R,
        started: Instant,
    ) -> Self {
        let shapes = Page::ALL
            .iter()
            .enumerate()
            .map(|(i, &page)| Shape::spawn(i, page, pages.color(page), rng))
            .collect();

        Self {
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
            shapes,
            current: None,
            started,
            settings,
        }
    }

    /// First command of the session: schedule the first tick
    pub fn init(&self) -> Cmd {
        Cmd::Tick(self.settings.tick_interval)
    }

    pub fn update(&mut self, command: Command) -> Cmd {
        match command {
            Command::Quit => Cmd::Quit,
            Command::SelectPage(page) => {
                self.current = Some(page);
                Cmd::None
            }
            Command::Back => {
                self.current = None;
                Cmd::None
            }
            Command::Resize { width, height } => {
                // Shapes are pulled back inside on the next tick
                self.width = width;
                self.height = height;
                Cmd::None
            }
            Command::Tick(now) => self.tick(now),
        }
    }

    fn tick(&mut self, now: Instant) -> Cmd {
        if now.saturating_duration_since(self.started) > self.settings.session_timeout {
            return Cmd::Quit;
        }

        let bounds = self.bounds();
        for shape in &mut self.shapes {
            shape.step(&bounds);
        }
        Cmd::Tick(self.settings.tick_interval)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height, self.settings.margins)
    }
}
