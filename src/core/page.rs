//! Content pages and their built-in text.

use std::collections::HashMap;

use crate::config::{Color, PageOverride};

/// The four content pages, in shape/key order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    About,
    Projects,
    Experience,
    Misc,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::About, Page::Projects, Page::Experience, Page::Misc];

    /// Page selected by a 1-based number key
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1..=4 => Some(Self::ALL[usize::from(n - 1)]),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Page::About => 0,
            Page::Projects => 1,
            Page::Experience => 2,
            Page::Misc => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Page::About => "about",
            Page::Projects => "projects",
            Page::Experience => "experience",
            Page::Misc => "misc",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

/// What a page shows
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub title: String,
    pub color: Color,
    pub body: String,
}

/// Page lookup table, one entry per `Page`
#[derive(Debug, Clone, PartialEq)]
pub struct PageTable {
    entries: [PageContent; 4],
}

impl Default for PageTable {
    fn default() -> Self {
        Self {
            entries: [
                PageContent {
                    title: "ABOUT ME".to_string(),
                    color: Color::new(0xcc, 0x00, 0x00),
                    body: ABOUT.to_string(),
                },
                PageContent {
                    title: "PROJECTS".to_string(),
                    color: Color::new(0x66, 0x33, 0x99),
                    body: PROJECTS.to_string(),
                },
                PageContent {
                    title: "EXPERIENCE".to_string(),
                    color: Color::new(0xd4, 0xa0, 0x17),
                    body: EXPERIENCE.to_string(),
                },
                PageContent {
                    title: "MISC".to_string(),
                    color: Color::new(0x06, 0x94, 0x94),
                    body: MISC.to_string(),
                },
            ],
        }
    }
}

impl PageTable {
    /// Built-in content with overrides from the config file applied.
    /// Unknown labels are logged and skipped.
    pub fn with_overrides(overrides: &HashMap<String, PageOverride>) -> Self {
        let mut table = Self::default();
        for (label, over) in overrides {
            let Some(page) = Page::from_label(label) else {
                tracing::warn!(page = %label, "unknown page in config, ignoring");
                continue;
            };
            let entry = &mut table.entries[page.index()];
            if let Some(title) = &over.title {
                entry.title = title.clone();
            }
            if let Some(color) = over.color {
                entry.color = color;
            }
            if let Some(body) = &over.body {
                entry.body = body.clone();
            }
        }
        table
    }

    pub fn get(&self, page: Page) -> &PageContent {
        &self.entries[page.index()]
    }

    pub fn color(&self, page: Page) -> Color {
        self.get(page).color
    }
}

const ABOUT: &str = "
a few lines about who you are.

► something you do for fun
► something you're part of
► something you care about

set [pages.about] body in
~/.termfolio/config.toml";

const PROJECTS: &str = "
► Project One
  one line on what it does

► Project Two
  one line on what it does

► Project Three
  one line on what it does

set [pages.projects] body in
~/.termfolio/config.toml";

const EXPERIENCE: &str = "
Degree, School

─────────────────────────────────────

► Role | Organization

► Role | Organization

set [pages.experience] body in
~/.termfolio/config.toml";

const MISC: &str = "
anything else:

♫ music
◎ films
► links

set [pages.misc] body in
~/.termfolio/config.toml";
