//! Styled text rendering.
//!
//! `StyleRenderer` is the only place escape sequences are produced. Layout
//! (padding, borders, alignment) is done by `Style` on top of it, measuring
//! text by its visible width so already-styled spans can be nested.

use bitflags::bitflags;
use crossterm::style::{style, Attribute, Stylize};
use unicode_width::UnicodeWidthChar;

use crate::config::Color;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u8 {
        const BOLD      = 0b0001;
        const DIM       = 0b0010;
        const ITALIC    = 0b0100;
        const UNDERLINE = 0b1000;
    }
}

/// Turns a text span plus colors into styled output.
///
/// Implementations must be pure: the same arguments always give the same
/// string.
pub trait StyleRenderer {
    fn paint(&self, text: &str, fg: Option<Color>, bg: Option<Color>, flags: AttrFlags) -> String;
}

/// Renders with ANSI SGR sequences (24-bit color)
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiRenderer;

impl StyleRenderer for AnsiRenderer {
    fn paint(&self, text: &str, fg: Option<Color>, bg: Option<Color>, flags: AttrFlags) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut content = style(text);
        if let Some(fg) = fg {
            content = content.with(fg.to_crossterm());
        }
        if let Some(bg) = bg {
            content = content.on(bg.to_crossterm());
        }
        for (flag, attr) in [
            (AttrFlags::BOLD, Attribute::Bold),
            (AttrFlags::DIM, Attribute::Dim),
            (AttrFlags::ITALIC, Attribute::Italic),
            (AttrFlags::UNDERLINE, Attribute::Underlined),
        ] {
            if flags.contains(flag) {
                content = content.attribute(attr);
            }
        }
        content.to_string()
    }
}

/// Drops all styling, leaving only the layout
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

#[cfg(test)]
impl StyleRenderer for PlainRenderer {
    fn paint(&self, text: &str, _fg: Option<Color>, _bg: Option<Color>, _flags: AttrFlags) -> String {
        text.to_string()
    }
}

/// Box drawing characters for a border
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    pub top_left: char,
    pub top: char,
    pub top_right: char,
    pub left: char,
    pub right: char,
    pub bottom_left: char,
    pub bottom: char,
    pub bottom_right: char,
}

impl Border {
    pub const ROUNDED: Border = Border {
        top_left: '╭',
        top: '─',
        top_right: '╮',
        left: '│',
        right: '│',
        bottom_left: '╰',
        bottom: '─',
        bottom_right: '╯',
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Start,
    Center,
}

impl Align {
    /// Split `slack` cells into (before, after)
    fn split(self, slack: usize) -> (usize, usize) {
        match self {
            Align::Start => (0, slack),
            Align::Center => (slack / 2, slack - slack / 2),
        }
    }
}

/// Text style with block layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    fg: Option<Color>,
    bg: Option<Color>,
    flags: AttrFlags,
    border: Option<Border>,
    border_fg: Option<Color>,
    /// (vertical, horizontal)
    padding: (u16, u16),
    width: Option<u16>,
    height: Option<u16>,
    align: Align,
    valign: Align,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.flags |= AttrFlags::BOLD;
        self
    }

    pub fn border(mut self, border: Border, color: Color) -> Self {
        self.border = Some(border);
        self.border_fg = Some(color);
        self
    }

    pub fn padding(mut self, vertical: u16, horizontal: u16) -> Self {
        self.padding = (vertical, horizontal);
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u16) -> Self {
        self.height = Some(height);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn valign(mut self, valign: Align) -> Self {
        self.valign = valign;
        self
    }

    fn is_plain(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.flags.is_empty()
    }

    /// Lay out and style `text`. Lines are separated by `\n`.
    pub fn render<R: StyleRenderer + ?Sized>(&self, renderer: &R, text: &str) -> String {
        let source: Vec<&str> = text.split('\n').collect();
        let inner = source.iter().map(|l| visible_width(l)).max().unwrap_or(0);
        let (pad_v, pad_h) = (usize::from(self.padding.0), usize::from(self.padding.1));
        let padded_width = inner + 2 * pad_h;

        let mut lines = Vec::with_capacity(source.len() + 2 * pad_v);
        lines.extend(std::iter::repeat(" ".repeat(padded_width)).take(pad_v));
        for line in source {
            let (before, after) = self.align.split(inner - visible_width(line));
            lines.push(format!(
                "{}{}{}",
                " ".repeat(before + pad_h),
                line,
                " ".repeat(after + pad_h)
            ));
        }
        lines.extend(std::iter::repeat(" ".repeat(padded_width)).take(pad_v));

        if !self.is_plain() {
            for line in &mut lines {
                *line = renderer.paint(line, self.fg, self.bg, self.flags);
            }
        }

        let mut block_width = padded_width;
        if let Some(border) = self.border {
            let edge = |c: char| renderer.paint(&c.to_string(), self.border_fg, None, AttrFlags::empty());
            let rule = |c: char| {
                let run: String = std::iter::repeat(c).take(padded_width).collect();
                renderer.paint(&run, self.border_fg, None, AttrFlags::empty())
            };

            let mut framed = Vec::with_capacity(lines.len() + 2);
            framed.push(format!(
                "{}{}{}",
                edge(border.top_left),
                rule(border.top),
                edge(border.top_right)
            ));
            for line in lines {
                framed.push(format!("{}{}{}", edge(border.left), line, edge(border.right)));
            }
            framed.push(format!(
                "{}{}{}",
                edge(border.bottom_left),
                rule(border.bottom),
                edge(border.bottom_right)
            ));
            lines = framed;
            block_width += 2;
        }

        // Place the block inside a fixed-size box. Oversized blocks are left
        // as they are.
        let box_width = self.width.map_or(block_width, usize::from).max(block_width);
        if box_width > block_width {
            let (before, after) = self.align.split(box_width - block_width);
            for line in &mut lines {
                *line = format!("{}{}{}", " ".repeat(before), line, " ".repeat(after));
            }
        }
        if let Some(height) = self.height.map(usize::from) {
            if height > lines.len() {
                let (above, below) = self.valign.split(height - lines.len());
                let blank = " ".repeat(box_width);
                let mut boxed = Vec::with_capacity(height);
                boxed.extend(std::iter::repeat(blank.clone()).take(above));
                boxed.append(&mut lines);
                boxed.extend(std::iter::repeat(blank).take(below));
                lines = boxed;
            }
        }

        lines.join("\n")
    }
}

/// Display width of `s`, ignoring escape sequences
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.next() {
                // CSI: parameters then a final byte in @..~
                Some('[') => {
                    for c in chars.by_ref() {
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
                Some(_) | None => {}
            }
            continue;
        }
        width += c.width().unwrap_or(0);
    }
    width
}
