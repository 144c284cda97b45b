//! View compositor.
//!
//! Turns a `Model` into the text drawn on the remote terminal. The home
//! screen is a character grid (background phrase plus shapes) followed by a
//! footer bar; a content page is a bordered panel centered on screen.
//!
//! Rendering is a pure function of the model: the same state always yields
//! the same bytes.

use crate::config::{Color, Theme};
use crate::core::shape::{SHAPE_HEIGHT, SHAPE_WIDTH};
use crate::core::{Model, Page, PageTable};

use super::style::{Align, AttrFlags, Border, Style, StyleRenderer};

/// Rows below the home grid: a spacer line and the footer bar
pub const FOOTER_LINES: u16 = 2;

const PAGE_FOOTER: &str = "[b] back  [q] quit";

/// Everything the compositor needs besides the model
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub pages: PageTable,
    pub theme: Theme,
    /// Phrase tiled across the home screen background
    pub phrase: String,
}

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    /// Index of the shape drawn here, if any
    pub owner: Option<usize>,
}

/// Home screen character grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
}

impl Grid {
    #[cfg(test)]
    pub fn get(&self, col: u16, row: u16) -> Option<Cell> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells
            .get(usize::from(row) * usize::from(self.width) + usize::from(col))
            .copied()
    }

    pub fn row(&self, row: u16) -> &[Cell] {
        let w = usize::from(self.width);
        let start = usize::from(row) * w;
        &self.cells[start..start + w]
    }
}

/// Build the home screen grid: the phrase tiled diagonally, with each
/// shape's 5×3 block drawn over it. Where shapes overlap, the first shape in
/// the list wins.
pub fn home_grid(model: &Model, phrase: &str) -> Grid {
    let width = model.width;
    let height = model.height.saturating_sub(FOOTER_LINES);
    let mut phrase: Vec<char> = phrase.chars().collect();
    if phrase.is_empty() {
        phrase.push(' ');
    }

    let mut cells = Vec::with_capacity(usize::from(width) * usize::from(height));
    for y in 0..usize::from(height) {
        for x in 0..usize::from(width) {
            cells.push(Cell {
                ch: phrase[(x + y * 3) % phrase.len()],
                owner: None,
            });
        }
    }

    let mut grid = Grid { width, height, cells };
    for (i, shape) in model.shapes.iter().enumerate() {
        let (sx, sy) = shape.origin();
        for dy in 0..i32::from(SHAPE_HEIGHT) {
            for dx in 0..i32::from(SHAPE_WIDTH) {
                let (px, py) = (sx + dx, sy + dy);
                if px < 0 || py < 0 || px >= i32::from(width) || py >= i32::from(height) {
                    continue;
                }
                let idx = py as usize * usize::from(width) + px as usize;
                let cell = &mut grid.cells[idx];
                if cell.owner.is_none() {
                    *cell = Cell {
                        ch: shape.glyph(),
                        owner: Some(i),
                    };
                }
            }
        }
    }
    grid
}

/// Renders models with a given style renderer
pub struct Compositor<'a, R: StyleRenderer + ?Sized> {
    renderer: &'a R,
    view: &'a ViewConfig,
}

impl<'a, R: StyleRenderer + ?Sized> Compositor<'a, R> {
    pub fn new(renderer: &'a R, view: &'a ViewConfig) -> Self {
        Self { renderer, view }
    }

    pub fn view(&self, model: &Model) -> String {
        match model.current {
            Some(page) => self.page(model, page),
            None => self.home(model),
        }
    }

    fn home(&self, model: &Model) -> String {
        let grid = home_grid(model, &self.view.phrase);
        let mut out = String::new();

        for row in 0..grid.height {
            // Paint runs of cells sharing an owner in one go
            let cells = grid.row(row);
            let mut start = 0;
            while start < cells.len() {
                let owner = cells[start].owner;
                let end = cells[start..]
                    .iter()
                    .position(|c| c.owner != owner)
                    .map_or(cells.len(), |n| start + n);
                let run: String = cells[start..end].iter().map(|c| c.ch).collect();
                out.push_str(&self.paint_run(model, &run, owner));
                start = end;
            }
            out.push('\n');
        }

        let theme = &self.view.theme;
        let footer = Style::new()
            .fg(theme.footer_fg)
            .bg(theme.footer_bg)
            .padding(0, 1)
            .render(self.renderer, &home_footer());
        out.push('\n');
        out.push_str(&footer);
        out
    }

    fn paint_run(&self, model: &Model, run: &str, owner: Option<usize>) -> String {
        match owner.and_then(|i| model.shapes.get(i)) {
            Some(shape) => self.renderer.paint(run, Some(shape.color), None, AttrFlags::BOLD),
            None => self
                .renderer
                .paint(run, Some(self.view.theme.background), None, AttrFlags::empty()),
        }
    }

    fn page(&self, model: &Model, page: Page) -> String {
        let content = self.view.pages.get(page);
        let color: Color = content.color;

        let title = Style::new().fg(color).bold().render(self.renderer, &content.title);
        let panel = Style::new()
            .fg(color)
            .border(Border::ROUNDED, color)
            .padding(1, 2)
            .render(self.renderer, &format!("{}\n{}", title, content.body));

        let centered = Style::new()
            .width(model.width)
            .height(model.height.saturating_sub(FOOTER_LINES))
            .align(Align::Center)
            .valign(Align::Center)
            .render(self.renderer, &panel);

        let footer = Style::new().fg(self.view.theme.dim).render(self.renderer, PAGE_FOOTER);
        let footer = Style::new()
            .width(model.width)
            .align(Align::Center)
            .render(self.renderer, &footer);

        format!("{}\n{}", centered, footer)
    }
}

/// Key hints shown under the home screen
fn home_footer() -> String {
    let mut hints: Vec<String> = Page::ALL
        .iter()
        .enumerate()
        .map(|(i, page)| format!("[{}] {}", i + 1, page.label()))
        .collect();
    hints.push("[q] quit".to_string());
    hints.join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnimationSettings, Command};
    use crate::ui::style::{visible_width, AnsiRenderer, PlainRenderer};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Instant;

    fn view_config() -> ViewConfig {
        ViewConfig {
            pages: PageTable::default(),
            theme: Theme::default(),
            phrase: "vedsite ".to_string(),
        }
    }

    fn model() -> Model {
        let mut rng = StdRng::seed_from_u64(42);
        Model::new(AnimationSettings::default(), &PageTable::default(), &mut rng, Instant::now())
    }

    /// Park every shape off to the side so the background is predictable
    fn place(model: &mut Model, spots: &[(f64, f64)]) {
        for (shape, &(x, y)) in model.shapes.iter_mut().zip(spots) {
            shape.x = x;
            shape.y = y;
        }
    }

    #[test]
    fn test_background_tiling() {
        let mut m = model();
        place(&mut m, &[(70.0, 15.0), (70.0, 15.0), (70.0, 15.0), (70.0, 15.0)]);
        let grid = home_grid(&m, "abc");
        assert_eq!((grid.width, grid.height), (80, 22));
        assert_eq!(grid.get(0, 0).unwrap().ch, 'a');
        assert_eq!(grid.get(1, 0).unwrap().ch, 'b');
        assert_eq!(grid.get(0, 1).unwrap().ch, 'a'); // (0 + 3) % 3
        assert_eq!(grid.get(1, 1).unwrap().ch, 'b');
        assert_eq!(grid.get(2, 2).unwrap().ch, 'c'); // (2 + 6) % 3
        assert_eq!(grid.get(0, 0).unwrap().owner, None);
    }

    #[test]
    fn test_shape_block() {
        let mut m = model();
        place(&mut m, &[(10.0, 5.0), (40.0, 5.0), (60.0, 5.0), (20.0, 15.0)]);
        m.shapes[0].form = 1;
        let grid = home_grid(&m, "vedsite ");

        for dy in 0..3 {
            for dx in 0..5 {
                let cell = grid.get(10 + dx, 5 + dy).unwrap();
                assert_eq!(cell, Cell { ch: '@', owner: Some(0) });
            }
        }
        assert_eq!(grid.get(15, 5).unwrap().owner, None);
        assert_eq!(grid.get(10, 8).unwrap().owner, None);
    }

    #[test]
    fn test_overlap_first_shape_wins() {
        let mut m = model();
        place(&mut m, &[(10.0, 5.0), (12.0, 6.0), (60.0, 5.0), (20.0, 15.0)]);
        m.shapes[0].form = 0;
        m.shapes[1].form = 2;
        let grid = home_grid(&m, "vedsite ");

        assert_eq!(grid.get(13, 6).unwrap(), Cell { ch: '#', owner: Some(0) });
        assert_eq!(grid.get(16, 6).unwrap(), Cell { ch: '*', owner: Some(1) });
        assert_eq!(grid.get(13, 8).unwrap(), Cell { ch: '*', owner: Some(1) });
    }

    #[test]
    fn test_shapes_clipped_to_grid() {
        let mut m = model();
        m.update(Command::Resize { width: 12, height: 6 });
        place(&mut m, &[(10.0, 3.0), (0.0, 0.0), (0.0, 0.0), (0.0, 0.0)]);
        let grid = home_grid(&m, "x");
        assert_eq!((grid.width, grid.height), (12, 4));
        assert_eq!(grid.get(11, 3).unwrap().owner, Some(0));
    }

    #[test]
    fn test_tiny_terminal() {
        let mut m = model();
        m.update(Command::Resize { width: 0, height: 1 });
        let grid = home_grid(&m, "");
        assert_eq!(grid.height, 0);
        let view = ViewConfig { phrase: String::new(), ..view_config() };
        let out = Compositor::new(&PlainRenderer, &view).view(&m);
        assert!(out.contains("[q] quit"));
    }

    #[test]
    fn test_home_layout() {
        let m = model();
        let view = view_config();
        let out = Compositor::new(&PlainRenderer, &view).view(&m);
        let lines: Vec<&str> = out.split('\n').collect();

        // Grid rows, a spacer, then the footer bar
        assert_eq!(lines.len(), 24);
        assert!(lines[..22].iter().all(|l| l.chars().count() == 80));
        assert_eq!(lines[22], "");
        assert_eq!(
            lines[23],
            " [1] about  [2] projects  [3] experience  [4] misc  [q] quit "
        );
    }

    #[test]
    fn test_home_colors() {
        let mut m = model();
        place(&mut m, &[(10.0, 5.0), (40.0, 5.0), (60.0, 5.0), (20.0, 15.0)]);
        let view = view_config();
        let out = Compositor::new(&AnsiRenderer, &view).view(&m);
        // about is red and bold, background is dim gray
        assert!(out.contains("\x1b[38;2;204;0;0m"));
        assert!(out.contains("\x1b[38;2;58;58;58m"));
        assert!(out.contains("\x1b[1m"));
    }

    #[test]
    fn test_page_panel() {
        let mut m = model();
        m.update(Command::SelectPage(Page::Projects));
        let view = view_config();
        let out = Compositor::new(&PlainRenderer, &view).view(&m);
        let lines: Vec<&str> = out.split('\n').collect();

        assert_eq!(lines.len(), 23);
        assert!(out.contains("PROJECTS"));
        assert!(out.contains("╭") && out.contains("╯"));
        assert!(lines[..22].iter().all(|l| visible_width(l) == 80));

        let footer = lines[22];
        assert_eq!(footer.trim(), PAGE_FOOTER);
        let pad = (80 - PAGE_FOOTER.len()) / 2;
        assert!(footer.starts_with(&" ".repeat(pad)));

        // Panel is centered: equal margins (within one cell) on the top border
        let top = lines.iter().find(|l| l.contains('╭')).unwrap();
        let left = top.find('╭').unwrap();
        let right = top.chars().rev().take_while(|c| *c == ' ').count();
        assert!(left.abs_diff(right) <= 1);
    }

    #[test]
    fn test_page_colors() {
        let mut m = model();
        m.update(Command::SelectPage(Page::Misc));
        let view = view_config();
        let out = Compositor::new(&AnsiRenderer, &view).view(&m);
        assert!(out.contains("\x1b[38;2;6;148;148m"));
        assert!(out.contains("\x1b[38;2;136;136;136m"));
    }

    #[test]
    fn test_narrow_terminal_not_reflowed() {
        let mut m = model();
        m.update(Command::Resize { width: 20, height: 10 });
        m.update(Command::SelectPage(Page::About));
        let view = view_config();
        let out = Compositor::new(&PlainRenderer, &view).view(&m);
        assert!(out.contains("ABOUT ME"));
        assert!(out.split('\n').any(|l| visible_width(l) > 20));
    }

    #[test]
    fn test_deterministic() {
        let view = view_config();
        let compositor = Compositor::new(&AnsiRenderer, &view);
        let mut m = model();
        assert_eq!(compositor.view(&m), compositor.view(&m));
        m.update(Command::SelectPage(Page::Experience));
        assert_eq!(compositor.view(&m), compositor.view(&m.clone()));
    }
}
