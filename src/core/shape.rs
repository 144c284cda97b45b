//! Bouncing shapes on the home screen.
//!
//! Each shape is a 5×3 block of one glyph drifting across the screen. When it
//! touches an edge of the drawing region it is clamped back inside, the
//! velocity on that axis flips, and the glyph advances to the next form.

use rand::Rng;

use super::page::Page;
use crate::config::Color;

/// Glyphs a shape cycles through, one step per bounce
pub const GLYPHS: [char; 4] = ['#', '@', '*', '+'];

pub const SHAPE_WIDTH: u16 = 5;
pub const SHAPE_HEIGHT: u16 = 3;

/// Vertical space reserved above and below the drawing region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub top: u16,
    pub bottom: u16,
}

impl Default for Margins {
    fn default() -> Self {
        Self { top: 1, bottom: 5 }
    }
}

/// Region a shape's top-left corner may occupy, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(width: u16, height: u16, margins: Margins) -> Self {
        let min_y = f64::from(margins.top);
        let max_y = (f64::from(height) - f64::from(margins.bottom)).max(min_y);
        Self {
            min_x: 0.0,
            max_x: (f64::from(width) - f64::from(SHAPE_WIDTH)).max(0.0),
            min_y,
            max_y,
        }
    }

    #[cfg(test)]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Index into `GLYPHS`
    pub form: usize,
    pub color: Color,
    /// Page this shape stands for
    pub page: Page,
}

impl Shape {
    /// Create the `index`-th shape at a random spot with a random heading
    pub fn spawn<R: Rng + ?Sized>(index: usize, page: Page, color: Color, rng: &mut R) -> Self {
        Self {
            x: f64::from(rng.gen_range(10..70u16)),
            y: f64::from(rng.gen_range(3..18u16)),
            vx: nonzero(f64::from(rng.gen_range(-1..=1i8)) + 0.5, rng),
            vy: nonzero(f64::from(rng.gen_range(-1..=1i8)) + 0.5, rng),
            form: index % GLYPHS.len(),
            color,
            page,
        }
    }

    pub fn glyph(&self) -> char {
        GLYPHS[self.form % GLYPHS.len()]
    }

    /// Cell-space origin of the shape
    pub fn origin(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }

    /// Advance one tick. Returns true if the shape hit an edge.
    pub fn step(&mut self, bounds: &Bounds) -> bool {
        self.x += self.vx;
        self.y += self.vy;

        let mut bounced = false;

        if self.x <= bounds.min_x {
            self.x = bounds.min_x;
            self.vx = -self.vx;
            bounced = true;
        } else if self.x >= bounds.max_x {
            self.x = bounds.max_x;
            self.vx = -self.vx;
            bounced = true;
        }

        if self.y < bounds.min_y {
            self.y = bounds.min_y;
            self.vy = -self.vy;
            bounced = true;
        } else if self.y >= bounds.max_y {
            self.y = bounds.max_y;
            self.vy = -self.vy;
            bounced = true;
        }

        // A corner counts as a single bounce
        if bounced {
            self.form = (self.form + 1) % GLYPHS.len();
        }
        bounced
    }
}

/// Replace an exact zero with a unit speed in a random direction
fn nonzero<R: Rng + ?Sized>(v: f64, rng: &mut R) -> f64 {
    if v == 0.0 {
        if rng.gen_bool(0.5) {
            1.0
        } else {
            -1.0
        }
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const RED: Color = Color::new(0xcc, 0, 0);

    fn shape(x: f64, y: f64, vx: f64, vy: f64) -> Shape {
        Shape {
            x,
            y,
            vx,
            vy,
            form: 0,
            color: RED,
            page: Page::About,
        }
    }

    #[test]
    fn test_spawn_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..64 {
            let s = Shape::spawn(i, Page::About, RED, &mut rng);
            assert!((10.0..70.0).contains(&s.x));
            assert!((3.0..18.0).contains(&s.y));
            assert!(s.vx != 0.0 && s.vy != 0.0);
            assert_eq!(s.form, i % GLYPHS.len());
        }
    }

    #[test]
    fn test_nonzero_remap() {
        let mut rng = StdRng::seed_from_u64(1);
        let v = nonzero(0.0, &mut rng);
        assert!(v == 1.0 || v == -1.0);
        assert_eq!(nonzero(-0.5, &mut rng), -0.5);
    }

    #[test]
    fn test_right_edge_bounce() {
        let bounds = Bounds::new(80, 24, Margins::default());
        let mut s = shape(74.5, 10.0, 1.5, 0.5);
        assert!(s.step(&bounds));
        assert_eq!(s.x, 75.0);
        assert_eq!(s.vx, -1.5);
        assert_eq!(s.vy, 0.5);
        assert_eq!(s.form, 1);
    }

    #[test]
    fn test_left_edge_touch_counts() {
        let bounds = Bounds::new(80, 24, Margins::default());
        let mut s = shape(0.5, 10.0, -0.5, 0.5);
        assert!(s.step(&bounds));
        assert_eq!(s.x, 0.0);
        assert_eq!(s.vx, 0.5);
    }

    #[test]
    fn test_corner_advances_form_once() {
        let bounds = Bounds::new(80, 24, Margins::default());
        let mut s = shape(0.2, 1.2, -0.5, -0.5);
        assert!(s.step(&bounds));
        assert_eq!((s.x, s.y), (0.0, 1.0));
        assert_eq!((s.vx, s.vy), (0.5, 0.5));
        assert_eq!(s.form, 1);
    }

    #[test]
    fn test_free_flight() {
        let bounds = Bounds::new(80, 24, Margins::default());
        let mut s = shape(20.0, 10.0, 1.5, -0.5);
        assert!(!s.step(&bounds));
        assert_eq!((s.x, s.y), (21.5, 9.5));
        assert_eq!(s.form, 0);
    }

    #[test]
    fn test_shrunk_terminal_clamps() {
        // Shape left far outside after a resize
        let bounds = Bounds::new(20, 10, Margins::default());
        let mut s = shape(60.0, 18.0, 0.5, 0.5);
        s.step(&bounds);
        assert!(bounds.contains(s.x, s.y));
    }

    #[test]
    fn test_degenerate_bounds() {
        let bounds = Bounds::new(3, 2, Margins { top: 2, bottom: 3 });
        assert_eq!(bounds.max_x, 0.0);
        assert_eq!(bounds.max_y, bounds.min_y);
    }

    fn velocity() -> impl Strategy<Value = f64> {
        prop_oneof![Just(-1.5), Just(-1.0), Just(-0.5), Just(0.5), Just(1.0), Just(1.5)]
    }

    proptest! {
        /// Position stays in bounds, bounces flip only the axis that hit, and
        /// the form advances once per bouncing tick from wherever it started.
        #[test]
        fn step_stays_in_bounds(
            width in 0u16..200,
            height in 0u16..80,
            top in 0u16..4,
            bottom in 0u16..6,
            x in -10.0f64..220.0,
            y in -10.0f64..90.0,
            vx in velocity(),
            vy in velocity(),
            form in 0usize..4,
            ticks in 1usize..200,
        ) {
            let bounds = Bounds::new(width, height, Margins { top, bottom });
            let mut s = Shape { form, ..shape(x, y, vx, vy) };
            let mut hits = 0;

            for _ in 0..ticks {
                let (pvx, pvy) = (s.vx, s.vy);
                let (px, py) = (s.x + s.vx, s.y + s.vy);
                let hit_x = px <= bounds.min_x || px >= bounds.max_x;
                let hit_y = py < bounds.min_y || py >= bounds.max_y;

                let bounced = s.step(&bounds);
                prop_assert!(bounds.contains(s.x, s.y));
                prop_assert_eq!(bounced, hit_x || hit_y);
                prop_assert_eq!(s.vx, if hit_x { -pvx } else { pvx });
                prop_assert_eq!(s.vy, if hit_y { -pvy } else { pvy });
                if bounced {
                    hits += 1;
                }
            }

            prop_assert_eq!(s.form, (form + hits) % GLYPHS.len());
        }
    }
}
