use crate::state::Xor128;

/// Dye colors a new brush stroke can pick from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Palette {
    Green,
    Magenta,
    Grey,
}

impl Palette {
    /// Choose a palette entry from a uniform sample in [0, 1]:
    /// green 30%, magenta 30%, grey 40%.
    pub fn pick(u: f64) -> Self {
        if u < 0.3 {
            Palette::Green
        } else if u < 0.6 {
            Palette::Magenta
        } else {
            Palette::Grey
        }
    }

    pub fn color(self) -> [f64; 3] {
        match self {
            Palette::Green => [0.25, 1.0, 0.25],
            Palette::Magenta => [1.0, 0.1, 1.0],
            Palette::Grey => [0.5, 0.5, 0.5],
        }
    }
}

/// Pointer motion between two polls while the button is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub color: [f64; 3],
}

/// Turns polled button/pointer state into brush strokes.
///
/// Each press picks a fresh palette color; every later poll with the button
/// held and the pointer moved yields one stroke segment.
pub struct GestureTracker {
    rng: Xor128,
    last: Option<(f64, f64)>,
    color: [f64; 3],
}

impl GestureTracker {
    pub fn new(seed: u32) -> Self {
        Self { rng: Xor128::new(seed), last: None, color: Palette::Grey.color() }
    }

    pub fn press(&mut self, pos: (f64, f64)) {
        self.color = Palette::pick(self.rng.next_unit()).color();
        self.last = Some(pos);
    }

    /// Pointer moved to `pos`. Returns the stroke since the previous position
    /// if the button is held.
    pub fn drag(&mut self, pos: (f64, f64)) -> Option<Stroke> {
        let from = self.last?;
        if from == pos {
            return None;
        }
        self.last = Some(pos);
        Some(Stroke { from, to: pos, color: self.color })
    }

    pub fn release(&mut self) {
        self.last = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.last.is_some()
    }

    /// Color of the current (or most recent) stroke.
    pub fn color(&self) -> [f64; 3] {
        self.color
    }

    /// Feed one poll of the left button and pointer position.
    pub fn update(&mut self, down: bool, pos: Option<(f64, f64)>) -> Option<Stroke> {
        match (down, pos) {
            (true, Some(p)) if self.is_dragging() => self.drag(p),
            (true, Some(p)) => {
                self.press(p);
                None
            }
            // Pointer left the window: keep the gesture, wait for it to return
            (true, None) => None,
            (false, _) => {
                self.release();
                None
            }
        }
    }
}

/// Rising-edge detector for polled buttons.
#[derive(Debug, Default)]
pub struct Toggle {
    held: bool,
    pub on: bool,
}

impl Toggle {
    /// Flip `on` when the button goes from up to down. Returns true on a flip.
    pub fn update(&mut self, down: bool) -> bool {
        let flipped = down && !self.held;
        self.held = down;
        if flipped {
            self.on = !self.on;
        }
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PALETTE: [[f64; 3]; 3] = [[0.25, 1.0, 0.25], [1.0, 0.1, 1.0], [0.5, 0.5, 0.5]];

    #[test]
    fn test_palette_pick_thresholds() {
        assert_eq!(Palette::pick(0.0), Palette::Green);
        assert_eq!(Palette::pick(0.29), Palette::Green);
        assert_eq!(Palette::pick(0.3), Palette::Magenta);
        assert_eq!(Palette::pick(0.59), Palette::Magenta);
        assert_eq!(Palette::pick(0.6), Palette::Grey);
        assert_eq!(Palette::pick(1.0), Palette::Grey);
    }

    #[test]
    fn test_palette_distribution() {
        let mut rng = Xor128::new(7);
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            match Palette::pick(rng.next_unit()) {
                Palette::Green => counts[0] += 1,
                Palette::Magenta => counts[1] += 1,
                Palette::Grey => counts[2] += 1,
            }
        }
        assert!((2700..3300).contains(&counts[0]), "green={}", counts[0]);
        assert!((2700..3300).contains(&counts[1]), "magenta={}", counts[1]);
        assert!((3700..4300).contains(&counts[2]), "grey={}", counts[2]);
    }

    #[test]
    fn test_drag_without_press_yields_nothing() {
        let mut t = GestureTracker::new(1);
        assert_eq!(t.drag((3.0, 4.0)), None);
        assert!(!t.is_dragging());
    }

    #[test]
    fn test_press_drag_release() {
        let mut t = GestureTracker::new(1);
        t.press((1.0, 1.0));
        let color = t.color();
        assert!(PALETTE.contains(&color));

        let s = t.drag((3.0, 1.0)).unwrap();
        assert_eq!(s, Stroke { from: (1.0, 1.0), to: (3.0, 1.0), color });
        let s = t.drag((3.0, 5.0)).unwrap();
        assert_eq!(s.from, (3.0, 1.0), "Segments chain from the last position");
        assert_eq!(s.to, (3.0, 5.0));

        t.release();
        assert_eq!(t.drag((9.0, 9.0)), None);
    }

    #[test]
    fn test_stationary_pointer_yields_nothing() {
        let mut t = GestureTracker::new(1);
        t.press((2.0, 2.0));
        assert_eq!(t.drag((2.0, 2.0)), None);
        assert!(t.is_dragging());
    }

    #[test]
    fn test_color_fixed_for_whole_gesture() {
        let mut t = GestureTracker::new(99);
        t.press((0.0, 0.0));
        let first = t.drag((1.0, 0.0)).unwrap().color;
        for x in 2..20 {
            assert_eq!(t.drag((x as f64, 0.0)).unwrap().color, first);
        }
    }

    #[test]
    fn test_update_polling() {
        let mut t = GestureTracker::new(5);
        assert_eq!(t.update(false, Some((1.0, 1.0))), None);
        assert_eq!(t.update(true, Some((1.0, 1.0))), None, "Press alone injects nothing");
        assert_eq!(t.update(true, None), None);
        assert!(t.is_dragging(), "Leaving the window keeps the gesture");
        let s = t.update(true, Some((2.0, 1.0))).unwrap();
        assert_eq!((s.from, s.to), ((1.0, 1.0), (2.0, 1.0)));
        assert_eq!(t.update(false, Some((5.0, 5.0))), None);
        assert!(!t.is_dragging());
    }

    #[test]
    fn test_toggle_rising_edge() {
        let mut freeze = Toggle::default();
        assert!(!freeze.update(false));
        assert!(freeze.update(true));
        assert!(freeze.on);
        assert!(!freeze.update(true), "Holding does not flip again");
        assert!(!freeze.update(false));
        assert!(freeze.update(true));
        assert!(!freeze.on);
    }
}
