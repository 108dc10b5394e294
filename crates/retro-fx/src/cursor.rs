//! Custom cursor that trails the pointer.

pub const SMOOTHNESS: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct CursorFollower {
    smoothness: f64,
    target: Point,
    position: Point,
}

impl Default for CursorFollower {
    fn default() -> Self {
        Self::new(SMOOTHNESS)
    }
}

impl CursorFollower {
    pub fn new(smoothness: f64) -> Self {
        Self {
            smoothness: smoothness.clamp(0.0, 1.0),
            target: Point::default(),
            position: Point::default(),
        }
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.target = Point { x, y };
    }

    /// One animation frame: move a fraction of the remaining distance.
    pub fn frame(&mut self) -> Point {
        self.position.x += (self.target.x - self.position.x) * self.smoothness;
        self.position.y += (self.target.y - self.position.y) * self.smoothness;
        self.position
    }

    pub fn position(&self) -> Point {
        self.position
    }
}
