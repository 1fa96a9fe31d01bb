use std::ops::{Add, Mul, Sub};

/// A 2D position in normalized screen space, `(0, 0)` top-left and `(1, 1)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };
    pub const UNIT: Point = Point { x: 1.0, y: 1.0 };
    pub const SCREEN_CENTER: Point = Point { x: 0.5, y: 0.5 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Moves from `self` toward `target` by `t` (0 stays, 1 arrives).
    pub fn lerp(self, target: Point, t: f32) -> Point {
        self + (target - self) * t
    }

    pub fn clamp(self, min: f32, max: f32) -> Point {
        Point::new(self.x.clamp(min, max), self.y.clamp(min, max))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(self, other: Point) -> f32 {
        let delta = self - other;
        (delta.x * delta.x + delta.y * delta.y).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, factor: f32) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }
}
