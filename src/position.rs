use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Integer grid coordinate / direction vector.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    #[inline]
    pub fn sq_length(self) -> i32 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn length(self) -> f64 {
        ((self.x as f64).powi(2) + (self.y as f64).powi(2)).sqrt()
    }

    #[inline]
    pub fn sq_distance_to(self, other: Self) -> i32 {
        (self - other).sq_length()
    }

    #[inline]
    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Rotated 90 degrees clockwise (grid y grows downward).
    #[inline]
    pub fn rotated_cw(self) -> Self {
        Position {
            x: self.y,
            y: -self.x,
        }
    }

    /// Rotated 90 degrees counter-clockwise.
    #[inline]
    pub fn rotated_ccw(self) -> Self {
        Position {
            x: -self.y,
            y: self.x,
        }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x.cmp(&other.x).then(self.y.cmp(&other.y))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Position {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Position {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Position {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Position {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl SubAssign for Position {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl Mul<i32> for Position {
    type Output = Self;
    fn mul(self, scalar: i32) -> Self {
        Position {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Neg for Position {
    type Output = Self;
    fn neg(self) -> Self {
        Position {
            x: -self.x,
            y: -self.y,
        }
    }
}
