use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use rand::Rng;

/// Deduplicated set of points, iterated in coordinate order.
pub type PointSet = BTreeSet<Point>;

/// An immutable 2-D point compared by value.
#[derive(Copy, Clone, Debug)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        // Adding positive zero folds -0.0 into 0.0.
        Self {
            x: x + 0.0,
            y: y + 0.0,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Draws `count` points uniformly from `[x_min, x_max) x [y_min, y_max)`.
    ///
    /// Coincident draws collapse, so the returned set may hold fewer than
    /// `count` points.
    ///
    /// # Panics
    ///
    /// Panics if `count > 0` and either range is empty (`x_min >= x_max` or
    /// `y_min >= y_max`) or not finite.
    pub fn sample<R>(rng: &mut R, x_min: f64, x_max: f64, y_min: f64, y_max: f64, count: usize) -> PointSet
        where
            R: Rng,
    {
        (0..count)
            .map(|_| Point::new(rng.random_range(x_min..x_max), rng.random_range(y_min..y_max)))
            .collect()
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Point {}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
