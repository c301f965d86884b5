use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};
use crate::point::{Point, PointSet};

/// Axis-aligned extent of a region.
///
/// The edges are stored directly rather than derived from an origin and a
/// size, so the four quadrants of a split share the exact same midlines and
/// every parent point lands in exactly one child.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Bounds {
    /// Half-open containment: lower edges inclusive, upper edges exclusive.
    #[inline]
    pub fn contains(&self, point: &Point) -> bool {
        self.x_min <= point.x() && point.x() < self.x_max && self.y_min <= point.y() && point.y() < self.y_max
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// The minimum-x, maximum-y corner.
    #[inline]
    pub fn origin(&self) -> Point {
        Point::new(self.x_min, self.y_max)
    }

    /// Whether both midlines fall strictly inside the bounds, so a split
    /// yields four non-empty quadrants.
    pub fn is_divisible(&self) -> bool {
        let x_mid = (self.x_min + self.x_max) / 2.0;
        let y_mid = (self.y_min + self.y_max) / 2.0;
        self.x_min < x_mid && x_mid < self.x_max && self.y_min < y_mid && y_mid < self.y_max
    }

    /// Splits into quadrants in UR, UL, LR, LL order.
    fn quadrants(&self) -> [Bounds; 4] {
        let x_mid = (self.x_min + self.x_max) / 2.0;
        let y_mid = (self.y_min + self.y_max) / 2.0;
        [
            Bounds { x_min: x_mid, y_min: y_mid, x_max: self.x_max, y_max: self.y_max },
            Bounds { x_min: self.x_min, y_min: y_mid, x_max: x_mid, y_max: self.y_max },
            Bounds { x_min: x_mid, y_min: self.y_min, x_max: self.x_max, y_max: y_mid },
            Bounds { x_min: self.x_min, y_min: self.y_min, x_max: x_mid, y_max: y_mid },
        ]
    }
}

// Constructed bounds are always finite, so float equality is a valid Eq.
impl Eq for Bounds {}

impl Hash for Bounds {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // -0.0 == 0.0, so both must hash alike.
        for edge in [self.x_min, self.y_min, self.x_max, self.y_max] {
            (edge + 0.0).to_bits().hash(state);
        }
    }
}

/// Classification of a region by how many points it holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Empty,
    Leaf,
    Branch,
}

/// Quadrant labels, in the order `Region::subdivide` returns them.
pub const QUADRANTS: [&str; 4] = ["UR", "UL", "LR", "LL"];

/// A rectangle carrying the subset of points it geometrically contains.
#[derive(Clone, Debug)]
pub struct Region {
    bounds: Bounds,
    name: String,
    depth: u32,
    points: PointSet,
}

impl Region {
    /// Creates an empty region whose upper-left corner is `(x, y)`.
    ///
    /// The region spans `[x, x + width)` horizontally and `[y - height, y)`
    /// vertically.
    pub fn new(x: f64, y: f64, width: f64, height: f64, name: impl Into<String>) -> Result<Self> {
        let invalid = Error::InvalidGeometry { width, height };
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
            return Err(invalid);
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(invalid);
        }
        let bounds = Bounds {
            x_min: x + 0.0,
            y_min: y - height + 0.0,
            x_max: x + width + 0.0,
            y_max: y + 0.0,
        };
        // A size too small to register against the corner's magnitude.
        if !(bounds.x_min < bounds.x_max && bounds.y_min < bounds.y_max) {
            return Err(invalid);
        }
        Ok(Self {
            bounds,
            name: name.into(),
            depth: 0,
            points: PointSet::new(),
        })
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.bounds.contains(point)
    }

    /// Inserts every point this region contains and drops the rest.
    ///
    /// Returns how many points were newly inserted.
    pub fn add_points<I>(&mut self, points: I) -> usize
        where
            I: IntoIterator<Item = Point>,
    {
        let before = self.points.len();
        for point in points {
            if self.contains(&point) {
                self.points.insert(point);
            }
        }
        self.points.len() - before
    }

    /// Splits into four half-size children (UR, UL, LR, LL), each seeded
    /// with the parent's points that fall inside it. The parent is left
    /// untouched.
    pub fn subdivide(&self) -> [Region; 4] {
        let quads = self.bounds.quadrants();
        std::array::from_fn(|i| {
            let mut child = Region {
                bounds: quads[i],
                name: format!("{}_{}", self.name, QUADRANTS[i]),
                depth: self.depth + 1,
                points: PointSet::new(),
            };
            child.add_points(self.points.iter().copied());
            child
        })
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn origin(&self) -> Point {
        self.bounds.origin()
    }

    pub fn width(&self) -> f64 {
        self.bounds.width()
    }

    pub fn height(&self) -> f64 {
        self.bounds.height()
    }

    pub fn area(&self) -> f64 {
        self.bounds.area()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn kind(&self) -> NodeKind {
        match self.points.len() {
            0 => NodeKind::Empty,
            1 => NodeKind::Leaf,
            _ => NodeKind::Branch,
        }
    }
}

/// Regions are identified by geometry alone.
impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.bounds == other.bounds
    }
}

impl Eq for Region {}

impl Hash for Region {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bounds.hash(state);
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} origin {} size {}x{} ({} points)",
            self.name,
            self.origin(),
            self.width(),
            self.height(),
            self.points.len()
        )
    }
}
