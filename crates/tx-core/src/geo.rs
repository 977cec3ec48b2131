//! Plane geometry and the lon/lat → plane projection.
//!
//! The simulation runs on a flat rectangle measured in abstract distance
//! units (the default projection maps Manhattan's latitude span onto 10
//! units).  All distances are Euclidean.

use std::ops::{Add, Mul, Sub};

// ── Point ─────────────────────────────────────────────────────────────────────

/// A location on the simulation plane.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Displacement from `self` to `other`.
    #[inline]
    pub fn to(self, other: Point) -> Vec2 {
        Vec2::new(other.x - self.x, other.y - self.y)
    }
}

impl Add<Vec2> for Point {
    type Output = Point;
    #[inline]
    fn add(self, v: Vec2) -> Point {
        Point::new(self.x + v.x, self.y + v.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

// ── Vec2 ──────────────────────────────────────────────────────────────────────

/// A displacement on the plane.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// `self + factor * other`.
    #[inline]
    pub fn add_scaled(self, factor: f64, other: Vec2) -> Vec2 {
        Vec2::new(self.x + factor * other.x, self.y + factor * other.y)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

// ── Bounds ────────────────────────────────────────────────────────────────────

/// Axis-aligned operating area.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    #[inline]
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Bounds anchored at the origin.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(Point::new(0.0, 0.0), Point::new(width, height))
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// `true` if both extents are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width().is_finite() && self.height().is_finite()
            && self.width() > 0.0 && self.height() > 0.0
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Project `p` onto the rectangle.
    #[inline]
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
        )
    }
}

// ── GeoPoint / Projection ─────────────────────────────────────────────────────

/// A WGS-84 coordinate as it appears in the historical trip records.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Maps a lon/lat bounding box onto the simulation plane.
///
/// The latitude span becomes `scale` units; longitude uses the same factor so
/// the plane keeps the box's aspect ratio.  `y` grows southward: the northern
/// edge of the box is `y = 0`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Projection {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
    pub scale:      f64,
}

impl Projection {
    /// Manhattan bounding box used by the NYC yellow-cab data set.
    pub const MANHATTAN: Projection = Projection {
        south_west: GeoPoint { lat: 40.701_137_542_7, lon: -74.019_309_997_6 },
        north_east: GeoPoint { lat: 40.877_452_850_3, lon: -73.910_453_796_4 },
        scale:      10.0,
    };

    #[inline]
    fn factor(&self) -> f64 {
        self.scale / (self.north_east.lat - self.south_west.lat)
    }

    /// Plane rectangle covered by the projection.
    pub fn bounds(&self) -> Bounds {
        let f = self.factor();
        Bounds::from_size(
            (self.north_east.lon - self.south_west.lon) * f,
            (self.north_east.lat - self.south_west.lat) * f,
        )
    }

    /// Project `g`; returns `None` if it lies outside the bounding box.
    pub fn project(&self, g: GeoPoint) -> Option<Point> {
        let inside = g.lat >= self.south_west.lat && g.lat <= self.north_east.lat
            && g.lon >= self.south_west.lon && g.lon <= self.north_east.lon;
        if !inside {
            return None;
        }
        let f = self.factor();
        Some(Point::new(
            (g.lon - self.south_west.lon) * f,
            (self.north_east.lat - g.lat) * f,
        ))
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::MANHATTAN
    }
}
