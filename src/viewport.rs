//! Viewport geometry: bounding boxes and the zoom-based bounds estimate.

use serde::{Deserialize, Serialize};

/// A geographic rectangle in degrees.
///
/// `west > east` describes a box that crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Western longitude.
    pub west: f64,
    /// Southern latitude.
    pub south: f64,
    /// Eastern longitude.
    pub east: f64,
    /// Northern latitude.
    pub north: f64,
}

/// A box normalized for querying: latitudes clamped, longitudes wrapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum QueryBox {
    /// A single range with `west <= east`.
    Single(Bounds),
    /// Crosses the antimeridian: `[west, 180]` and `[-180, east]`.
    Split(Bounds, Bounds),
}

impl Bounds {
    /// The initial viewport: whole world within the Mercator latitude band.
    pub const WORLD: Bounds = Bounds {
        west: -180.0,
        south: -85.0,
        east: 180.0,
        north: 85.0,
    };

    /// Create bounds from edges.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Create bounds from `[west, south, east, north]`.
    pub fn from_array([west, south, east, north]: [f64; 4]) -> Self {
        Self::new(west, south, east, north)
    }

    /// The bounds as `[west, south, east, north]`.
    pub fn to_array(self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Whether a point lies inside the box after the normalization queries
    /// apply (latitude clamp, longitude wrap, antimeridian split).
    ///
    /// A query returns every entry with at least one member for which this
    /// holds. A cluster's own centroid may still fall outside.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        let lat_ok = |b: &Bounds| latitude >= b.south && latitude <= b.north;
        let lng_ok = |b: &Bounds| longitude >= b.west && longitude <= b.east;
        match self.normalized() {
            QueryBox::Single(b) => lat_ok(&b) && lng_ok(&b),
            QueryBox::Split(a, b) => (lat_ok(&a) && lng_ok(&a)) || (lat_ok(&b) && lng_ok(&b)),
        }
    }

    /// Clamp latitudes to [-90, 90] and wrap longitudes into [-180, 180].
    ///
    /// A longitude span of 360° or more covers the whole world. Any other
    /// box whose wrapped west edge lies east of its east edge is split at
    /// the antimeridian.
    pub(crate) fn normalized(&self) -> QueryBox {
        let south = self.south.clamp(-90.0, 90.0);
        let north = self.north.clamp(-90.0, 90.0);

        if self.east - self.west >= 360.0 || !(self.east - self.west).is_finite() {
            return QueryBox::Single(Bounds::new(-180.0, south, 180.0, north));
        }

        let west = wrap_lng(self.west);
        let east = if self.east == 180.0 {
            180.0
        } else {
            wrap_lng(self.east)
        };

        if west > east {
            QueryBox::Split(
                Bounds::new(west, south, 180.0, north),
                Bounds::new(-180.0, south, east, north),
            )
        } else {
            QueryBox::Single(Bounds::new(west, south, east, north))
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::WORLD
    }
}

impl From<[f64; 4]> for Bounds {
    fn from(edges: [f64; 4]) -> Self {
        Self::from_array(edges)
    }
}

/// Wrap a longitude into `[-180, 180)`.
fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

/// A map viewport reported by the rendering surface on pan or zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current zoom; may be fractional.
    pub zoom: f64,
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(zoom: f64, latitude: f64, longitude: f64) -> Self {
        Self {
            zoom,
            latitude,
            longitude,
        }
    }

    /// Estimated bounds of this viewport.
    pub fn bounds(&self) -> Bounds {
        estimate_bounds(self.latitude, self.longitude, self.zoom)
    }
}

/// Half-height and half-width in degrees at `zoom`: `(180 / 2^zoom, 360 / 2^zoom)`.
pub fn bounds_deltas(zoom: f64) -> (f64, f64) {
    let scale = zoom.exp2();
    (180.0 / scale, 360.0 / scale)
}

/// Approximate the visible box around a center point.
///
/// Ignores aspect ratio, projection distortion and pixel dimensions. The
/// result is not clamped: out-of-range edges are normalized when the box
/// is queried.
pub fn estimate_bounds(center_lat: f64, center_lng: f64, zoom: f64) -> Bounds {
    let (lat_delta, lng_delta) = bounds_deltas(zoom);
    Bounds {
        west: center_lng - lng_delta,
        south: center_lat - lat_delta,
        east: center_lng + lng_delta,
        north: center_lat + lat_delta,
    }
}
