//! Clustering options.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Highest zoom an index may be built for. Zoom levels are stored as `u8`
/// and `2^zoom` must stay exactly representable.
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

/// Configuration for building a [`SpatialIndex`](crate::SpatialIndex).
///
/// Deserializes with every field optional, so a TOML table only needs the
/// values it overrides:
///
/// ```rust
/// use geocluster::ClusterOptions;
///
/// let options = ClusterOptions::from_toml_str("radius = 60.0\nmax_zoom = 18").unwrap();
/// assert_eq!(options.radius, 60.0);
/// assert_eq!(options.max_zoom, 18);
/// assert_eq!(options.min_points, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    /// Cluster radius in screen pixels.
    pub radius: f64,
    /// Tile extent in pixels; converts `radius` into map units.
    pub extent: f64,
    /// Lowest zoom level that gets its own cluster level.
    pub min_zoom: u8,
    /// Highest zoom level at which points are clustered. Above it every
    /// point is returned individually.
    pub max_zoom: u8,
    /// Minimum number of points needed to form a cluster.
    pub min_points: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius: 80.0,
            extent: 512.0,
            min_zoom: 0,
            max_zoom: 16,
            min_points: 2,
        }
    }
}

impl ClusterOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let options: Self = toml::from_str(source)?;
        options.validate()?;
        Ok(options)
    }

    /// Set the cluster radius (pixels).
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the tile extent (pixels).
    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    /// Set the minimum zoom level.
    pub fn with_min_zoom(mut self, zoom: u8) -> Self {
        self.min_zoom = zoom;
        self
    }

    /// Set the maximum clustering zoom level.
    pub fn with_max_zoom(mut self, zoom: u8) -> Self {
        self.max_zoom = zoom;
        self
    }

    /// Set the minimum cluster size.
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(Error::InvalidParameter {
                name: "radius",
                message: "must be positive and finite",
            });
        }
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(Error::InvalidParameter {
                name: "extent",
                message: "must be positive and finite",
            });
        }
        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(Error::InvalidParameter {
                name: "max_zoom",
                message: "must be at most 30",
            });
        }
        if self.min_zoom > self.max_zoom {
            return Err(Error::InvalidParameter {
                name: "min_zoom",
                message: "must not exceed max_zoom",
            });
        }
        if self.min_points < 2 {
            return Err(Error::InvalidParameter {
                name: "min_points",
                message: "must be at least 2",
            });
        }
        Ok(())
    }

    /// Search radius in projected unit-square distance at `zoom`.
    pub(crate) fn radius_at(&self, zoom: u8) -> f64 {
        self.radius / (self.extent * f64::from(1u32 << zoom))
    }
}
