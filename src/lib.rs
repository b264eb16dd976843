//! # geocluster
//!
//! Zoom-aware clustering of geotagged photos for interactive maps.
//!
//! Photos arrive with optional coordinates; those with a usable geotag are
//! indexed once, and every pan or zoom re-queries the index for the markers
//! to draw: aggregated clusters where photos would overlap on screen, single
//! photos everywhere else.
//!
//! ```rust
//! use geocluster::{Photo, PhotoClusterer, Viewport};
//!
//! let mut map = PhotoClusterer::new(2.0);
//! map.set_photos(vec![
//!     Photo::new("harbour", 59.910, 10.750),
//!     Photo::new("opera", 59.907, 10.753),
//!     Photo::new("fjord", 60.390, 5.320),
//!     Photo::untagged("scan"),
//! ]);
//!
//! map.on_viewport_change(Viewport::new(5.0, 60.0, 8.0));
//! assert_eq!(map.clusters().len(), 1);
//! assert_eq!(map.clusters()[0].count, 2);
//! assert_eq!(map.single_photos()[0].id, "fjord");
//! ```
//!
//! The optional `parallel` feature projects points with rayon while building
//! an index.

pub mod cluster;
pub mod clusterer;
pub mod config;
/// Error types used across `geocluster`.
pub mod error;
pub mod photo;
pub mod spatial;
pub mod viewport;


pub use cluster::{
    build_index, query, Cluster, ClusterId, ClusterIndex, ClusterView, IndexEntry, SpatialIndex,
};
pub use clusterer::PhotoClusterer;
pub use config::ClusterOptions;
pub use error::{Error, Result};
pub use photo::{valid_photos, Photo, PhotoPoint};
pub use viewport::{bounds_deltas, estimate_bounds, Bounds, Viewport};
