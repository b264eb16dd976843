//! Zoom-aware clustering of map markers.
//!
//! Rendering thousands of overlapping markers is slow and unreadable. This
//! module merges markers that would overlap on screen into one aggregate
//! marker per group, with a different grouping for every integer zoom.
//!
//! ## Pieces
//!
//! | Piece | Role |
//! |-------|------|
//! | [`SpatialIndex`] | Built once per photo list; R-trees per zoom level |
//! | [`ClusterIndex`] | Trait the query runs against |
//! | [`query`] | Viewport + zoom → [`ClusterView`] with members resolved |
//!
//! ## Radius and Zoom
//!
//! Clustering works in pixels: two markers merge when they would render
//! within `radius` pixels of each other. At zoom `z` the world is
//! `extent · 2^z` pixels wide, so the same pixel radius covers half the
//! ground distance each time the zoom increases by one:
//!
//! ```text
//! zoom │ radius as a fraction of the world width (80 px, 512 px tiles)
//! ─────┼─────────────────────────────────────────────
//!   0  │ 0.156
//!   8  │ 0.00061
//!  16  │ 0.0000024
//! ```
//!
//! Above `max_zoom` nothing is merged.
//!
//! ## Usage
//!
//! ```rust
//! use geocluster::cluster::{build_index, query};
//! use geocluster::{Bounds, Photo, valid_photos};
//!
//! let photos = valid_photos(vec![
//!     Photo::new("a", 10.0, 10.0),
//!     Photo::new("b", 10.001, 10.0),
//!     Photo::new("c", 50.0, 50.0),
//! ]);
//!
//! let index = build_index(photos);
//! let view = query(&index, 2.0, Bounds::WORLD);
//! assert_eq!(view.clusters.len(), 1);
//! assert_eq!(view.clusters[0].count, 2);
//! assert_eq!(view.single_photos[0].id, "c");
//! ```

mod index;
mod query;
mod traits;

pub use index::{build_index, ClusterId, ClusterSummary, IndexEntry, SpatialIndex};
pub use query::{query, Cluster, ClusterView};
pub use traits::ClusterIndex;
