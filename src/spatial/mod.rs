//! Spatial primitives shared by the cluster index.
//!
//! Clustering runs in a flat projected space rather than on raw degrees:
//! a pixel radius at zoom `z` is a fixed distance in Web-Mercator units,
//! so neighbour search reduces to Euclidean queries on an R-tree.
//!
//! - [`projection`]: lng/lat ↔ unit square
//! - [`rtree`]: R-tree objects for node positions and member extents

pub mod projection;
pub mod rtree;

pub use rtree::{IndexedExtent, IndexedPosition};
