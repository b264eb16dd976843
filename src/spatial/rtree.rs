//! R-tree indexed positions and extents in projected space.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A node position with its index, for radius queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPosition {
    pub idx: usize,
    pub x: f64,
    pub y: f64,
}

impl RTreeObject for IndexedPosition {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedPosition {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// The bounding box of a node's members, for viewport queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedExtent {
    pub idx: usize,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl RTreeObject for IndexedExtent {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

/// Indices of positions within distance `r` of `(x, y)`.
pub fn within(tree: &RTree<IndexedPosition>, x: f64, y: f64, r: f64) -> Vec<usize> {
    tree.locate_within_distance([x, y], r * r)
        .map(|p| p.idx)
        .collect()
}

/// Indices of extents touching the closed box `[min_x, max_x] × [min_y, max_y]`.
pub fn intersecting(
    tree: &RTree<IndexedExtent>,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
) -> Vec<usize> {
    let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
    tree.locate_in_envelope_intersecting(&envelope)
        .map(|e| e.idx)
        .collect()
}
