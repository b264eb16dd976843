//! Cluster index trait.

use super::index::{ClusterId, IndexEntry};
use crate::error::Result;
use crate::photo::PhotoPoint;
use crate::viewport::Bounds;

/// A queryable, zoom-aware point index.
///
/// [`query`](super::query) works against this trait, so a map view can be
/// driven by any index that reports entries per zoom and resolves cluster
/// members.
pub trait ClusterIndex {
    /// Entries intersecting `bounds` at `zoom` (floored).
    fn clusters(&self, bounds: &Bounds, zoom: f64) -> Vec<IndexEntry<'_>>;

    /// Leaf members of a cluster, skipping `offset` and returning at most `limit`.
    fn leaves(&self, id: ClusterId, limit: usize, offset: usize) -> Result<Vec<&PhotoPoint>>;

    /// First zoom at which the cluster breaks apart.
    fn expansion_zoom(&self, id: ClusterId) -> Result<u8>;
}
