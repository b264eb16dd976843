//! Viewport queries that resolve clusters into renderable groups.

use super::index::{ClusterId, IndexEntry};
use super::traits::ClusterIndex;
use crate::photo::PhotoPoint;
use crate::viewport::Bounds;
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

/// A group of nearby photos shown as one marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Id within the index that produced this result.
    pub id: ClusterId,
    /// Centroid latitude.
    pub latitude: f64,
    /// Centroid longitude.
    pub longitude: f64,
    /// Number of member photos.
    pub count: usize,
    /// Zoom at which the cluster splits; where a click should zoom to.
    pub expansion_zoom: u8,
    /// Every member photo. Order follows the index, not sorted.
    pub photos: Vec<PhotoPoint>,
}

/// Clusters and standalone photos for one viewport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterView {
    /// Aggregated groups.
    pub clusters: Vec<Cluster>,
    /// Photos with no neighbours at this zoom.
    pub single_photos: Vec<PhotoPoint>,
}

impl ClusterView {
    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.single_photos.is_empty()
    }

    /// Total photos across clusters and single photos.
    pub fn photo_count(&self) -> usize {
        self.clusters.iter().map(|c| c.count).sum::<usize>() + self.single_photos.len()
    }
}

/// Query `index` for the viewport `bounds` at `zoom`.
///
/// The zoom is floored before querying. Cluster members are resolved
/// eagerly, so `photos.len() == count` for every returned cluster.
pub fn query<I>(index: &I, zoom: f64, bounds: Bounds) -> ClusterView
where
    I: ClusterIndex + ?Sized,
{
    let zoom = zoom.floor();
    let mut view = ClusterView::default();

    for entry in index.clusters(&bounds, zoom) {
        match entry {
            IndexEntry::Point(photo) => view.single_photos.push(photo.clone()),
            IndexEntry::Cluster(summary) => {
                let members = index
                    .leaves(summary.id, usize::MAX, 0)
                    .and_then(|leaves| {
                        index
                            .expansion_zoom(summary.id)
                            .map(|zoom| (leaves, zoom))
                    });
                match members {
                    Ok((leaves, expansion_zoom)) => view.clusters.push(Cluster {
                        id: summary.id,
                        latitude: summary.latitude,
                        longitude: summary.longitude,
                        count: summary.count,
                        expansion_zoom,
                        photos: leaves.into_iter().cloned().collect(),
                    }),
                    // An index reporting ids it cannot resolve is broken;
                    // drop the entry rather than render a partial cluster.
                    Err(err) => error!(id = %summary.id, %err, "cluster entry did not resolve"),
                }
            }
        }
    }

    trace!(
        zoom,
        bounds = ?bounds.to_array(),
        clusters = view.clusters.len(),
        single_photos = view.single_photos.len(),
        "cluster query"
    );
    view
}
