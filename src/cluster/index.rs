//! Zoom-level point clustering index.
//!
//! # The Algorithm
//!
//! Clusters are built bottom-up, one level per integer zoom:
//!
//! 1. Project every point into the Web-Mercator unit square.
//! 2. Level `max_zoom + 1` holds every point on its own.
//! 3. For each zoom `z` from `max_zoom` down to `min_zoom`, walk the nodes
//!    of level `z + 1` in order. An unvisited node gathers every unvisited
//!    neighbour within `radius / (extent · 2^z)`. If the neighbourhood adds
//!    points and reaches `min_points`, the group becomes one cluster at the
//!    count-weighted centroid; otherwise the nodes carry over unchanged.
//! 4. Every level gets two R-trees: node positions for the neighbour
//!    search of the next coarser level, and member extents for viewport
//!    queries.
//!
//! A viewport query matches a node by the bounding box of its members, not
//! by its centroid. A cluster whose centroid sits just outside the view is
//! still returned when any of its photos is inside.
//!
//! A cluster remembers which level-`z + 1` nodes formed it, so its leaves
//! are resolved by walking down the levels without any further search.
//!
//! ## Complexity
//!
//! - **Build**: O(n log n) per zoom level.
//! - **Viewport query**: O(log n + k) for k entries.
//! - **Leaves**: O(size of the cluster's subtree).

use super::traits::ClusterIndex;
use crate::config::ClusterOptions;
use crate::error::{Error, Result};
use crate::photo::PhotoPoint;
use crate::spatial::projection::{lat_to_y, lng_to_x, x_to_lng, y_to_lat};
use crate::spatial::rtree::{intersecting, within};
use crate::spatial::{IndexedExtent, IndexedPosition};
use crate::viewport::{Bounds, QueryBox};
use rstar::RTree;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Identifier of a cluster within one built index.
///
/// Ids are dense and assigned in build order. They carry no meaning across
/// rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(u64);

impl ClusterId {
    /// Wrap a raw id, e.g. one echoed back by a client.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ClusterId> for u64 {
    fn from(id: ClusterId) -> Self {
        id.0
    }
}

/// Aggregate marker for a cluster at some zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterSummary {
    /// Cluster id.
    pub id: ClusterId,
    /// Centroid latitude.
    pub latitude: f64,
    /// Centroid longitude.
    pub longitude: f64,
    /// Number of leaf points.
    pub count: usize,
}

/// One entry of a raw index query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexEntry<'a> {
    /// Several points merged at this zoom.
    Cluster(ClusterSummary),
    /// A point with no neighbours to merge with.
    Point(&'a PhotoPoint),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeKind {
    Leaf(usize),
    Cluster(ClusterId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Node {
    x: f64,
    y: f64,
    /// Bounding box of every member leaf, `[min_x, min_y, max_x, max_y]`.
    extent: [f64; 4],
    count: usize,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
struct Level {
    nodes: Vec<Node>,
    positions: RTree<IndexedPosition>,
    extents: RTree<IndexedExtent>,
}

impl Level {
    fn new(nodes: Vec<Node>) -> Self {
        let positions = RTree::bulk_load(
            nodes
                .iter()
                .enumerate()
                .map(|(idx, n)| IndexedPosition { idx, x: n.x, y: n.y })
                .collect(),
        );
        let extents = RTree::bulk_load(
            nodes
                .iter()
                .enumerate()
                .map(|(idx, n)| {
                    let [min_x, min_y, max_x, max_y] = n.extent;
                    IndexedExtent {
                        idx,
                        min_x,
                        min_y,
                        max_x,
                        max_y,
                    }
                })
                .collect(),
        );
        Self {
            nodes,
            positions,
            extents,
        }
    }
}

#[derive(Debug, Clone)]
struct ClusterRecord {
    /// Zoom at which the cluster formed.
    zoom: u8,
    /// Node indices in the level at `zoom + 1`.
    children: Vec<usize>,
}

/// Immutable clustering index over a set of photos.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    options: ClusterOptions,
    points: Vec<PhotoPoint>,
    /// `levels[i]` holds zoom `min_zoom + i`; the last level is `max_zoom + 1`.
    levels: Vec<Level>,
    clusters: Vec<ClusterRecord>,
}

/// Build an index with default options.
pub fn build_index(points: Vec<PhotoPoint>) -> SpatialIndex {
    SpatialIndex::build_validated(points, &ClusterOptions::default())
}

impl SpatialIndex {
    /// Build an index over `points`. Fails only on invalid options.
    pub fn build(points: Vec<PhotoPoint>, options: &ClusterOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build_validated(points, options))
    }

    /// Build with options the caller has already validated.
    pub(crate) fn build_validated(points: Vec<PhotoPoint>, options: &ClusterOptions) -> Self {
        let started = Instant::now();

        let mut finer = Level::new(project(&points));
        let mut levels = Vec::with_capacity(usize::from(options.max_zoom - options.min_zoom) + 2);
        let mut clusters = Vec::new();

        for zoom in (options.min_zoom..=options.max_zoom).rev() {
            let coarser = Level::new(cluster_level(&finer, zoom, options, &mut clusters));
            levels.push(finer);
            finer = coarser;
        }
        levels.push(finer);
        levels.reverse();

        debug!(
            points = points.len(),
            levels = levels.len(),
            clusters = clusters.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "built spatial index"
        );

        Self {
            options: options.clone(),
            points,
            levels,
            clusters,
        }
    }

    /// Options the index was built with.
    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Indexed points, in input order.
    pub fn points(&self) -> &[PhotoPoint] {
        &self.points
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Entries with at least one member inside `bounds` at `zoom`.
    ///
    /// The zoom is floored and clamped to `[min_zoom, max_zoom + 1]`. Bounds
    /// are normalized (see [`Bounds`]) so antimeridian-crossing and
    /// over-sized boxes are handled here rather than rejected. Entries come
    /// back in level order, each at most once.
    pub fn clusters(&self, bounds: &Bounds, zoom: f64) -> Vec<IndexEntry<'_>> {
        let level = self.level(self.limit_zoom(zoom));
        let mut hits = match bounds.normalized() {
            QueryBox::Single(b) => nodes_touching(level, &b),
            QueryBox::Split(east_side, west_side) => {
                let mut hits = nodes_touching(level, &east_side);
                hits.extend(nodes_touching(level, &west_side));
                hits
            }
        };
        // A wide cluster can reach into both halves of a split box.
        hits.sort_unstable();
        hits.dedup();

        hits.into_iter()
            .map(|i| self.entry(&level.nodes[i]))
            .collect()
    }

    /// Entries one zoom finer that merged into this cluster.
    pub fn children(&self, id: ClusterId) -> Result<Vec<IndexEntry<'_>>> {
        let record = self.record(id)?;
        let level = self.level(record.zoom + 1);
        Ok(record
            .children
            .iter()
            .map(|&c| self.entry(&level.nodes[c]))
            .collect())
    }

    /// Leaf members of a cluster, skipping `offset` and returning at most `limit`.
    ///
    /// Pass `usize::MAX` as `limit` to resolve every member.
    pub fn leaves(&self, id: ClusterId, limit: usize, offset: usize) -> Result<Vec<&PhotoPoint>> {
        let mut out = Vec::new();
        if limit == 0 {
            // Still reject ids this index never issued.
            self.record(id)?;
            return Ok(out);
        }
        let mut skipped = 0;
        self.append_leaves(id, limit, offset, &mut skipped, &mut out)?;
        Ok(out)
    }

    /// First zoom at which the cluster breaks into separate entries.
    pub fn expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        // Every cluster forms from at least two nodes of the next level, so
        // it splits exactly one zoom above the one it formed at.
        Ok(self.record(id)?.zoom + 1)
    }

    fn append_leaves<'a>(
        &'a self,
        id: ClusterId,
        limit: usize,
        offset: usize,
        skipped: &mut usize,
        out: &mut Vec<&'a PhotoPoint>,
    ) -> Result<()> {
        let record = self.record(id)?;
        let level = self.level(record.zoom + 1);

        for &c in &record.children {
            let node = &level.nodes[c];
            match node.kind {
                NodeKind::Cluster(child) => {
                    if *skipped + node.count <= offset {
                        *skipped += node.count;
                    } else {
                        self.append_leaves(child, limit, offset, skipped, out)?;
                    }
                }
                NodeKind::Leaf(i) => {
                    if *skipped < offset {
                        *skipped += 1;
                    } else {
                        out.push(&self.points[i]);
                    }
                }
            }
            if out.len() == limit {
                break;
            }
        }
        Ok(())
    }

    fn record(&self, id: ClusterId) -> Result<&ClusterRecord> {
        usize::try_from(id.get())
            .ok()
            .and_then(|i| self.clusters.get(i))
            .ok_or(Error::UnknownCluster { id })
    }

    fn limit_zoom(&self, zoom: f64) -> u8 {
        let min = f64::from(self.options.min_zoom);
        let max = f64::from(self.options.max_zoom) + 1.0;
        let z = zoom.floor().clamp(min, max);
        if z.is_nan() {
            self.options.min_zoom
        } else {
            z as u8
        }
    }

    fn level(&self, zoom: u8) -> &Level {
        &self.levels[usize::from(zoom - self.options.min_zoom)]
    }

    fn entry(&self, node: &Node) -> IndexEntry<'_> {
        match node.kind {
            NodeKind::Leaf(i) => IndexEntry::Point(&self.points[i]),
            NodeKind::Cluster(id) => IndexEntry::Cluster(ClusterSummary {
                id,
                latitude: y_to_lat(node.y),
                longitude: x_to_lng(node.x),
                count: node.count,
            }),
        }
    }
}

impl ClusterIndex for SpatialIndex {
    fn clusters(&self, bounds: &Bounds, zoom: f64) -> Vec<IndexEntry<'_>> {
        SpatialIndex::clusters(self, bounds, zoom)
    }

    fn leaves(&self, id: ClusterId, limit: usize, offset: usize) -> Result<Vec<&PhotoPoint>> {
        SpatialIndex::leaves(self, id, limit, offset)
    }

    fn expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        SpatialIndex::expansion_zoom(self, id)
    }
}

/// Indices of nodes whose member extent touches `b`.
fn nodes_touching(level: &Level, b: &Bounds) -> Vec<usize> {
    // North maps to the smaller y.
    intersecting(
        &level.extents,
        lng_to_x(b.west),
        lat_to_y(b.north),
        lng_to_x(b.east),
        lat_to_y(b.south),
    )
}

fn leaf_node(i: usize, p: &PhotoPoint) -> Node {
    let x = lng_to_x(p.longitude);
    let y = lat_to_y(p.latitude);
    Node {
        x,
        y,
        extent: [x, y, x, y],
        count: 1,
        kind: NodeKind::Leaf(i),
    }
}

#[cfg_attr(feature = "parallel", allow(dead_code))]
fn project_sequential(points: &[PhotoPoint]) -> Vec<Node> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| leaf_node(i, p))
        .collect()
}

#[cfg(feature = "parallel")]
fn project_parallel(points: &[PhotoPoint]) -> Vec<Node> {
    points
        .par_iter()
        .enumerate()
        .map(|(i, p)| leaf_node(i, p))
        .collect()
}

#[cfg(feature = "parallel")]
fn project(points: &[PhotoPoint]) -> Vec<Node> {
    project_parallel(points)
}

#[cfg(not(feature = "parallel"))]
fn project(points: &[PhotoPoint]) -> Vec<Node> {
    project_sequential(points)
}

/// Merge the nodes of `finer` into the level for `zoom`.
fn cluster_level(
    finer: &Level,
    zoom: u8,
    options: &ClusterOptions,
    clusters: &mut Vec<ClusterRecord>,
) -> Vec<Node> {
    let r = options.radius_at(zoom);
    let mut visited = vec![false; finer.nodes.len()];
    let mut out = Vec::with_capacity(finer.nodes.len());

    for (i, node) in finer.nodes.iter().enumerate() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let neighbors: Vec<usize> = within(&finer.positions, node.x, node.y, r)
            .into_iter()
            .filter(|&j| !visited[j])
            .collect();
        let count = node.count + neighbors.iter().map(|&j| finer.nodes[j].count).sum::<usize>();

        if count > node.count && count >= options.min_points {
            let mut wx = node.x * node.count as f64;
            let mut wy = node.y * node.count as f64;
            let mut extent = node.extent;
            let mut children = Vec::with_capacity(neighbors.len() + 1);
            children.push(i);

            for &j in &neighbors {
                visited[j] = true;
                let b = &finer.nodes[j];
                wx += b.x * b.count as f64;
                wy += b.y * b.count as f64;
                extent = [
                    extent[0].min(b.extent[0]),
                    extent[1].min(b.extent[1]),
                    extent[2].max(b.extent[2]),
                    extent[3].max(b.extent[3]),
                ];
                children.push(j);
            }

            let id = ClusterId(clusters.len() as u64);
            clusters.push(ClusterRecord { zoom, children });
            out.push(Node {
                x: wx / count as f64,
                y: wy / count as f64,
                extent,
                count,
                kind: NodeKind::Cluster(id),
            });
        } else {
            out.push(*node);
            // Too few to cluster: the neighbours stay separate at this zoom too.
            if count > 1 {
                for &j in &neighbors {
                    visited[j] = true;
                    out.push(finer.nodes[j]);
                }
            }
        }
    }

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::photo::Photo;
    use std::collections::HashSet;

    fn point(id: &str, lat: f64, lng: f64) -> PhotoPoint {
        Photo::new(id, lat, lng).to_point().unwrap()
    }

    fn tight_group() -> Vec<PhotoPoint> {
        vec![
            point("n0", 10.0, 10.0),
            point("n1", 10.001, 10.0),
            point("n2", 10.0, 10.001),
            point("n3", 9.999, 10.0),
            point("n4", 10.0, 9.999),
            point("far", 50.0, 50.0),
        ]
    }

    fn only_cluster(entries: &[IndexEntry<'_>]) -> ClusterSummary {
        let summaries: Vec<ClusterSummary> = entries
            .iter()
            .filter_map(|e| match e {
                IndexEntry::Cluster(s) => Some(*s),
                IndexEntry::Point(_) => None,
            })
            .collect();
        assert_eq!(summaries.len(), 1, "{entries:?}");
        summaries[0]
    }

    #[test]
    fn test_empty_index() {
        let index = build_index(Vec::new());
        assert!(index.is_empty());
        for zoom in 0..20 {
            assert!(index.clusters(&Bounds::WORLD, zoom as f64).is_empty());
        }
    }

    #[test]
    fn test_tight_group_clusters_at_low_zoom() {
        let index = build_index(tight_group());
        let entries = index.clusters(&Bounds::WORLD, 2.0);
        assert_eq!(entries.len(), 2);

        let summary = only_cluster(&entries);
        assert_eq!(summary.count, 5);
        assert!((summary.latitude - 10.0).abs() < 0.01);
        assert!((summary.longitude - 10.0).abs() < 0.01);

        assert!(entries
            .iter()
            .any(|e| matches!(e, IndexEntry::Point(p) if p.id == "far")));
    }

    #[test]
    fn test_above_max_zoom_all_points_individual() {
        let index = build_index(tight_group());
        let entries = index.clusters(&Bounds::WORLD, 17.0);
        assert_eq!(entries.len(), 6);
        assert!(entries.iter().all(|e| matches!(e, IndexEntry::Point(_))));

        // Zooms past the last level clamp to it.
        assert_eq!(index.clusters(&Bounds::WORLD, 25.5).len(), 6);
    }

    #[test]
    fn test_fractional_zoom_is_floored() {
        let index = build_index(tight_group());
        assert_eq!(
            index.clusters(&Bounds::WORLD, 2.9),
            index.clusters(&Bounds::WORLD, 2.0)
        );
    }

    #[test]
    fn test_leaves_resolve_every_member() {
        let index = build_index(tight_group());
        let summary = only_cluster(&index.clusters(&Bounds::WORLD, 0.0));

        let leaves = index.leaves(summary.id, usize::MAX, 0).unwrap();
        assert_eq!(leaves.len(), summary.count);
        let ids: HashSet<&str> = leaves.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["n0", "n1", "n2", "n3", "n4"].into_iter().collect());
    }

    #[test]
    fn test_leaves_paging() {
        let points: Vec<PhotoPoint> = (0..20)
            .map(|i| point(&format!("p{i}"), 40.0 + i as f64 * 1e-4, -3.0))
            .collect();
        let index = build_index(points);
        let summary = only_cluster(&index.clusters(&Bounds::WORLD, 0.0));
        assert_eq!(summary.count, 20);

        let all: Vec<String> = index
            .leaves(summary.id, usize::MAX, 0)
            .unwrap()
            .iter()
            .map(|p| p.id.clone())
            .collect();

        let page: Vec<String> = index
            .leaves(summary.id, 5, 7)
            .unwrap()
            .iter()
            .map(|p| p.id.clone())
            .collect();
        assert_eq!(page, all[7..12].to_vec());

        let tail = index.leaves(summary.id, 10, 15).unwrap();
        assert_eq!(tail.len(), 5);
        assert!(index.leaves(summary.id, 0, 0).unwrap().is_empty());
        assert!(index.leaves(summary.id, 10, 50).unwrap().is_empty());
    }

    #[test]
    fn test_children_sum_to_count() {
        let index = build_index(tight_group());
        let summary = only_cluster(&index.clusters(&Bounds::WORLD, 0.0));
        let children = index.children(summary.id).unwrap();
        assert!(children.len() >= 2);

        let total: usize = children
            .iter()
            .map(|c| match c {
                IndexEntry::Cluster(s) => s.count,
                IndexEntry::Point(_) => 1,
            })
            .sum();
        assert_eq!(total, summary.count);
    }

    #[test]
    fn test_expansion_zoom_splits_cluster() {
        let index = build_index(tight_group());
        let summary = only_cluster(&index.clusters(&Bounds::WORLD, 0.0));
        let zoom = index.expansion_zoom(summary.id).unwrap();
        assert!(zoom >= 1 && zoom <= 17);

        let at_expansion = index.clusters(&Bounds::WORLD, f64::from(zoom));
        let near: Vec<_> = at_expansion
            .iter()
            .filter(|e| !matches!(e, IndexEntry::Point(p) if p.id == "far"))
            .collect();
        assert!(near.len() > 1);

        let before = index.clusters(&Bounds::WORLD, f64::from(zoom - 1));
        assert!(before
            .iter()
            .any(|e| matches!(e, IndexEntry::Cluster(s) if s.id == summary.id)));
    }

    #[test]
    fn test_unknown_cluster() {
        let index = build_index(tight_group());
        let bogus = ClusterId::new(9_999);
        assert_eq!(
            index.leaves(bogus, 10, 0),
            Err(Error::UnknownCluster { id: bogus })
        );
        assert!(index.leaves(bogus, 0, 0).is_err());
        assert!(index.children(bogus).is_err());
        assert!(index.expansion_zoom(bogus).is_err());
    }

    #[test]
    fn test_min_points_three_keeps_pairs_apart() {
        let points = vec![point("a", 0.0, 0.0), point("b", 0.0, 0.0001)];
        let options = ClusterOptions::default().with_min_points(3);
        let index = SpatialIndex::build(points, &options).unwrap();
        let entries = index.clusters(&Bounds::WORLD, 0.0);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| matches!(e, IndexEntry::Point(_))));
    }

    #[test]
    fn test_bounds_filter() {
        let index = build_index(tight_group());
        let entries = index.clusters(&Bounds::new(40.0, 40.0, 60.0, 60.0), 3.0);
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0], IndexEntry::Point(p) if p.id == "far"));
    }

    #[test]
    fn test_antimeridian_query() {
        let points = vec![
            point("east", 0.0, 175.0),
            point("west", 0.0, -175.0),
            point("middle", 0.0, 0.0),
        ];
        let index = build_index(points);
        let entries = index.clusters(&Bounds::new(170.0, -10.0, -170.0, 10.0), 10.0);
        let ids: HashSet<&str> = entries
            .iter()
            .filter_map(|e| match e {
                IndexEntry::Point(p) => Some(p.id.as_str()),
                IndexEntry::Cluster(_) => None,
            })
            .collect();
        assert_eq!(ids, ["east", "west"].into_iter().collect());
    }

    #[test]
    fn test_cluster_matched_by_member_extent() {
        let index = build_index(vec![point("inside", 0.0, 10.0), point("outside", 0.0, 9.0)]);
        let view = Bounds::new(9.8, -1.0, 11.0, 1.0);

        // The pair merges at zoom 0 with its centroid at 9.5°, west of the box.
        let entries = index.clusters(&view, 0.0);
        assert_eq!(entries.len(), 1);
        let IndexEntry::Cluster(c) = entries[0] else {
            panic!("expected a cluster, got {:?}", entries[0]);
        };
        assert!(!view.contains(c.latitude, c.longitude));
        assert_eq!(c.count, 2);

        // Once split, only the visible photo comes back.
        let entries = index.clusters(&view, 17.0);
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0], IndexEntry::Point(p) if p.id == "inside"));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_projection_matches_sequential() {
        let points: Vec<PhotoPoint> = (0..500)
            .map(|i| point(&format!("p{i}"), (i % 170) as f64 - 85.0, (i % 360) as f64 - 180.0))
            .collect();
        assert_eq!(project_parallel(&points), project_sequential(&points));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = ClusterOptions::default().with_radius(-5.0);
        assert!(matches!(
            SpatialIndex::build(Vec::new(), &options),
            Err(Error::InvalidParameter { name: "radius", .. })
        ));
    }
}
