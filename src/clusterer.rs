//! Stateful clustering for a live map view.
//!
//! [`PhotoClusterer`] owns the index for the current photo list and the
//! current viewport, and keeps a [`ClusterView`] in sync with both. The map
//! surface reports every pan or zoom through
//! [`on_viewport_change`](PhotoClusterer::on_viewport_change) and renders
//! whatever [`view`](PhotoClusterer::view) holds afterwards.

use crate::cluster::{query, Cluster, ClusterId, ClusterView, SpatialIndex};
use crate::config::ClusterOptions;
use crate::error::{Error, Result};
use crate::photo::{valid_photos, Photo, PhotoPoint};
use crate::viewport::{estimate_bounds, Bounds, Viewport};
use tracing::debug;

/// Clustering state behind one map view.
#[derive(Debug, Clone)]
pub struct PhotoClusterer {
    options: ClusterOptions,
    /// `None` while there are no valid photos.
    index: Option<SpatialIndex>,
    zoom: f64,
    bounds: Bounds,
    view: ClusterView,
}

impl PhotoClusterer {
    /// Create with default options, starting at `default_zoom` over the whole world.
    pub fn new(default_zoom: f64) -> Self {
        Self {
            options: ClusterOptions::default(),
            index: None,
            zoom: default_zoom,
            bounds: Bounds::WORLD,
            view: ClusterView::default(),
        }
    }

    /// Create with custom options.
    pub fn with_options(options: ClusterOptions, default_zoom: f64) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            ..Self::new(default_zoom)
        })
    }

    /// Replace the photo list.
    ///
    /// Photos without finite coordinates are dropped. The index is rebuilt
    /// from scratch, or discarded when nothing valid remains.
    pub fn set_photos<I>(&mut self, photos: I)
    where
        I: IntoIterator<Item = Photo>,
    {
        let valid = valid_photos(photos);
        debug!(valid = valid.len(), "replacing photo list");

        self.index = if valid.is_empty() {
            None
        } else {
            Some(SpatialIndex::build_validated(valid, &self.options))
        };
        self.refresh();
    }

    /// Apply a pan or zoom reported by the map.
    ///
    /// Sets the zoom and re-estimates the bounds around the new center.
    /// Repeating the same viewport leaves everything unchanged.
    pub fn on_viewport_change(&mut self, viewport: Viewport) {
        let bounds = estimate_bounds(viewport.latitude, viewport.longitude, viewport.zoom);
        if viewport.zoom == self.zoom && bounds == self.bounds {
            return;
        }

        debug!(
            zoom = viewport.zoom,
            latitude = viewport.latitude,
            longitude = viewport.longitude,
            "viewport changed"
        );
        self.zoom = viewport.zoom;
        self.bounds = bounds;
        self.refresh();
    }

    /// Clusters for the current viewport.
    pub fn clusters(&self) -> &[Cluster] {
        &self.view.clusters
    }

    /// Unclustered photos for the current viewport.
    pub fn single_photos(&self) -> &[PhotoPoint] {
        &self.view.single_photos
    }

    /// The full current result.
    pub fn view(&self) -> &ClusterView {
        &self.view
    }

    /// Current zoom, as last reported.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Current estimated bounds.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Photos that passed coordinate filtering.
    pub fn valid_photos(&self) -> &[PhotoPoint] {
        self.index
            .as_ref()
            .map(SpatialIndex::points)
            .unwrap_or_default()
    }

    /// The current index, if any photos are loaded.
    pub fn index(&self) -> Option<&SpatialIndex> {
        self.index.as_ref()
    }

    /// Options used for every rebuild.
    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Zoom a map should jump to when a cluster marker is clicked.
    pub fn expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        match &self.index {
            Some(index) => index.expansion_zoom(id),
            None => Err(Error::UnknownCluster { id }),
        }
    }

    fn refresh(&mut self) {
        self.view = match &self.index {
            Some(index) => query(index, self.zoom, self.bounds),
            None => ClusterView::default(),
        };
    }
}

impl Default for PhotoClusterer {
    fn default() -> Self {
        Self::new(0.0)
    }
}
