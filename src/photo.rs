//! Photo records as they arrive from the data source, and the validated
//! points that take part in clustering.

use serde::{Deserialize, Serialize};

/// A photograph as delivered upstream. Coordinates may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Unique identifier.
    pub id: String,
    /// Latitude in degrees, if geotagged.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude in degrees, if geotagged.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Display URL.
    pub url: String,
    /// Placeholder data shown while the image loads.
    #[serde(default)]
    pub blur_data: Option<String>,
}

impl Photo {
    /// Create a geotagged photo.
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            url: String::new(),
            blur_data: None,
        }
    }

    /// Create a photo without a geotag.
    pub fn untagged(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            latitude: None,
            longitude: None,
            url: String::new(),
            blur_data: None,
        }
    }

    /// Set the display URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the placeholder payload.
    pub fn with_blur_data(mut self, blur_data: impl Into<String>) -> Self {
        self.blur_data = Some(blur_data.into());
        self
    }

    /// Both coordinates, if present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }

    /// Convert into a clusterable point, or `None` if the geotag is unusable.
    pub fn to_point(&self) -> Option<PhotoPoint> {
        let (latitude, longitude) = self.coordinates()?;
        Some(PhotoPoint {
            id: self.id.clone(),
            latitude,
            longitude,
            url: self.url.clone(),
            blur_data: self.blur_data.clone(),
        })
    }
}

/// A photograph with finite coordinates. Immutable once indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoPoint {
    /// Unique identifier.
    pub id: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Display URL.
    pub url: String,
    /// Placeholder data shown while the image loads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_data: Option<String>,
}

impl TryFrom<Photo> for PhotoPoint {
    type Error = Photo;

    /// Moves the photo into a point, handing it back unchanged when its
    /// geotag is missing or non-finite.
    fn try_from(photo: Photo) -> std::result::Result<Self, Self::Error> {
        match photo.coordinates() {
            Some((latitude, longitude)) => Ok(PhotoPoint {
                id: photo.id,
                latitude,
                longitude,
                url: photo.url,
                blur_data: photo.blur_data,
            }),
            None => Err(photo),
        }
    }
}

/// Keep only photos with present, finite coordinates, preserving order.
pub fn valid_photos<I>(photos: I) -> Vec<PhotoPoint>
where
    I: IntoIterator<Item = Photo>,
{
    photos
        .into_iter()
        .filter_map(|photo| PhotoPoint::try_from(photo).ok())
        .collect()
}
