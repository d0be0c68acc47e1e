//! Geometry helpers
//!
//! GPS text from tickets is `"lat,lng"`; every geometry sent to the platform
//! is `x = longitude, y = latitude`. [`Coordinates::to_point`] is the only
//! place where that swap happens.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AdmsError, Result};

/// WGS84 well-known id
pub const WGS84_WKID: u32 = 4326;

/// A latitude/longitude pair as read from a ticket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const ORIGIN: Coordinates = Coordinates { lat: 0.0, lng: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn to_point(self) -> Point {
        Point {
            x: self.lng,
            y: self.lat,
        }
    }
}

/// Point geometry in platform order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
}

impl SpatialReference {
    pub fn wgs84() -> Self {
        Self { wkid: WGS84_WKID }
    }
}

/// Polygon as returned by feature queries: rings of `[x, y, ...]` positions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    #[serde(default)]
    pub rings: Vec<Vec<Vec<f64>>>,
}

/// Axis-aligned bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    #[serde(rename = "spatialReference")]
    pub spatial_reference: SpatialReference,
}

impl Extent {
    /// Continental fallback used when no state boundary is available
    pub fn default_mission() -> Self {
        Self {
            xmin: -165.938,
            ymin: 17.903,
            xmax: -30.938,
            ymax: 53.702,
            spatial_reference: SpatialReference::wgs84(),
        }
    }
}

/// Parse a `"lat,lng"` string.
pub fn parse_gps(text: &str) -> Result<Coordinates> {
    let (lat_text, lng_text) = text
        .split_once(',')
        .ok_or_else(|| AdmsError::InvalidGps(format!("missing comma in '{}'", text)))?;

    if lng_text.contains(',') {
        return Err(AdmsError::InvalidGps(format!("too many parts in '{}'", text)));
    }

    let parse_part = |part: &str, axis: &str| -> Result<f64> {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|e| AdmsError::InvalidGps(format!("{} '{}': {}", axis, part.trim(), e)))?;
        if !value.is_finite() {
            return Err(AdmsError::InvalidGps(format!("{} is not finite", axis)));
        }
        Ok(value)
    };

    Ok(Coordinates {
        lat: parse_part(lat_text, "latitude")?,
        lng: parse_part(lng_text, "longitude")?,
    })
}

/// Parse GPS text, falling back to the origin.
///
/// A missing or malformed value is logged and never fails the caller.
pub fn parse_gps_or_origin(text: Option<&str>) -> Coordinates {
    let Some(text) = text else {
        warn!("Ticket has no GPS coordinates, defaulting to origin");
        return Coordinates::ORIGIN;
    };

    parse_gps(text).unwrap_or_else(|e| {
        warn!(gps = %text, error = %e, "Error parsing GPS coordinates, defaulting to origin");
        Coordinates::ORIGIN
    })
}

/// Reduce polygon rings to their bounding rectangle in a single pass.
pub fn reduce_extent(rings: &[Vec<Vec<f64>>]) -> Result<Extent> {
    if rings.is_empty() {
        return Err(AdmsError::EmptyGeometry("polygon has no rings".to_string()));
    }

    let mut xmin = f64::INFINITY;
    let mut ymin = f64::INFINITY;
    let mut xmax = f64::NEG_INFINITY;
    let mut ymax = f64::NEG_INFINITY;

    for (ring_idx, ring) in rings.iter().enumerate() {
        if ring.is_empty() {
            return Err(AdmsError::EmptyGeometry(format!("ring {} has no points", ring_idx)));
        }

        for position in ring {
            let (x, y) = match position.as_slice() {
                [x, y, ..] if x.is_finite() && y.is_finite() => (*x, *y),
                _ => {
                    return Err(AdmsError::InvalidGeometry(format!(
                        "ring {} has malformed position {:?}",
                        ring_idx, position
                    )))
                }
            };

            xmin = xmin.min(x);
            ymin = ymin.min(y);
            xmax = xmax.max(x);
            ymax = ymax.max(y);
        }
    }

    Ok(Extent {
        xmin,
        ymin,
        xmax,
        ymax,
        spatial_reference: SpatialReference::wgs84(),
    })
}
