//! Reverse geocoding

use adms_core::{Locality, Point};
use serde_json::Value;
use tracing::debug;

use crate::error::{ArcGisError, Result};
use crate::rest::RestClient;

const NO_ADDRESS_DETAIL: &str = "Unable to find address";

/// Reverse geocode `point` (x = longitude, y = latitude).
///
/// A point with no nearby address yields an empty [`Locality`], not an error.
/// `token` is only sent when given; geocoders outside the portal reject it.
pub async fn reverse_geocode(
    rest: &RestClient,
    geocode_url: &str,
    token: Option<&str>,
    point: Point,
) -> Result<Locality> {
    let url = format!("{}/reverseGeocode", geocode_url.trim_end_matches('/'));
    let mut params = vec![
        ("location", format!("{},{}", point.x, point.y)),
        ("outSR", "4326".to_string()),
        ("f", "json".to_string()),
    ];
    if let Some(token) = token {
        params.push(("token", token.to_string()));
    }

    match rest.get(&url, &params).await {
        Ok(body) => Ok(locality_from_response(&body)),
        Err(e) if is_no_address(&e) => {
            debug!(x = point.x, y = point.y, "No address found for location");
            Ok(Locality::default())
        }
        Err(e) => Err(e),
    }
}

/// Map the `address` block of a reverseGeocode response.
pub fn locality_from_response(body: &Value) -> Locality {
    let address = match body.get("address") {
        Some(a) => a,
        None => return Locality::default(),
    };

    let text = |key: &str| {
        address
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Locality {
        city: text("City"),
        county: text("Subregion"),
        state: text("Region"),
        district: text("District"),
        address: text("Match_addr"),
        postal: text("Postal"),
    }
}

fn is_no_address(err: &ArcGisError) -> bool {
    match err {
        ArcGisError::Api { message, details, .. } => {
            message.contains(NO_ADDRESS_DETAIL) || details.iter().any(|d| d.contains(NO_ADDRESS_DETAIL))
        }
        _ => false,
    }
}
