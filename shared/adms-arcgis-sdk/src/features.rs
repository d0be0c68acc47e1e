//! Feature layer query and edit calls

use adms_core::geometry::WGS84_WKID;
use adms_core::Polygon;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::BoundaryLayer;
use crate::error::Result;
use crate::models::{sql_literal, EditBatch, EditResults, FeatureQuery, FeatureSet};
use crate::rest::RestClient;

const STATE_NAME_FIELD: &str = "STATE_NAME";

/// Run a layer `query`.
pub async fn query_features(
    rest: &RestClient,
    layer_url: &str,
    token: Option<&str>,
    query: &FeatureQuery,
) -> Result<FeatureSet> {
    let url = format!("{}/query", layer_url.trim_end_matches('/'));
    let mut params = query.to_params();
    if let Some(token) = token {
        params.push(("token", token.to_string()));
    }

    let body = rest.post_form(&url, &params, true).await?;
    let set: FeatureSet = serde_json::from_value(body)?;
    debug!(layer = %layer_url, features = set.features.len(), "Layer query complete");
    Ok(set)
}

/// Submit adds and updates in one `applyEdits` call; never retried.
pub async fn apply_edits(
    rest: &RestClient,
    layer_url: &str,
    token: Option<&str>,
    edits: &EditBatch,
) -> Result<EditResults> {
    let url = format!("{}/applyEdits", layer_url.trim_end_matches('/'));
    let mut params = vec![
        ("rollbackOnFailure", "true".to_string()),
        ("f", "json".to_string()),
    ];
    if !edits.adds.is_empty() {
        params.push(("adds", serde_json::to_string(&edits.adds)?));
    }
    if !edits.updates.is_empty() {
        params.push(("updates", serde_json::to_string(&edits.updates)?));
    }
    if let Some(token) = token {
        params.push(("token", token.to_string()));
    }

    let body = rest.post_form(&url, &params, false).await?;
    Ok(serde_json::from_value(body)?)
}

/// Anonymous public layer, used for state boundaries
#[derive(Clone)]
pub struct PublicFeatureLayer {
    rest: RestClient,
    url: String,
}

impl PublicFeatureLayer {
    pub fn new(rest: RestClient, url: impl Into<String>) -> Self {
        Self {
            rest,
            url: url.into(),
        }
    }
}

#[async_trait]
impl BoundaryLayer for PublicFeatureLayer {
    async fn state_boundary(&self, state: &str) -> Result<Option<Polygon>> {
        let query = FeatureQuery::new(format!("{}={}", STATE_NAME_FIELD, sql_literal(state)))
            .with_out_fields(STATE_NAME_FIELD)
            .with_out_sr(WGS84_WKID);

        let set = query_features(&self.rest, &self.url, None, &query).await?;
        let geometry = match set.features.into_iter().next().and_then(|f| f.geometry) {
            Some(g) => g,
            None => return Ok(None),
        };

        Ok(polygon_from_geometry(geometry, state))
    }
}

fn polygon_from_geometry(geometry: Value, state: &str) -> Option<Polygon> {
    if geometry.get("rings").is_none() {
        warn!(state = %state, "State boundary geometry has no rings");
        return None;
    }
    match serde_json::from_value::<Polygon>(geometry) {
        Ok(polygon) => Some(polygon),
        Err(e) => {
            warn!(state = %state, error = %e, "State boundary geometry is not a polygon");
            None
        }
    }
}
