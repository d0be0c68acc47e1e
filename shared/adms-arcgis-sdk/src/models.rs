//! Wire types for the sharing and feature service APIs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A portal content item as returned by `search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

impl PortalItem {
    pub fn is_feature_service(&self) -> bool {
        self.item_type == "Feature Service"
    }

    /// REST endpoint of a layer in this item's service
    pub fn layer_url(&self, layer_id: u32) -> Option<String> {
        self.url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| format!("{}/{}", url.trim_end_matches('/'), layer_id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub title: String,
}

/// Parameters for an empty hosted feature service
#[derive(Debug, Clone)]
pub struct CreateServiceParams {
    pub name: String,
    pub has_static_data: bool,
    pub max_record_count: u32,
    pub capabilities: String,
    pub wkid: u32,
    pub tags: Vec<String>,
    pub snippet: String,
    pub share_with_org: bool,
}

impl CreateServiceParams {
    /// `createParameters` payload
    pub fn create_parameters(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "serviceDescription": "",
            "hasStaticData": self.has_static_data,
            "maxRecordCount": self.max_record_count,
            "supportedQueryFormats": "JSON",
            "capabilities": self.capabilities,
            "spatialReference": { "wkid": self.wkid },
            "allowGeometryUpdates": true,
            "units": "esriDecimalDegrees",
            "xssPreventionInfo": {
                "xssPreventionEnabled": true,
                "xssPreventionRule": "InputOnly",
                "xssInputRule": "rejectInvalid"
            }
        })
    }
}

/// Result of `createService`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedService {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "serviceurl")]
    pub service_url: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Feature layer `query` parameters
#[derive(Debug, Clone)]
pub struct FeatureQuery {
    pub where_clause: String,
    pub out_fields: String,
    pub return_geometry: bool,
    pub out_sr: Option<u32>,
}

impl FeatureQuery {
    pub fn new(where_clause: impl Into<String>) -> Self {
        Self {
            where_clause: where_clause.into(),
            out_fields: "*".to_string(),
            return_geometry: true,
            out_sr: None,
        }
    }

    pub fn with_out_fields(mut self, fields: &str) -> Self {
        self.out_fields = fields.to_string();
        self
    }

    pub fn with_out_sr(mut self, wkid: u32) -> Self {
        self.out_sr = Some(wkid);
        self
    }

    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("where", self.where_clause.clone()),
            ("outFields", self.out_fields.clone()),
            ("returnGeometry", self.return_geometry.to_string()),
            ("f", "json".to_string()),
        ];
        if let Some(wkid) = self.out_sr {
            params.push(("outSR", wkid.to_string()));
        }
        params
    }
}

/// A stored or to-be-stored feature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
}

impl Feature {
    /// Attribute lookup ignoring case; hosted layers lower-case field names.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attribute_key(name).and_then(|key| self.attributes.get(key))
    }

    /// Stored spelling of an attribute name
    pub fn attribute_key(&self, name: &str) -> Option<&str> {
        self.attributes
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Object id, whatever the id field is called
    pub fn object_id(&self) -> Option<i64> {
        self.attribute("objectid")
            .or_else(|| self.attribute("fid"))
            .and_then(Value::as_i64)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureSet {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// Adds and updates submitted in one `applyEdits` call
#[derive(Debug, Clone, Default)]
pub struct EditBatch {
    pub adds: Vec<Feature>,
    pub updates: Vec<Feature>,
}

impl EditBatch {
    pub fn add(feature: Feature) -> Self {
        Self {
            adds: vec![feature],
            updates: Vec::new(),
        }
    }

    pub fn update(feature: Feature) -> Self {
        Self {
            adds: Vec::new(),
            updates: vec![feature],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EditError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EditResult {
    #[serde(rename = "objectId", default)]
    pub object_id: Option<i64>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<EditError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditResults {
    #[serde(rename = "addResults", default)]
    pub add_results: Vec<EditResult>,
    #[serde(rename = "updateResults", default)]
    pub update_results: Vec<EditResult>,
}

impl EditResults {
    /// First failed edit, if any
    pub fn first_failure(&self) -> Option<&EditResult> {
        self.add_results
            .iter()
            .chain(self.update_results.iter())
            .find(|r| !r.success)
    }
}

/// Admin endpoint for a hosted service URL
pub fn admin_service_url(service_url: &str) -> String {
    service_url
        .trim_end_matches('/')
        .replacen("/rest/services/", "/rest/admin/services/", 1)
}

/// Quote a value for a layer `where` clause
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
