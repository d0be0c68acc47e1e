//! Local ArcGIS stand-in served by axum
//!
//! Answers the sharing, admin, feature layer and geocode endpoints with
//! canned bodies and records every request. Tests can queue a reply for a
//! path suffix that is served once ahead of the canned one.

#![allow(dead_code)]

use adms_arcgis_sdk::{RestClient, RetryPolicy};
use adms_core::{HostingEnv, PortalConfig};
use axum::extract::{Form, State};
use axum::http::{Method, StatusCode, Uri};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const TOKEN: &str = "tok-1";
pub const USERNAME: &str = "svc_adms";

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
}

impl Call {
    /// Last path segment; `self` keeps its parent to tell the two apart.
    pub fn operation(&self) -> String {
        let mut segments = self.path.rsplit('/');
        let last = segments.next().unwrap_or_default();
        match (last, segments.next()) {
            ("self", Some(parent)) => format!("{}/self", parent),
            _ => last.to_string(),
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[derive(Default)]
struct StubState {
    base: String,
    calls: Vec<Call>,
    queued: Vec<(String, StatusCode, Value)>,
}

#[derive(Clone, Default)]
pub struct StubPortal {
    state: Arc<Mutex<StubState>>,
}

impl StubPortal {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let stub = Self::default();
        stub.state.lock().base = format!("http://{}", listener.local_addr().unwrap());

        let app = Router::new().fallback(answer).with_state(stub.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        stub
    }

    pub fn base(&self) -> String {
        self.state.lock().base.clone()
    }

    pub fn portal_url(&self) -> String {
        format!("{}/portal", self.base())
    }

    pub fn service_url(&self, name: &str) -> String {
        format!("{}/server/rest/services/Hosted/{}/FeatureServer", self.base(), name)
    }

    pub fn geocode_url(&self) -> String {
        format!("{}/server/rest/services/Geocoder/GeocodeServer", self.base())
    }

    pub fn config(&self) -> PortalConfig {
        PortalConfig {
            portal_url: self.portal_url(),
            username: USERNAME.to_string(),
            password: "secret".to_string(),
            env_sig: HostingEnv::new("DEV"),
            state_layer_url: format!("{}/states/FeatureServer/0", self.base()),
            geocode_url: None,
            token_expiration_minutes: 60,
            http_timeout_secs: 5,
            retry_max_attempts: 3,
        }
    }

    /// Reply once with `body` to the next request whose path ends with `suffix`.
    pub fn queue(&self, suffix: &str, status: StatusCode, body: Value) {
        self.state.lock().queued.push((suffix.to_string(), status, body));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls().iter().map(Call::operation).collect()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation() == operation)
            .collect()
    }
}

/// Transport with millisecond backoff
pub fn fast_rest() -> RestClient {
    let retry = RetryPolicy {
        initial_interval: Duration::from_millis(5),
        maximum_interval: Duration::from_millis(20),
        ..Default::default()
    };
    RestClient::new(Duration::from_secs(5), retry).unwrap()
}

async fn answer(
    State(stub): State<StubPortal>,
    method: Method,
    uri: Uri,
    Form(params): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    let mut state = stub.state.lock();
    state.calls.push(Call {
        method,
        path: path.clone(),
        params: params.clone(),
    });

    if let Some(idx) = state.queued.iter().position(|(suffix, _, _)| path.ends_with(suffix)) {
        let (_, status, body) = state.queued.remove(idx);
        return (status, Json(body));
    }

    let base = state.base.clone();
    canned(&base, &path, &params)
}

fn canned(base: &str, path: &str, params: &HashMap<String, String>) -> (StatusCode, Json<Value>) {
    let user_content = format!("/content/users/{}", USERNAME);

    let body = if path.ends_with("/generateToken") {
        json!({ "token": TOKEN, "expires": 1_727_428_484_000i64, "ssl": false })
    } else if path.ends_with("/community/self") {
        json!({ "username": USERNAME, "fullName": "ADMS Service" })
    } else if path.ends_with("/portals/self") {
        json!({
            "name": "ADMS",
            "helperServices": {
                "geocode": [{
                    "url": format!("{}/server/rest/services/Geocoder/GeocodeServer", base),
                    "batch": true
                }]
            }
        })
    } else if path.ends_with("/sharing/rest/search") {
        json!({ "total": 0, "results": [] })
    } else if path.ends_with(&user_content) {
        json!({ "username": USERNAME, "folders": [], "items": [] })
    } else if path.ends_with("/createFolder") {
        let title = params.get("title").cloned().unwrap_or_default();
        json!({ "success": true, "folder": { "id": "f1", "title": title, "username": USERNAME } })
    } else if path.ends_with("/createService") {
        let create: Value = params
            .get("createParameters")
            .and_then(|p| serde_json::from_str(p).ok())
            .unwrap_or_default();
        let name = create["name"].as_str().unwrap_or_default();
        json!({
            "success": true,
            "itemId": "abc",
            "name": name,
            "serviceurl": format!("{}/server/rest/services/Hosted/{}/FeatureServer", base, name)
        })
    } else if path.ends_with("/update") {
        json!({ "success": true, "id": "abc" })
    } else if path.ends_with("/share") {
        json!({ "notSharedWith": [], "itemId": "abc" })
    } else if path.ends_with("/addToDefinition") || path.ends_with("/updateDefinition") {
        json!({ "success": true })
    } else if path.ends_with("/query") {
        json!({ "objectIdFieldName": "objectid", "features": [] })
    } else if path.ends_with("/applyEdits") {
        json!({ "addResults": [{ "objectId": 1, "success": true }], "updateResults": [] })
    } else if path.ends_with("/reverseGeocode") {
        json!({
            "address": {
                "Match_addr": "1000 Front St, Morgan City, Louisiana, 70380",
                "City": "Morgan City",
                "Subregion": "St. Mary Parish",
                "Region": "Louisiana",
                "Postal": "70380"
            },
            "location": { "x": -91.17472132, "y": 29.75911431 }
        })
    } else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "code": 404, "message": "not found" } })),
        );
    };
    (StatusCode::OK, Json(body))
}
