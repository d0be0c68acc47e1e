//! In-memory portal and boundary layer for worker tests

#![allow(dead_code)]

use adms_arcgis_sdk::{
    ArcGisError, BoundaryLayer, CreateServiceParams, CreatedService, EditBatch, EditResult,
    EditResults, Feature, FeatureQuery, FeatureSet, Folder, PortalConnector, PortalItem,
    PortalSession, Result,
};
use adms_core::{HostingEnv, Locality, Point, Polygon};
use async_trait::async_trait;
use gis_worker::WorkerContext;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

pub const SERVICE_ROOT: &str = "https://gis.test/server/rest/services/Hosted";

#[derive(Default)]
pub struct PortalState {
    pub items: Vec<PortalItem>,
    pub folders: Vec<Folder>,
    pub created: Vec<CreateServiceParams>,
    pub definitions: Vec<(String, Value)>,
    pub features: Vec<Feature>,
    pub edits: Vec<EditBatch>,
    pub geocoded: Vec<Point>,
    pub published: Vec<String>,
    /// Calls in order, by portal operation name
    pub calls: Vec<&'static str>,
    pub fail_connect: bool,
    pub fail_publish: bool,
}

#[derive(Clone, Default)]
pub struct FakePortal {
    pub state: Arc<Mutex<PortalState>>,
}

impl FakePortal {
    pub fn with_mission(title: &str) -> Self {
        let portal = Self::default();
        portal.state.lock().items.push(service_item(title));
        portal
    }

    pub fn seed_ticket(&self, object_id: i64, ticket_num: &str) {
        self.state.lock().features.push(Feature {
            attributes: json!({
                "objectid": object_id,
                "ticketnum": ticket_num,
                "lat": 29.75,
                "lng": -91.17,
                "city": "Morgan City",
                "county": "St. Mary Parish",
                "state": "Louisiana",
                "notes": null,
                "disposaldatetime": null
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
            geometry: Some(json!({ "x": -91.17, "y": 29.75 })),
        });
    }
}

pub fn service_item(title: &str) -> PortalItem {
    PortalItem {
        id: format!("item-{}", title),
        title: title.to_string(),
        item_type: "Feature Service".to_string(),
        url: Some(format!("{}/{}/FeatureServer", SERVICE_ROOT, title)),
        owner: Some("svc_adms".to_string()),
    }
}

#[async_trait]
impl PortalConnector for FakePortal {
    async fn connect(&self) -> Result<Box<dyn PortalSession>> {
        if self.state.lock().fail_connect {
            return Err(ArcGisError::Unauthorized("Invalid username or password.".to_string()));
        }
        Ok(Box::new(FakeSession {
            state: self.state.clone(),
        }))
    }
}

struct FakeSession {
    state: Arc<Mutex<PortalState>>,
}

#[async_trait]
impl PortalSession for FakeSession {
    // Portal search is loose; every item is a hit.
    async fn search_items(&self, _query: &str) -> Result<Vec<PortalItem>> {
        Ok(self.state.lock().items.clone())
    }

    async fn find_folder(&self, title: &str) -> Result<Option<Folder>> {
        Ok(self.state.lock().folders.iter().find(|f| f.title == title).cloned())
    }

    async fn create_folder(&self, title: &str) -> Result<Folder> {
        let mut state = self.state.lock();
        let folder = Folder {
            id: format!("folder-{}", state.folders.len() + 1),
            title: title.to_string(),
        };
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn create_feature_service(
        &self,
        _folder: &Folder,
        params: &CreateServiceParams,
    ) -> Result<CreatedService> {
        let mut state = self.state.lock();
        state.calls.push("createService");
        let item = service_item(&params.name);
        let created = CreatedService {
            item_id: item.id.clone(),
            service_url: item.url.clone().unwrap_or_default(),
            name: Some(params.name.clone()),
        };
        state.items.push(item);
        state.created.push(params.clone());
        Ok(created)
    }

    async fn publish_item(
        &self,
        _folder: &Folder,
        item_id: &str,
        _params: &CreateServiceParams,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push("publish");
        if state.fail_publish {
            return Err(ArcGisError::OperationFailed(format!(
                "share {} reported: notSharedWith org",
                item_id
            )));
        }
        state.published.push(item_id.to_string());
        Ok(())
    }

    async fn add_to_definition(&self, service_url: &str, definition: &Value) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push("addToDefinition");
        state
            .definitions
            .push((format!("{}/addToDefinition", service_url), definition.clone()));
        Ok(())
    }

    async fn update_service_definition(&self, service_url: &str, definition: &Value) -> Result<()> {
        self.state
            .lock()
            .definitions
            .push((format!("{}/updateDefinition", service_url), definition.clone()));
        Ok(())
    }

    async fn update_layer_definition(
        &self,
        service_url: &str,
        layer_id: u32,
        definition: &Value,
    ) -> Result<()> {
        self.state.lock().definitions.push((
            format!("{}/{}/updateDefinition", service_url, layer_id),
            definition.clone(),
        ));
        Ok(())
    }

    // Token matching like the real layer would over-report; the worker must filter.
    async fn query_features(&self, _layer_url: &str, _query: &FeatureQuery) -> Result<FeatureSet> {
        Ok(FeatureSet {
            features: self.state.lock().features.clone(),
        })
    }

    async fn apply_edits(&self, _layer_url: &str, edits: &EditBatch) -> Result<EditResults> {
        let mut state = self.state.lock();
        let mut results = EditResults::default();

        for add in &edits.adds {
            let object_id = state.features.len() as i64 + 1;
            let mut stored = add.clone();
            stored.attributes.insert("objectid".to_string(), json!(object_id));
            state.features.push(stored);
            results.add_results.push(EditResult {
                object_id: Some(object_id),
                success: true,
                error: None,
            });
        }

        for update in &edits.updates {
            let object_id = update.object_id();
            let target = state
                .features
                .iter_mut()
                .find(|f| f.object_id().is_some() && f.object_id() == object_id);
            let success = match target {
                Some(feature) => {
                    for (k, v) in &update.attributes {
                        feature.attributes.insert(k.clone(), v.clone());
                    }
                    if update.geometry.is_some() {
                        feature.geometry = update.geometry.clone();
                    }
                    true
                }
                None => false,
            };
            results.update_results.push(EditResult {
                object_id,
                success,
                error: None,
            });
        }

        state.edits.push(edits.clone());
        Ok(results)
    }

    async fn reverse_geocode(&self, point: Point) -> Result<Locality> {
        self.state.lock().geocoded.push(point);
        Ok(Locality {
            city: Some("Morgan City".to_string()),
            county: Some("St. Mary Parish".to_string()),
            state: Some("Louisiana".to_string()),
            district: None,
            address: Some("1000 Front St, Morgan City, Louisiana, 70380".to_string()),
            postal: Some("70380".to_string()),
        })
    }
}

#[derive(Default)]
pub struct FakeBoundaries {
    pub polygon: Option<Polygon>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeBoundaries {
    pub fn with_square() -> Self {
        Self {
            polygon: Some(Polygon {
                rings: vec![vec![
                    vec![-94.0, 29.0],
                    vec![-94.0, 33.0],
                    vec![-89.0, 33.0],
                    vec![-89.0, 29.0],
                ]],
            }),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BoundaryLayer for FakeBoundaries {
    async fn state_boundary(&self, state: &str) -> Result<Option<Polygon>> {
        self.calls.lock().push(state.to_string());
        Ok(self.polygon.clone())
    }
}

pub fn context(portal: &FakePortal, boundaries: Arc<FakeBoundaries>) -> WorkerContext {
    WorkerContext::new(Arc::new(portal.clone()), boundaries, HostingEnv::new("DEV"))
}

pub fn ticket_message(ticket_num: &str) -> Value {
    json!({
        "missionName": "St-Mary-2024",
        "ticketNum": ticket_num,
        "contractorName": "Acme Debris",
        "haulVol": 22.5,
        "load": {
            "loadDTBegin": "2024-09-27T08:14:44Z",
            "beginningGps": "29.75911431,-91.17472132",
            "maxCapacity": 40
        },
        "disposal": {
            "disposalSiteName": "Bayou Landfill",
            "maxCapacity": 35
        }
    })
}
