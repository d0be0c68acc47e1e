//! Mission feature services
//!
//! A mission gets one hosted feature service, named after the mission and
//! suffixed with the hosting environment, holding a single `tickets` point
//! layer whose extent covers the mission's state.

use adms_arcgis_sdk::{
    find_item_by_title, find_or_create_folder, BoundaryLayer, CreateServiceParams, PortalItem,
};
use adms_core::geometry::{reduce_extent, WGS84_WKID};
use adms_core::layer::tickets_layer_definition;
use adms_core::naming::mission_service_name;
use adms_core::{Extent, HostingEnv, MissionEditMessage, MissionMessage};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::error::{required, Result, WorkerError};
use crate::{Outcome, WorkerContext};

const MAX_RECORD_COUNT: u32 = 1000;
const SERVICE_CAPABILITIES: &str = "Create,Editing,Uploads,Query,Update,Delete,Sync";
const SERVICE_SNIPPET: &str = "App worker automatically generated feature service";

/// Service creation parameters for a mission in `folder`
pub fn mission_service_params(service_name: &str, folder: &str) -> CreateServiceParams {
    CreateServiceParams {
        name: service_name.to_string(),
        has_static_data: false,
        max_record_count: MAX_RECORD_COUNT,
        capabilities: SERVICE_CAPABILITIES.to_string(),
        wkid: WGS84_WKID,
        tags: vec![folder.to_string(), "feature".to_string()],
        snippet: SERVICE_SNIPPET.to_string(),
        share_with_org: true,
    }
}

/// Create the mission's feature service unless one with its name exists.
#[instrument(skip_all, fields(mission = ?msg.mission_name))]
pub async fn create_mission(ctx: &WorkerContext, msg: &MissionMessage) -> Result<Outcome> {
    let mission_name = required(msg.mission_name.as_deref(), "missionName")?;
    let env = msg
        .env
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(HostingEnv::new)
        .unwrap_or_else(|| ctx.env.clone());
    let service_name = mission_service_name(mission_name, &env);

    let session = ctx.portal.connect().await?;

    if let Some(item) = find_item_by_title(session.as_ref(), &service_name).await? {
        info!(service = %service_name, item_id = %item.id, "Mission feature service already exists");
        return Ok(Outcome::Skipped(format!(
            "feature service {} already exists",
            service_name
        )));
    }

    let extent = state_extent(ctx.boundaries.as_ref(), msg.mission_state.as_deref()).await?;

    let folder_title = env.portal_folder();
    let folder = find_or_create_folder(session.as_ref(), &folder_title).await?;

    let params = mission_service_params(&service_name, &folder_title);
    let created = session.create_feature_service(&folder, &params).await?;

    let definition = json!({ "layers": [tickets_layer_definition(&extent)] });
    if let Err(e) = session
        .add_to_definition(&created.service_url, &definition)
        .await
    {
        error!(
            service = %service_name,
            item_id = %created.item_id,
            error = %e,
            "Tickets layer could not be added; service was left without layers"
        );
        return Err(e.into());
    }

    // Redelivery skips an existing service, so nothing after the layer is
    // attached may fail the message.
    if let Err(e) = session
        .publish_item(&folder, &created.item_id, &params)
        .await
    {
        warn!(
            service = %service_name,
            item_id = %created.item_id,
            error = %e,
            "Tags or sharing could not be applied to the mission service"
        );
    }

    info!(service = %service_name, item_id = %created.item_id, "Created mission feature service");
    Ok(Outcome::Completed(format!(
        "created feature service {}",
        service_name
    )))
}

/// Bounding box of a state, falling back to the continental default.
///
/// A failed boundary query is an error; a missing or degenerate state is not.
pub async fn state_extent(boundaries: &dyn BoundaryLayer, state: Option<&str>) -> Result<Extent> {
    let state = match state.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s,
        None => {
            warn!("Mission has no state; using default extent");
            return Ok(Extent::default_mission());
        }
    };

    let polygon = match boundaries.state_boundary(state).await? {
        Some(p) => p,
        None => {
            warn!(state = %state, "State not found in boundary layer; using default extent");
            return Ok(Extent::default_mission());
        }
    };

    match reduce_extent(&polygon.rings) {
        Ok(extent) => Ok(extent),
        Err(e) => {
            warn!(state = %state, error = %e, "State geometry unusable; using default extent");
            Ok(Extent::default_mission())
        }
    }
}

/// Push service and/or layer definition changes to an existing mission.
#[instrument(skip_all, fields(mission = ?msg.mission_name))]
pub async fn edit_mission(ctx: &WorkerContext, msg: &MissionEditMessage) -> Result<Outcome> {
    let mission_name = required(msg.mission_name.as_deref(), "missionName")?;
    let service_definition = definition_object(msg.service_definition.as_ref(), "serviceDefinition")?;
    let layer_definition = definition_object(msg.layer_definition.as_ref(), "layerDefinition")?;
    if service_definition.is_none() && layer_definition.is_none() {
        return Err(WorkerError::InvalidMessage(
            "serviceDefinition or layerDefinition is required".to_string(),
        ));
    }

    let service_name = mission_service_name(mission_name, &ctx.env);
    let session = ctx.portal.connect().await?;

    let item = match find_item_by_title(session.as_ref(), &service_name).await? {
        Some(item) => item,
        None => {
            warn!(service = %service_name, "Mission feature service does not exist in this portal");
            return Ok(Outcome::Skipped(format!(
                "feature service {} not found",
                service_name
            )));
        }
    };
    let service_url = service_url(&item)?;

    if let Some(definition) = service_definition {
        session
            .update_service_definition(service_url, definition)
            .await?;
        info!(service = %service_name, "Service definition updated");
    }
    if let Some(definition) = layer_definition {
        session
            .update_layer_definition(service_url, msg.layer_id, definition)
            .await?;
        info!(service = %service_name, layer_id = msg.layer_id, "Layer definition updated");
    }

    Ok(Outcome::Completed(format!(
        "updated definition of {}",
        service_name
    )))
}

fn service_url(item: &PortalItem) -> Result<&str> {
    item.url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            WorkerError::EditRejected(format!("portal item {} has no service url", item.id))
        })
}

fn definition_object<'a>(value: Option<&'a Value>, field: &str) -> Result<Option<&'a Value>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) if v.as_object().map_or(false, |m| !m.is_empty()) => Ok(Some(v)),
        Some(_) => Err(WorkerError::InvalidMessage(format!(
            "{} must be a non-empty object",
            field
        ))),
    }
}
