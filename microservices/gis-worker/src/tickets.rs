//! Ticket features in a mission's `tickets` layer

use adms_arcgis_sdk::{
    find_item_by_title, sql_literal, EditBatch, EditResults, Feature, FeatureQuery, PortalItem,
    PortalSession,
};
use adms_core::layer::{field, fit_small_integer, fit_to_field, FieldType};
use adms_core::naming::mission_service_name;
use adms_core::ticket::ticket_coordinates;
use adms_core::timestamp::iso8601_to_epoch_ms;
use adms_core::{map_ticket, Coordinates, Locality, TicketMessage, TicketUpdateMessage};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::error::{required, Result, WorkerError};
use crate::{Outcome, WorkerContext};

/// The tickets layer is the only layer of a mission service
const TICKETS_LAYER_ID: u32 = 0;
const TICKET_NUM_KEY: &str = "ticketnum";

/// Add a ticket, or update it in place when its number is already stored.
#[instrument(skip_all, fields(mission = ?msg.mission_name, ticket = ?msg.ticket_num))]
pub async fn add_ticket(ctx: &WorkerContext, msg: &TicketMessage) -> Result<Outcome> {
    let mission_name = required(msg.mission_name.as_deref(), "missionName")?;
    let service_name = mission_service_name(mission_name, &ctx.env);

    let session = ctx.portal.connect().await?;
    let item = match find_item_by_title(session.as_ref(), &service_name).await? {
        Some(item) => item,
        None => return Ok(mission_missing(&service_name)),
    };
    let layer_url = tickets_layer_url(&item)?;

    let coords = ticket_coordinates(msg);
    let locality = session.reverse_geocode(coords.to_point()).await?;
    let ticket = map_ticket(msg, coords, &locality);

    let mut record = Feature {
        attributes: ticket.attributes.to_map(),
        geometry: Some(serde_json::to_value(ticket.geometry)?),
    };

    let existing = match ticket.attributes.ticketnum.as_deref() {
        Some(num) => find_ticket(session.as_ref(), &layer_url, num).await?,
        None => {
            warn!("Ticket has no ticket number; it cannot be deduplicated");
            None
        }
    };

    let (batch, action) = match existing.as_ref().and_then(object_id_entry) {
        Some((key, oid)) => {
            record.attributes.insert(key, Value::from(oid));
            (EditBatch::update(record), "updated")
        }
        None => (EditBatch::add(record), "added"),
    };

    let results = session.apply_edits(&layer_url, &batch).await?;
    check_edit_results(&results)?;

    let ticket_num = ticket.attributes.ticketnum.as_deref().unwrap_or("<none>");
    info!(ticket = %ticket_num, service = %service_name, action, "Ticket stored in feature layer");
    Ok(Outcome::Completed(format!("ticket {} {}", ticket_num, action)))
}

/// Relocate and/or edit attributes of a stored ticket.
#[instrument(skip_all, fields(mission = ?msg.mission_name, ticket = ?msg.ticket_num))]
pub async fn update_ticket(ctx: &WorkerContext, msg: &TicketUpdateMessage) -> Result<Outcome> {
    let mission_name = required(msg.mission_name.as_deref(), "missionName")?;
    let ticket_num = required(msg.ticket_num.as_deref(), "ticketNum")?;
    let service_name = mission_service_name(mission_name, &ctx.env);

    let session = ctx.portal.connect().await?;
    let item = match find_item_by_title(session.as_ref(), &service_name).await? {
        Some(item) => item,
        None => return Ok(mission_missing(&service_name)),
    };
    let layer_url = tickets_layer_url(&item)?;

    let existing = match find_ticket(session.as_ref(), &layer_url, ticket_num).await? {
        Some(feature) => feature,
        None => {
            warn!(ticket = %ticket_num, service = %service_name, "Ticket not found in feature layer");
            return Ok(Outcome::Skipped(format!("ticket {} not found", ticket_num)));
        }
    };
    let (oid_key, oid) = object_id_entry(&existing).ok_or_else(|| {
        WorkerError::EditRejected(format!("ticket {} has no object id", ticket_num))
    })?;

    let mut changes = Map::new();
    let mut geometry = None;

    match (msg.lng, msg.lat) {
        (Some(lng), Some(lat)) => {
            let coords = Coordinates::new(lat, lng);
            let locality = session.reverse_geocode(coords.to_point()).await?;
            changes.extend(relocation_attributes(coords, &locality));
            geometry = Some(serde_json::to_value(coords.to_point())?);
        }
        (None, None) => {}
        _ => warn!(ticket = %ticket_num, "Both lng and lat are needed to relocate; location unchanged"),
    }

    for (name, value) in &msg.attributes {
        changes.insert(name.clone(), coerce_attribute(name, value.clone()));
    }

    let mut attributes = Map::new();
    attributes.insert(oid_key, Value::from(oid));
    for (name, value) in changes {
        match existing.attribute_key(&name) {
            Some(key) => {
                attributes.insert(key.to_string(), value);
            }
            None => warn!(attribute = %name, "Attribute does not exist on the ticket; skipped"),
        }
    }

    if attributes.len() == 1 && geometry.is_none() {
        warn!(ticket = %ticket_num, "Nothing to update");
        return Ok(Outcome::Skipped(format!("nothing to update on ticket {}", ticket_num)));
    }

    let update = Feature { attributes, geometry };
    let results = session.apply_edits(&layer_url, &EditBatch::update(update)).await?;
    check_edit_results(&results)?;

    info!(ticket = %ticket_num, service = %service_name, "Ticket updated in feature layer");
    Ok(Outcome::Completed(format!("ticket {} updated", ticket_num)))
}

fn mission_missing(service_name: &str) -> Outcome {
    warn!(service = %service_name, "Mission feature service does not exist in this portal");
    Outcome::Skipped(format!("feature service {} not found", service_name))
}

fn tickets_layer_url(item: &PortalItem) -> Result<String> {
    item.layer_url(TICKETS_LAYER_ID).ok_or_else(|| {
        WorkerError::EditRejected(format!("portal item {} has no service url", item.id))
    })
}

/// Stored feature whose ticket number equals `ticket_num` exactly.
async fn find_ticket(
    session: &dyn PortalSession,
    layer_url: &str,
    ticket_num: &str,
) -> Result<Option<Feature>> {
    let query = FeatureQuery::new(format!("{} = {}", TICKET_NUM_KEY, sql_literal(ticket_num)));
    let set = session.query_features(layer_url, &query).await?;

    Ok(set.features.into_iter().find(|f| {
        f.attribute(TICKET_NUM_KEY).and_then(Value::as_str) == Some(ticket_num)
    }))
}

/// Object id attribute as the layer spells it
fn object_id_entry(feature: &Feature) -> Option<(String, i64)> {
    let key = feature
        .attribute_key("objectid")
        .or_else(|| feature.attribute_key("fid"))?;
    let oid = feature.object_id()?;
    Some((key.to_string(), oid))
}

fn check_edit_results(results: &EditResults) -> Result<()> {
    if results.add_results.is_empty() && results.update_results.is_empty() {
        return Err(WorkerError::EditRejected(
            "applyEdits returned no results".to_string(),
        ));
    }
    match results.first_failure() {
        Some(failure) => {
            let reason = failure
                .error
                .as_ref()
                .map(|e| format!("{} ({})", e.description, e.code))
                .unwrap_or_else(|| "unknown error".to_string());
            Err(WorkerError::EditRejected(reason))
        }
        None => Ok(()),
    }
}

/// Attribute changes that follow a new location
fn relocation_attributes(coords: Coordinates, locality: &Locality) -> Map<String, Value> {
    let text = |name: &str, value: &Option<String>| {
        value
            .clone()
            .map(|v| Value::String(fit_to_field(name, v)))
            .unwrap_or(Value::Null)
    };

    let mut attrs = Map::new();
    attrs.insert("lng".to_string(), Value::from(coords.lng));
    attrs.insert("lat".to_string(), Value::from(coords.lat));
    attrs.insert("city".to_string(), text("city", &locality.city));
    attrs.insert("county".to_string(), text("county", &locality.county));
    attrs.insert("state".to_string(), text("state", &locality.state));
    attrs.insert("address".to_string(), text("address", &locality.address));
    attrs.insert("postal".to_string(), text("postal", &locality.postal));
    attrs
}

/// Dates given as text become epoch ms; text is cut to the field length and
/// small integers outside their range become null.
fn coerce_attribute(name: &str, value: Value) -> Value {
    let spec = match field(name) {
        Some(spec) => spec,
        None => return value,
    };
    match (spec.field_type, value) {
        (FieldType::Date, Value::String(text)) => iso8601_to_epoch_ms(Some(&text))
            .map(Value::from)
            .unwrap_or(Value::Null),
        (FieldType::String, Value::String(text)) => Value::String(fit_to_field(name, text)),
        (FieldType::SmallInteger, Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .and_then(|f| fit_small_integer(name, f.trunc() as i64))
            .map(Value::from)
            .unwrap_or(Value::Null),
        (_, other) => other,
    }
}
