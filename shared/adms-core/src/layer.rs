//! Tickets layer definition
//!
//! The field set is fixed configuration shared by service creation (the
//! layer schema) and the record mapper (attribute lengths and date fields).

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::geometry::Extent;

pub const TICKETS_LAYER_NAME: &str = "tickets";
pub const OBJECT_ID_FIELD: &str = "OBJECTID";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    #[serde(rename = "esriFieldTypeOID")]
    ObjectId,
    #[serde(rename = "esriFieldTypeString")]
    String,
    #[serde(rename = "esriFieldTypeDate")]
    Date,
    #[serde(rename = "esriFieldTypeDouble")]
    Double,
    #[serde(rename = "esriFieldTypeSmallInteger")]
    SmallInteger,
}

/// One column of the tickets layer
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub alias: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    pub nullable: bool,
    pub editable: bool,
}

const fn oid(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::ObjectId,
        alias: name,
        length: None,
        nullable: false,
        editable: false,
    }
}

const fn text(name: &'static str, alias: &'static str, length: usize) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::String,
        alias,
        length: Some(length),
        nullable: true,
        editable: true,
    }
}

const fn typed(name: &'static str, alias: &'static str, field_type: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        field_type,
        alias,
        length: None,
        nullable: true,
        editable: true,
    }
}

pub const TICKET_FIELDS: &[FieldSpec] = &[
    oid(OBJECT_ID_FIELD),
    text("TicketNum", "Ticket Number", 32),
    typed("LoadDateTime", "Load Date", FieldType::Date),
    text("LoadMonitor", "Load Monitor", 50),
    text("LoadSiteDesc", "LoadSiteDesc", 256),
    text("RoadwayId", "RoadwayId", 31),
    typed("Lat", "Latitude", FieldType::Double),
    typed("Lng", "Longitude", FieldType::Double),
    text("City", "City", 256),
    text("County", "County", 256),
    text("State", "State", 24),
    text("District", "District", 10),
    text("PassClass", "PassClass", 512),
    text("DisposalSite", "DisposalSite", 256),
    text("DisposalMonitor", "DisposalMonitor", 50),
    typed("MaxCapacityL", "Load Max Capacity", FieldType::Double),
    typed("DisposalDateTime", "Disposal Date", FieldType::Date),
    typed("MaxCapacityD", "Disposal Max Capacity", FieldType::Double),
    typed("LoadCall", "Load Call", FieldType::SmallInteger),
    typed("HaulVol", "Haul Volume", FieldType::Double),
    typed("HaulAmt", "Haul Amount", FieldType::Double),
    text("Contractor", "Contractor", 24),
    text("Truck", "Truck Plate", 8),
    text("Sub", "Sub", 256),
    text("Driver", "Driver", 50),
    text("Mission", "Mission", 24),
    text("PayItem", "Pay Item", 255),
    text("Notes", "Notes", 2047),
    text("Invoice", "Invoice", 256),
];

/// Look up a field by attribute key; stored attributes come back lower-cased.
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    TICKET_FIELDS.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

/// Truncate a string attribute to its declared length on a char boundary.
pub fn fit_to_field(name: &str, value: String) -> String {
    match field(name).and_then(|f| f.length) {
        Some(max) if value.chars().count() > max => value.chars().take(max).collect(),
        _ => value,
    }
}

/// A value for an `esriFieldTypeSmallInteger` field; out-of-range values are
/// dropped so they don't fail the whole edit.
pub fn fit_small_integer(name: &str, value: i64) -> Option<i64> {
    if i16::try_from(value).is_ok() {
        Some(value)
    } else {
        warn!(field = %name, value, "Value out of small integer range; stored as null");
        None
    }
}

/// Layer definition submitted through `addToDefinition`
pub fn tickets_layer_definition(extent: &Extent) -> Value {
    json!({
        "type": "Feature Layer",
        "name": TICKETS_LAYER_NAME,
        "description": "App worker automatically created point layer",
        "geometryType": "esriGeometryPoint",
        "extent": extent,
        "objectIdField": OBJECT_ID_FIELD,
        "fields": TICKET_FIELDS,
        "geometryField": {
            "name": "SHAPE",
            "type": "esriFieldTypeGeometry",
            "alias": "SHAPE",
            "domain": null,
            "editable": true,
            "nullable": true,
            "defaultValue": null,
            "modelName": "SHAPE"
        },
        "uniqueIdField": {
            "isSystemMaintained": true,
            "name": OBJECT_ID_FIELD
        },
        "dateFieldsTimeReference": {
            "timeZone": "UTC",
            "respectsDaylightSaving": false
        },
        "hasAttachments": false
    })
}
