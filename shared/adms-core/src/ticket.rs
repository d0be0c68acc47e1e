//! Ticket record mapper
//!
//! Flattens a [`TicketMessage`] plus its geocoded [`Locality`] into the
//! attribute record stored in the tickets layer. Mapping never fails: an
//! absent source field becomes a `null` attribute.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::geometry::{parse_gps_or_origin, Coordinates, Point};
use crate::layer::{fit_small_integer, fit_to_field};
use crate::locality::Locality;
use crate::message::TicketMessage;
use crate::timestamp::iso8601_to_epoch_ms;

/// Flat attribute record; keys are the layer's lower-case field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketAttributes {
    pub ticketnum: Option<String>,
    pub loaddatetime: Option<i64>,
    pub loadmonitor: Option<String>,
    pub loadsitedesc: Option<String>,
    pub roadwayid: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub passclass: Option<String>,
    pub disposalsite: Option<String>,
    pub disposalmonitor: Option<String>,
    pub maxcapacityl: Option<f64>,
    pub disposaldatetime: Option<i64>,
    pub maxcapacityd: Option<f64>,
    pub loadcall: Option<i64>,
    pub haulvol: Option<f64>,
    pub haulamt: Option<f64>,
    pub contractor: Option<String>,
    pub truck: Option<String>,
    pub sub: Option<String>,
    pub driver: Option<String>,
    pub mission: Option<String>,
    pub payitem: Option<String>,
    pub notes: Option<String>,
    pub invoice: Option<String>,
}

/// Attribute record plus point geometry, ready for `applyEdits`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketFeature {
    pub attributes: TicketAttributes,
    pub geometry: Point,
}

impl TicketAttributes {
    /// Attributes as a JSON object, `null` for every absent value.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Coordinates of the ticket's load point, origin when missing or malformed.
pub fn ticket_coordinates(msg: &TicketMessage) -> Coordinates {
    parse_gps_or_origin(msg.load.as_ref().and_then(|l| l.beginning_gps.as_deref()))
}

pub fn map_ticket(msg: &TicketMessage, coords: Coordinates, locality: &Locality) -> TicketFeature {
    let load = msg.load.clone().unwrap_or_default();
    let disposal = msg.disposal.clone().unwrap_or_default();

    let fit = |name: &str, value: &Option<String>| -> Option<String> {
        value.clone().map(|v| fit_to_field(name, v))
    };

    let attributes = TicketAttributes {
        ticketnum: fit("ticketnum", &msg.ticket_num),
        loaddatetime: iso8601_to_epoch_ms(load.load_dt_begin.as_deref()),
        loadmonitor: fit("loadmonitor", &load.load_monitor_id),
        loadsitedesc: fit("loadsitedesc", &load.load_site_desc),
        roadwayid: fit("roadwayid", &msg.roadway_id),
        lat: coords.lat,
        lng: coords.lng,
        city: fit("city", &locality.city),
        county: fit("county", &locality.county),
        state: fit("state", &locality.state),
        district: fit("district", &locality.district),
        passclass: fit("passclass", &msg.pass_class),
        disposalsite: fit("disposalsite", &disposal.disposal_site_name),
        disposalmonitor: fit("disposalmonitor", &disposal.disposal_monitor_id),
        maxcapacityl: load.max_capacity,
        disposaldatetime: iso8601_to_epoch_ms(disposal.disposal_dt.as_deref()),
        maxcapacityd: disposal.max_capacity,
        loadcall: msg.load_call.and_then(|v| fit_small_integer("loadcall", v)),
        haulvol: msg.haul_vol,
        haulamt: msg.haul_amt,
        contractor: fit("contractor", &msg.contractor_name),
        truck: fit("truck", &msg.truck_certification_id),
        sub: fit("sub", &msg.sub_contractor_name),
        driver: fit("driver", &msg.driver_name),
        mission: fit("mission", &msg.mission_name),
        payitem: fit("payitem", &msg.pay_item_name),
        notes: fit("notes", &msg.note),
        invoice: fit("invoice", &msg.invoice),
    };

    TicketFeature {
        attributes,
        geometry: coords.to_point(),
    }
}
