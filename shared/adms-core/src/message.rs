//! Queue message schemas
//!
//! Every field is optional at the schema level so a sparse message still
//! deserializes; orchestration decides which absences are fatal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;

/// A haul ticket deposited by the upstream ticketing system
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMessage {
    #[serde(default, deserialize_with = "lenient::string")]
    pub mission_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub ticket_num: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub invoice: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub pay_item_name: Option<String>,
    #[serde(rename = "RoadwayId", default, deserialize_with = "lenient::string")]
    pub roadway_id: Option<String>,
    #[serde(rename = "PassClass", default, deserialize_with = "lenient::string")]
    pub pass_class: Option<String>,
    #[serde(rename = "LoadCall", default, deserialize_with = "lenient::integer")]
    pub load_call: Option<i64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub haul_vol: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub haul_amt: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub contractor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub sub_contractor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub driver_name: Option<String>,
    #[serde(
        rename = "truckCertification_ID",
        default,
        deserialize_with = "lenient::string"
    )]
    pub truck_certification_id: Option<String>,
    #[serde(default)]
    pub load: Option<LoadLeg>,
    #[serde(default)]
    pub disposal: Option<DisposalLeg>,
}

/// Pickup side of a haul
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadLeg {
    #[serde(rename = "loadDTBegin", default, deserialize_with = "lenient::string")]
    pub load_dt_begin: Option<String>,
    #[serde(rename = "loadMonitor_ID", default, deserialize_with = "lenient::string")]
    pub load_monitor_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub load_site_desc: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub beginning_gps: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub max_capacity: Option<f64>,
}

/// Drop-off side of a haul
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalLeg {
    #[serde(rename = "disposalDT", default, deserialize_with = "lenient::string")]
    pub disposal_dt: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub disposal_site_name: Option<String>,
    #[serde(
        rename = "disposalMonitor_ID",
        default,
        deserialize_with = "lenient::string"
    )]
    pub disposal_monitor_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub max_capacity: Option<f64>,
}

/// Request to stand up the feature service for a new mission
#[derive(Debug, Clone, Deserialize)]
pub struct MissionMessage {
    #[serde(default, deserialize_with = "lenient::string")]
    pub env: Option<String>,
    #[serde(rename = "missionName", default, deserialize_with = "lenient::string")]
    pub mission_name: Option<String>,
    #[serde(rename = "mission_state", default, deserialize_with = "lenient::string")]
    pub mission_state: Option<String>,
}

/// Relocation and/or attribute edits for a stored ticket
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdateMessage {
    #[serde(default, deserialize_with = "lenient::string")]
    pub mission_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub ticket_num: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub lat: Option<f64>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Definition changes for an existing mission service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionEditMessage {
    #[serde(default, deserialize_with = "lenient::string")]
    pub mission_name: Option<String>,
    #[serde(default)]
    pub service_definition: Option<Value>,
    #[serde(default)]
    pub layer_definition: Option<Value>,
    #[serde(default)]
    pub layer_id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ticket_nested_legs() {
        let msg: TicketMessage = serde_json::from_value(json!({
            "missionName": "St-Mary-2024",
            "ticketNum": 9164240926103102u64,
            "RoadwayId": 9282882,
            "LoadCall": "3",
            "haulVol": "12.5",
            "load": { "beginningGps": "29.75,-91.17", "maxCapacity": 40 },
            "disposal": { "disposalSiteName": "Site A", "maxCapacity": "35.5" }
        }))
        .unwrap();

        assert_eq!(msg.ticket_num.as_deref(), Some("9164240926103102"));
        assert_eq!(msg.roadway_id.as_deref(), Some("9282882"));
        assert_eq!(msg.load_call, Some(3));
        assert_eq!(msg.haul_vol, Some(12.5));
        assert_eq!(msg.load.as_ref().and_then(|l| l.max_capacity), Some(40.0));
        assert_eq!(msg.disposal.as_ref().and_then(|d| d.max_capacity), Some(35.5));
    }

    #[test]
    fn test_sparse_ticket_deserializes() {
        let msg: TicketMessage = serde_json::from_value(json!({})).unwrap();
        assert!(msg.mission_name.is_none());
        assert!(msg.load.is_none());
    }

    #[test]
    fn test_mission_message() {
        let msg: MissionMessage = serde_json::from_value(json!({
            "env": "DEV",
            "missionName": "TEST-1234",
            "mission_state": "Louisiana"
        }))
        .unwrap();

        assert_eq!(msg.mission_state.as_deref(), Some("Louisiana"));
    }

    #[test]
    fn test_mission_edit_defaults_layer_zero() {
        let msg: MissionEditMessage = serde_json::from_value(json!({
            "missionName": "TEST1234",
            "layerDefinition": { "hasAttachments": true }
        }))
        .unwrap();

        assert_eq!(msg.layer_id, 0);
        assert!(msg.service_definition.is_none());
    }
}
