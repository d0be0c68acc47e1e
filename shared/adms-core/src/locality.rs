//! Locality fields resolved by reverse geocoding

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub postal: Option<String>,
}

impl Locality {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
