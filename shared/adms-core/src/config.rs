//! Portal configuration loaded from the process environment

use crate::error::{AdmsError, Result};
use crate::naming::HostingEnv;
use std::env;
use std::fmt;

/// Public ESRI layer with generalized U.S. state boundaries
pub const DEFAULT_STATE_LAYER_URL: &str = "https://services.arcgis.com/P3ePLMYs2RVChkJx/arcgis/rest/services/USA_States_Generalized_Boundaries/FeatureServer/0";

/// ArcGIS World geocoding service, used when the portal has no geocoder
pub const DEFAULT_GEOCODE_URL: &str =
    "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer";

#[derive(Clone)]
pub struct PortalConfig {
    pub portal_url: String,
    pub username: String,
    pub password: String,
    pub env_sig: HostingEnv,
    pub state_layer_url: String,
    /// Explicit geocoder; when unset the portal's geocode helper service is used
    pub geocode_url: Option<String>,
    pub token_expiration_minutes: u32,
    pub http_timeout_secs: u64,
    pub retry_max_attempts: u32,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| -> Result<String> {
            optional(key).ok_or_else(|| AdmsError::Config(format!("{} is not set", key)))
        };

        Ok(Self {
            portal_url: required("ARCGIS_PORTAL_URL")?.trim_end_matches('/').to_string(),
            username: required("ARCGIS_PORTAL_SA_USR")?,
            password: required("ARCGIS_PORTAL_SA_PWD")?,
            env_sig: HostingEnv::new(
                optional("ADMS_ENV_SIG")
                    .map(|v| v.trim().to_string())
                    .unwrap_or_else(|| "DEV".to_string()),
            ),
            state_layer_url: lookup("ADMS_STATE_LAYER_URL")
                .unwrap_or_else(|| DEFAULT_STATE_LAYER_URL.to_string()),
            geocode_url: optional("ARCGIS_GEOCODE_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string()),
            token_expiration_minutes: lookup("ARCGIS_TOKEN_EXPIRATION_MINUTES")
                .unwrap_or_else(|| "60".to_string())
                .parse()
                .map_err(|e| {
                    AdmsError::Config(format!("Invalid ARCGIS_TOKEN_EXPIRATION_MINUTES: {}", e))
                })?,
            http_timeout_secs: lookup("ADMS_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|e| AdmsError::Config(format!("Invalid ADMS_HTTP_TIMEOUT_SECS: {}", e)))?,
            retry_max_attempts: lookup("ADMS_RETRY_MAX_ATTEMPTS")
                .unwrap_or_else(|| "3".to_string())
                .parse()
                .map_err(|e| AdmsError::Config(format!("Invalid ADMS_RETRY_MAX_ATTEMPTS: {}", e)))?,
        })
    }
}

impl fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalConfig")
            .field("portal_url", &self.portal_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("env_sig", &self.env_sig)
            .field("state_layer_url", &self.state_layer_url)
            .field("geocode_url", &self.geocode_url)
            .field("token_expiration_minutes", &self.token_expiration_minutes)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = PortalConfig::from_lookup(lookup_from(&[
            ("ARCGIS_PORTAL_URL", "https://gis.example.com/portal/"),
            ("ARCGIS_PORTAL_SA_USR", "svc"),
            ("ARCGIS_PORTAL_SA_PWD", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.portal_url, "https://gis.example.com/portal");
        assert_eq!(config.env_sig.as_str(), "DEV");
        assert_eq!(config.state_layer_url, DEFAULT_STATE_LAYER_URL);
        assert_eq!(config.geocode_url, None);
        assert_eq!(config.token_expiration_minutes, 60);
        assert_eq!(config.retry_max_attempts, 3);
    }

    #[test]
    fn test_blank_and_padded_values() {
        let config = PortalConfig::from_lookup(lookup_from(&[
            ("ARCGIS_PORTAL_URL", "https://gis.example.com/portal"),
            ("ARCGIS_PORTAL_SA_USR", "svc"),
            ("ARCGIS_PORTAL_SA_PWD", "secret"),
            ("ADMS_ENV_SIG", "  "),
            ("ARCGIS_GEOCODE_URL", "https://gis.example.com/server/rest/services/Geocoder/GeocodeServer/"),
        ]))
        .unwrap();

        assert_eq!(
            config.geocode_url.as_deref(),
            Some("https://gis.example.com/server/rest/services/Geocoder/GeocodeServer")
        );
        assert_eq!(config.env_sig.as_str(), "DEV");
        assert_eq!(config.env_sig.portal_folder(), "ADMS-DEV");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = PortalConfig::from_lookup(lookup_from(&[(
            "ARCGIS_PORTAL_URL",
            "https://gis.example.com/portal",
        )]))
        .unwrap_err();

        assert!(matches!(err, AdmsError::Config(msg) if msg.contains("ARCGIS_PORTAL_SA_USR")));
    }

    #[test]
    fn test_password_redacted() {
        let config = PortalConfig::from_lookup(lookup_from(&[
            ("ARCGIS_PORTAL_URL", "https://gis.example.com/portal"),
            ("ARCGIS_PORTAL_SA_USR", "svc"),
            ("ARCGIS_PORTAL_SA_PWD", "hunter2"),
        ]))
        .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
