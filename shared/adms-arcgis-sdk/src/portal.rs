//! Portal login and the authenticated session

use adms_core::config::DEFAULT_GEOCODE_URL;
use adms_core::{Locality, Point, PortalConfig};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::api::{PortalConnector, PortalSession};
use crate::error::{ArcGisError, Result};
use crate::features;
use crate::geocode;
use crate::models::{
    admin_service_url, CreateServiceParams, CreatedService, EditBatch, EditResults, FeatureQuery,
    FeatureSet, Folder, PortalItem,
};
use crate::rest::{ensure_success, RestClient};
use crate::retry::RetryPolicy;

const SEARCH_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SelfResponse {
    username: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<PortalItem>,
}

#[derive(Debug, Deserialize)]
struct UserContent {
    #[serde(default)]
    folders: Vec<Folder>,
}

#[derive(Debug, Deserialize)]
struct CreateFolderResponse {
    folder: Folder,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortalSelf {
    #[serde(default)]
    helper_services: HelperServices,
}

#[derive(Debug, Default, Deserialize)]
struct HelperServices {
    #[serde(default)]
    geocode: Vec<HelperService>,
}

#[derive(Debug, Deserialize)]
struct HelperService {
    #[serde(default)]
    url: Option<String>,
}

/// Reverse geocoding endpoint and whether the portal token may be sent to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geocoder {
    pub url: String,
    pub federated: bool,
}

impl Geocoder {
    fn token<'a>(&self, token: &'a str) -> Option<&'a str> {
        self.federated.then_some(token)
    }
}

/// Logs in with the service account from [`PortalConfig`]
#[derive(Clone)]
pub struct ArcGisPortal {
    config: PortalConfig,
    rest: RestClient,
    geocoder: Arc<OnceCell<Geocoder>>,
}

impl ArcGisPortal {
    pub fn new(config: PortalConfig) -> Result<Self> {
        let retry = RetryPolicy::new().with_maximum_attempts(config.retry_max_attempts);
        let rest = RestClient::new(Duration::from_secs(config.http_timeout_secs), retry)?;
        Ok(Self::with_rest_client(config, rest))
    }

    /// Portal over an existing transport
    pub fn with_rest_client(config: PortalConfig, rest: RestClient) -> Self {
        Self {
            config,
            rest,
            geocoder: Arc::new(OnceCell::new()),
        }
    }

    /// Transport shared with anonymous layers
    pub fn rest_client(&self) -> RestClient {
        self.rest.clone()
    }

    fn sharing_url(&self, path: &str) -> String {
        format!("{}/sharing/rest/{}", self.config.portal_url, path)
    }

    async fn generate_token(&self) -> Result<String> {
        let params = [
            ("username", self.config.username.clone()),
            ("password", self.config.password.clone()),
            ("client", "referer".to_string()),
            ("referer", self.config.portal_url.clone()),
            ("expiration", self.config.token_expiration_minutes.to_string()),
            ("f", "json".to_string()),
        ];
        let body = self
            .rest
            .post_form(&self.sharing_url("generateToken"), &params, true)
            .await?;

        let response: TokenResponse = serde_json::from_value(body)
            .map_err(|e| ArcGisError::Unauthorized(format!("No token in response: {}", e)))?;
        Ok(response.token)
    }

    /// Generate a token and resolve the signed-in user.
    #[instrument(skip(self), fields(portal = %self.config.portal_url))]
    pub async fn login(&self) -> Result<ArcGisSession> {
        let token = self.generate_token().await?;

        let body = self
            .rest
            .get(
                &self.sharing_url("community/self"),
                &[("f", "json".to_string()), ("token", token.clone())],
            )
            .await?;
        let me: SelfResponse = serde_json::from_value(body)?;
        info!(username = %me.username, "Logged in to ArcGIS Portal");

        Ok(ArcGisSession {
            rest: self.rest.clone(),
            portal_url: self.config.portal_url.clone(),
            configured_geocoder: self.config.geocode_url.clone(),
            geocoder: self.geocoder.clone(),
            token,
            username: me.username,
        })
    }
}

#[async_trait]
impl PortalConnector for ArcGisPortal {
    async fn connect(&self) -> Result<Box<dyn PortalSession>> {
        Ok(Box::new(self.login().await?))
    }
}

/// Token-bearing session; dropped at the end of each message.
pub struct ArcGisSession {
    rest: RestClient,
    portal_url: String,
    configured_geocoder: Option<String>,
    /// Resolved once per process, shared by every session
    geocoder: Arc<OnceCell<Geocoder>>,
    token: String,
    username: String,
}

impl ArcGisSession {
    /// The geocoder to use: the configured URL, else the portal's geocode
    /// helper service, else the World geocoder.
    pub async fn geocoder(&self) -> Result<&Geocoder> {
        self.geocoder.get_or_try_init(|| self.resolve_geocoder()).await
    }

    async fn resolve_geocoder(&self) -> Result<Geocoder> {
        if let Some(url) = &self.configured_geocoder {
            return Ok(Geocoder {
                url: url.clone(),
                federated: same_host(url, &self.portal_url),
            });
        }

        let body = self
            .rest
            .get(
                &format!("{}/sharing/rest/portals/self", self.portal_url),
                &self.with_token(Vec::new()),
            )
            .await?;
        let portal: PortalSelf = serde_json::from_value(body)?;
        let helper = portal
            .helper_services
            .geocode
            .into_iter()
            .filter_map(|service| service.url)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .find(|url| !url.is_empty());

        let geocoder = match helper {
            Some(url) => Geocoder {
                federated: !is_arcgis_online(&url) || same_host(&url, &self.portal_url),
                url,
            },
            None => {
                warn!("Portal has no geocode helper service; using the World geocoder");
                Geocoder {
                    url: DEFAULT_GEOCODE_URL.to_string(),
                    federated: false,
                }
            }
        };
        info!(url = %geocoder.url, federated = geocoder.federated, "Geocode service resolved");
        Ok(geocoder)
    }

    fn user_content_url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/sharing/rest/content/users/{}", self.portal_url, self.username)
        } else {
            format!(
                "{}/sharing/rest/content/users/{}/{}",
                self.portal_url, self.username, path
            )
        }
    }

    fn with_token(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("f", "json".to_string()));
        params.push(("token", self.token.clone()));
        params
    }

    async fn admin_post(&self, url: &str, key: &'static str, definition: &Value) -> Result<()> {
        let params = self.with_token(vec![(key, definition.to_string())]);
        let body = self.rest.post_form(url, &params, false).await?;
        ensure_success(&body, key)
    }

    async fn describe_item(
        &self,
        folder: &Folder,
        item_id: &str,
        params: &CreateServiceParams,
    ) -> Result<()> {
        let url = self.user_content_url(&format!("{}/items/{}/update", folder.id, item_id));
        let form = self.with_token(vec![
            ("tags", params.tags.join(",")),
            ("snippet", params.snippet.clone()),
        ]);
        let body = self.rest.post_form(&url, &form, true).await?;
        ensure_success(&body, "update item")
    }

    async fn share_with_org(&self, item_id: &str) -> Result<()> {
        let url = self.user_content_url(&format!("items/{}/share", item_id));
        let form = self.with_token(vec![
            ("everyone", "false".to_string()),
            ("org", "true".to_string()),
            ("groups", String::new()),
        ]);
        let body = self.rest.post_form(&url, &form, true).await?;

        let not_shared = body
            .get("notSharedWith")
            .and_then(Value::as_array)
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        if not_shared {
            return Err(ArcGisError::OperationFailed(format!(
                "share {} reported: {}",
                item_id, body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PortalSession for ArcGisSession {
    async fn search_items(&self, query: &str) -> Result<Vec<PortalItem>> {
        let params = self.with_token(vec![
            ("q", query.to_string()),
            ("num", SEARCH_PAGE_SIZE.to_string()),
        ]);
        let body = self
            .rest
            .get(&format!("{}/sharing/rest/search", self.portal_url), &params)
            .await?;
        let response: SearchResponse = serde_json::from_value(body)?;
        Ok(response.results)
    }

    async fn find_folder(&self, title: &str) -> Result<Option<Folder>> {
        let body = self
            .rest
            .get(&self.user_content_url(""), &self.with_token(Vec::new()))
            .await?;
        let content: UserContent = serde_json::from_value(body)?;
        Ok(content.folders.into_iter().find(|f| f.title == title))
    }

    async fn create_folder(&self, title: &str) -> Result<Folder> {
        let params = self.with_token(vec![("title", title.to_string())]);
        let body = self
            .rest
            .post_form(&self.user_content_url("createFolder"), &params, false)
            .await?;
        ensure_success(&body, "createFolder")?;
        let response: CreateFolderResponse = serde_json::from_value(body)?;
        Ok(response.folder)
    }

    #[instrument(skip(self, folder, params), fields(service = %params.name, folder = %folder.title))]
    async fn create_feature_service(
        &self,
        folder: &Folder,
        params: &CreateServiceParams,
    ) -> Result<CreatedService> {
        let form = self.with_token(vec![
            ("createParameters", params.create_parameters().to_string()),
            ("outputType", "featureService".to_string()),
        ]);
        let body = self
            .rest
            .post_form(
                &self.user_content_url(&format!("{}/createService", folder.id)),
                &form,
                false,
            )
            .await?;
        ensure_success(&body, "createService")?;
        let created: CreatedService = serde_json::from_value(body)?;
        info!(item_id = %created.item_id, url = %created.service_url, "Feature service created");
        Ok(created)
    }

    async fn publish_item(
        &self,
        folder: &Folder,
        item_id: &str,
        params: &CreateServiceParams,
    ) -> Result<()> {
        self.describe_item(folder, item_id, params).await?;
        if params.share_with_org {
            self.share_with_org(item_id).await?;
        }
        Ok(())
    }

    async fn add_to_definition(&self, service_url: &str, definition: &Value) -> Result<()> {
        let url = format!("{}/addToDefinition", admin_service_url(service_url));
        self.admin_post(&url, "addToDefinition", definition).await
    }

    async fn update_service_definition(
        &self,
        service_url: &str,
        definition: &Value,
    ) -> Result<()> {
        let url = format!("{}/updateDefinition", admin_service_url(service_url));
        self.admin_post(&url, "updateDefinition", definition).await
    }

    async fn update_layer_definition(
        &self,
        service_url: &str,
        layer_id: u32,
        definition: &Value,
    ) -> Result<()> {
        let url = format!("{}/{}/updateDefinition", admin_service_url(service_url), layer_id);
        self.admin_post(&url, "updateDefinition", definition).await
    }

    async fn query_features(&self, layer_url: &str, query: &FeatureQuery) -> Result<FeatureSet> {
        features::query_features(&self.rest, layer_url, Some(&self.token), query).await
    }

    async fn apply_edits(&self, layer_url: &str, edits: &EditBatch) -> Result<EditResults> {
        features::apply_edits(&self.rest, layer_url, Some(&self.token), edits).await
    }

    async fn reverse_geocode(&self, point: Point) -> Result<Locality> {
        let geocoder = self.geocoder().await?;
        geocode::reverse_geocode(&self.rest, &geocoder.url, geocoder.token(&self.token), point).await
    }
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(str::to_ascii_lowercase)
}

fn same_host(a: &str, b: &str) -> bool {
    matches!((host_of(a), host_of(b)), (Some(x), Some(y)) if x == y)
}

/// ArcGIS Online does not accept tokens issued by an Enterprise portal.
fn is_arcgis_online(url: &str) -> bool {
    host_of(url).map_or(false, |h| h == "arcgis.com" || h.ends_with(".arcgis.com"))
}
