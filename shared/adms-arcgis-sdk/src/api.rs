//! Trait seams over the remote platform
//!
//! [`PortalConnector`] logs in and hands out a [`PortalSession`]; the session
//! carries the token and exposes every call the workers make. The public
//! state boundary layer needs no login and sits behind [`BoundaryLayer`].

use adms_core::{Locality, Point, Polygon};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{
    CreateServiceParams, CreatedService, EditBatch, EditResults, FeatureQuery, FeatureSet, Folder,
    PortalItem,
};

/// Opens authenticated sessions
#[async_trait]
pub trait PortalConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn PortalSession>>;
}

/// An authenticated portal session
#[async_trait]
pub trait PortalSession: Send + Sync {
    /// Content search with the portal query syntax
    async fn search_items(&self, query: &str) -> Result<Vec<PortalItem>>;

    /// Folder of the signed-in user, matched by title
    async fn find_folder(&self, title: &str) -> Result<Option<Folder>>;

    async fn create_folder(&self, title: &str) -> Result<Folder>;

    /// Create an empty hosted feature service in `folder`
    async fn create_feature_service(
        &self,
        folder: &Folder,
        params: &CreateServiceParams,
    ) -> Result<CreatedService>;

    /// Apply tags and snippet from `params` to a created item, then share it
    /// with the organization when `params` asks for it.
    async fn publish_item(
        &self,
        folder: &Folder,
        item_id: &str,
        params: &CreateServiceParams,
    ) -> Result<()>;

    /// Add layers to a hosted service
    async fn add_to_definition(&self, service_url: &str, definition: &Value) -> Result<()>;

    async fn update_service_definition(&self, service_url: &str, definition: &Value)
        -> Result<()>;

    async fn update_layer_definition(
        &self,
        service_url: &str,
        layer_id: u32,
        definition: &Value,
    ) -> Result<()>;

    async fn query_features(&self, layer_url: &str, query: &FeatureQuery) -> Result<FeatureSet>;

    async fn apply_edits(&self, layer_url: &str, edits: &EditBatch) -> Result<EditResults>;

    /// Locality around a point; empty when the geocoder finds no address.
    async fn reverse_geocode(&self, point: Point) -> Result<Locality>;
}

/// Public boundary polygons
#[async_trait]
pub trait BoundaryLayer: Send + Sync {
    /// Boundary polygon of a U.S. state by full name
    async fn state_boundary(&self, state: &str) -> Result<Option<Polygon>>;
}

/// Find the item whose title is exactly `title`.
///
/// Title search matches tokens, so hits are filtered on the full title
/// (case-insensitive), preferring feature services.
pub async fn find_item_by_title(
    session: &dyn PortalSession,
    title: &str,
) -> Result<Option<PortalItem>> {
    let query = format!("title:\"{}\"", title.replace('"', ""));
    let items = session.search_items(&query).await?;
    debug!(title = %title, hits = items.len(), "Portal search complete");
    Ok(select_title_match(items, title))
}

/// Folder by title, created when missing
pub async fn find_or_create_folder(session: &dyn PortalSession, title: &str) -> Result<Folder> {
    if let Some(folder) = session.find_folder(title).await? {
        return Ok(folder);
    }
    let folder = session.create_folder(title).await?;
    info!(folder = %folder.title, folder_id = %folder.id, "Created portal folder");
    Ok(folder)
}

fn select_title_match(items: Vec<PortalItem>, title: &str) -> Option<PortalItem> {
    let mut matches = items
        .into_iter()
        .filter(|item| item.title.eq_ignore_ascii_case(title));

    let first = matches.next()?;
    if first.is_feature_service() {
        return Some(first);
    }
    Some(matches.find(PortalItem::is_feature_service).unwrap_or(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, item_type: &str) -> PortalItem {
        PortalItem {
            id: format!("{}-{}", title, item_type),
            title: title.to_string(),
            item_type: item_type.to_string(),
            url: None,
            owner: None,
        }
    }

    #[test]
    fn test_substring_hits_ignored() {
        let hits = vec![item("St_Mary_2024_DEV_old", "Feature Service")];
        assert!(select_title_match(hits, "St_Mary_2024_DEV").is_none());
    }

    #[test]
    fn test_exact_match_ignores_case() {
        let hits = vec![
            item("St_Mary_2024_DEV_old", "Feature Service"),
            item("st_mary_2024_dev", "Feature Service"),
        ];
        let found = select_title_match(hits, "St_Mary_2024_DEV").unwrap();
        assert_eq!(found.title, "st_mary_2024_dev");
    }

    #[test]
    fn test_feature_service_preferred() {
        let hits = vec![
            item("St_Mary_2024_DEV", "Service Definition"),
            item("St_Mary_2024_DEV", "Feature Service"),
        ];
        let found = select_title_match(hits, "St_Mary_2024_DEV").unwrap();
        assert!(found.is_feature_service());

        let only_sd = vec![item("St_Mary_2024_DEV", "Service Definition")];
        assert_eq!(
            select_title_match(only_sd, "St_Mary_2024_DEV").unwrap().item_type,
            "Service Definition"
        );
    }
}
