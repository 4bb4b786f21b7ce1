//! [`IObjectStore`] implementation over the Cloud Storage JSON API
//!
//! | Port method       | Request                                                     |
//! |-------------------|-------------------------------------------------------------|
//! | `put_object`      | `POST /upload/storage/v1/b/{b}/o?uploadType=media&name=`    |
//! | `get_object_meta` | `GET /storage/v1/b/{b}/o/{o}`                               |
//! | `get_object`      | `GET /storage/v1/b/{b}/o/{o}?alt=media[&generation=]`       |
//! | `copy_object`     | `POST /storage/v1/b/{b}/o/{src}/copyTo/b/{b}/o/{dst}`       |
//! | `delete_object`   | `DELETE /storage/v1/b/{b}/o/{o}`                            |
//! | `list_objects`    | `GET /storage/v1/b/{b}/o?prefix=&delimiter=&pageToken=`     |
//! | `get_grants`      | `GET /storage/v1/b/{b}/o/{o}?projection=full`               |
//! | `set_grants`      | `PATCH /storage/v1/b/{b}/o/{o}` with `{"acl": [...]}`       |

use async_trait::async_trait;
use bucketsync_core::domain::{AclEntry, ContentDigest, PredefinedAcl, RemoteObjectMeta};
use bucketsync_core::ports::{IObjectStore, ObjectListing, StoreResult};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use crate::acl::{entry_from_resource, predefined_acl_param, resource_from_entry, AclResource};
use crate::client::GcsClient;
use crate::credentials::Credentials;
use crate::GcsError;

// ============================================================================
// JSON API resources
// ============================================================================

/// Object resource; numeric fields arrive as strings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    name: String,
    md5_hash: Option<String>,
    updated: Option<DateTime<Utc>>,
    generation: Option<String>,
    size: Option<String>,
    #[serde(default)]
    acl: Vec<AclResource>,
}

impl ObjectResource {
    fn into_meta(self) -> RemoteObjectMeta {
        RemoteObjectMeta {
            digest: self.md5_hash.as_deref().and_then(ContentDigest::from_base64),
            last_modified: self.updated,
            generation: self.generation.and_then(|g| g.parse().ok()),
            size: self.size.and_then(|s| s.parse().ok()).unwrap_or(0),
            name: self.name,
        }
    }
}

/// One page of `objects.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(default)]
    prefixes: Vec<String>,
    next_page_token: Option<String>,
}

// ============================================================================
// GcsObjectStore
// ============================================================================

/// Object store backed by Google Cloud Storage
#[derive(Debug, Clone)]
pub struct GcsObjectStore {
    client: GcsClient,
}

impl GcsObjectStore {
    pub fn new(client: GcsClient) -> Self {
        Self { client }
    }

    /// Store for `endpoint` authenticated with `credentials`
    pub fn from_credentials(endpoint: &str, credentials: &Credentials) -> Self {
        Self::new(GcsClient::with_base_url(
            credentials.token().map(str::to_string),
            endpoint,
        ))
    }

    pub fn client(&self) -> &GcsClient {
        &self.client
    }

    async fn object_resource(
        &self,
        bucket: &str,
        name: &str,
        full: bool,
    ) -> Result<ObjectResource, GcsError> {
        let mut url = self.client.object_url(bucket, name)?;
        if full {
            url.query_pairs_mut().append_pair("projection", "full");
        }
        self.client.get_json(url).await
    }
}

#[async_trait]
impl IObjectStore for GcsObjectStore {
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        predefined_acl: Option<PredefinedAcl>,
    ) -> StoreResult<RemoteObjectMeta> {
        let mut url = self.client.upload_url(bucket)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("uploadType", "media").append_pair("name", name);
            if let Some(acl) = predefined_acl {
                query.append_pair("predefinedAcl", predefined_acl_param(acl));
            }
        }
        let request = self
            .client
            .request(Method::POST, url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data);
        let resource: ObjectResource = self.client.send_json(request).await?;
        debug!(generation = ?resource.generation, "object uploaded");
        Ok(resource.into_meta())
    }

    #[instrument(skip(self))]
    async fn get_object_meta(&self, bucket: &str, name: &str) -> StoreResult<RemoteObjectMeta> {
        Ok(self.object_resource(bucket, name, false).await?.into_meta())
    }

    #[instrument(skip(self))]
    async fn get_object(
        &self,
        bucket: &str,
        name: &str,
        generation: Option<i64>,
    ) -> StoreResult<Vec<u8>> {
        let mut url = self.client.object_url(bucket, name)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("alt", "media");
            if let Some(generation) = generation {
                query.append_pair("generation", &generation.to_string());
            }
        }
        let response = self.client.send(self.client.request(Method::GET, url)).await?;
        let bytes = response.bytes().await.map_err(GcsError::from)?;
        debug!(bytes = bytes.len(), "object downloaded");
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self))]
    async fn copy_object(
        &self,
        bucket: &str,
        source: &str,
        destination: &str,
        preserve_grants: bool,
        predefined_acl: Option<PredefinedAcl>,
    ) -> StoreResult<RemoteObjectMeta> {
        let mut url = self.client.copy_url(bucket, source, destination)?;

        // A copy gets the bucket's default ACL unless the body names one.
        let body = if preserve_grants {
            let acl = self.object_resource(bucket, source, true).await?.acl;
            json!({ "acl": acl })
        } else {
            if let Some(acl) = predefined_acl {
                url.query_pairs_mut()
                    .append_pair("destinationPredefinedAcl", predefined_acl_param(acl));
            }
            json!({})
        };

        let request = self.client.request(Method::POST, url).json(&body);
        let resource: ObjectResource = self.client.send_json(request).await?;
        Ok(resource.into_meta())
    }

    #[instrument(skip(self))]
    async fn delete_object(&self, bucket: &str, name: &str) -> StoreResult<()> {
        let url = self.client.object_url(bucket, name)?;
        self.client.send(self.client.request(Method::DELETE, url)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> StoreResult<ObjectListing> {
        let mut listing = ObjectListing::default();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let mut url = self.client.objects_url(bucket)?;
            {
                let mut query = url.query_pairs_mut();
                if !prefix.is_empty() {
                    query.append_pair("prefix", prefix);
                }
                if let Some(delimiter) = delimiter {
                    query.append_pair("delimiter", delimiter);
                }
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: ListPage = self.client.get_json(url).await?;
            pages += 1;
            listing.prefixes.extend(page.prefixes);
            listing
                .objects
                .extend(page.items.into_iter().map(ObjectResource::into_meta));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(
            pages,
            objects = listing.objects.len(),
            prefixes = listing.prefixes.len(),
            "listing complete"
        );
        Ok(listing)
    }

    #[instrument(skip(self))]
    async fn get_grants(&self, bucket: &str, name: &str) -> StoreResult<Vec<AclEntry>> {
        let resource = self.object_resource(bucket, name, true).await?;
        Ok(resource.acl.into_iter().map(entry_from_resource).collect())
    }

    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    async fn set_grants(&self, bucket: &str, name: &str, entries: &[AclEntry]) -> StoreResult<()> {
        let url = self.client.object_url(bucket, name)?;
        let acl: Vec<AclResource> = entries.iter().filter_map(resource_from_entry).collect();
        let request = self
            .client
            .request(Method::PATCH, url)
            .json(&json!({ "acl": acl }));
        self.client.send(request).await?;
        Ok(())
    }
}
