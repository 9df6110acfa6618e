//! Drive v2 REST adapter for [`RemoteStore`].
//!
//! Expects an access token obtained elsewhere; token exchange and refresh are
//! not handled here.

use super::{ItemKind, RemoteFile, RemoteFolder, RemoteItem, RemoteStore};
use crate::config::RemoteConfig;
use crate::error::SyncError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const MULTIPART_BOUNDARY: &str = "drivesync_multipart_boundary_7f3a";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    parents: Vec<ParentReference>,
}

#[derive(Deserialize)]
struct ParentReference {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    items: Vec<FileResource>,
    next_page_token: Option<String>,
}

impl FileResource {
    fn kind(&self) -> ItemKind {
        if self.mime_type == FOLDER_MIME_TYPE {
            ItemKind::Folder
        } else {
            ItemKind::File
        }
    }

    fn into_remote_file(self) -> RemoteFile {
        RemoteFile {
            id: self.id,
            title: self.title,
            parent_refs: self.parents.into_iter().map(|p| p.id).collect(),
        }
    }
}

/// Transport failures only; status rejections go through [`map_status`].
fn map_http_error(error: reqwest::Error) -> SyncError {
    if error.is_timeout() {
        SyncError::RemoteUnavailable(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        SyncError::RemoteUnavailable(format!("Connection error: {}", error))
    } else {
        SyncError::RemoteUnavailable(format!("HTTP error: {}", error))
    }
}

fn map_status(status: StatusCode, body: String) -> SyncError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        body
    };
    SyncError::RemoteRejected {
        status: Some(status.as_u16()),
        message,
    }
}

/// Build the `q` expression matching objects titled exactly `title`.
fn title_query(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('\'', "\\'");
    format!("title='{}'", escaped)
}

/// Encode metadata plus content as a `multipart/related` upload body.
fn multipart_body(metadata: &serde_json::Value, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

/// Drive v2 client
pub struct DriveClient {
    client: Client,
    endpoint: String,
    upload_endpoint: String,
    access_token: String,
}

impl DriveClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, SyncError> {
        let access_token = config
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                SyncError::ConfigError(
                    "remote.access_token is required (or set DRIVESYNC_REMOTE__ACCESS_TOKEN)"
                        .to_string(),
                )
            })?;

        let client = Client::builder()
            .build()
            .map_err(|e| SyncError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            upload_endpoint: config.upload_endpoint.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.access_token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SyncError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, body));
        }
        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
        response.json().await.map_err(|e| {
            SyncError::RemoteUnavailable(format!("Failed to parse response: {}", e))
        })
    }
}

#[async_trait]
impl RemoteStore for DriveClient {
    async fn list_by_title(&self, title: &str) -> Result<Vec<RemoteItem>, SyncError> {
        let url = format!("{}/files", self.endpoint);
        let query = title_query(title);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("q", query.clone()), ("orderBy", "folder,createdDate".to_string())];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let response = self.send(self.client.get(&url).query(&params)).await?;
            let page: FileList = Self::parse(response).await?;
            items.extend(page.items.into_iter().map(|item| RemoteItem {
                kind: item.kind(),
                id: item.id,
                title: item.title,
            }));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn create_folder(
        &self,
        title: &str,
        parent_id: &str,
    ) -> Result<RemoteFolder, SyncError> {
        let url = format!("{}/files", self.endpoint);
        let metadata = json!({
            "title": title,
            "parents": [{ "id": parent_id }],
            "mimeType": FOLDER_MIME_TYPE,
        });

        let response = self.send(self.client.post(&url).json(&metadata)).await?;
        let created: FileResource = Self::parse(response).await?;
        Ok(RemoteFolder {
            id: created.id,
            title: created.title,
        })
    }

    async fn create_file(
        &self,
        title: &str,
        parent_id: &str,
        content: Vec<u8>,
    ) -> Result<RemoteFile, SyncError> {
        let url = format!("{}/files?uploadType=multipart", self.upload_endpoint);
        let metadata = json!({
            "title": title,
            "parents": [{ "id": parent_id }],
        });

        let request = self
            .client
            .post(&url)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(multipart_body(&metadata, &content));

        let response = self.send(request).await?;
        let created: FileResource = Self::parse(response).await?;
        Ok(created.into_remote_file())
    }

    async fn update_file_content(
        &self,
        id: &str,
        title: &str,
        content: Vec<u8>,
    ) -> Result<RemoteFile, SyncError> {
        let url = format!("{}/files/{}?uploadType=multipart", self.upload_endpoint, id);
        let metadata = json!({ "title": title });

        let request = self
            .client
            .put(&url)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(multipart_body(&metadata, &content));

        let response = self.send(request).await?;
        let updated: FileResource = Self::parse(response).await?;
        Ok(updated.into_remote_file())
    }

    fn store_name(&self) -> &str {
        "drive"
    }
}
