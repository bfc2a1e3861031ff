use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use url::Url;

use crate::config::DriveConfig;
use crate::error::{Error, Result};

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "webViewLink", alias = "web_view_link", default)]
    pub web_view_link: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn upload(&self, name: &str, mime_type: &str, data: Vec<u8>) -> Result<UploadedFile>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read service account file {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
enum DriveAuth {
    Static(String),
    ServiceAccount(ServiceAccountKey),
}

/// Google Drive v3 client that writes into one configured folder.
#[derive(Clone)]
pub struct DriveService {
    client: Client,
    folder_id: String,
    auth: DriveAuth,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl DriveService {
    pub fn from_config(config: &DriveConfig, client: Client) -> Result<Self> {
        let auth = match (&config.service_account_file, &config.access_token) {
            (Some(path), _) => DriveAuth::ServiceAccount(ServiceAccountKey::from_file(path)?),
            (None, Some(token)) => DriveAuth::Static(token.clone()),
            (None, None) => {
                return Err(Error::Config("Drive credentials are not configured".to_string()))
            }
        };
        Ok(Self {
            client,
            folder_id: config.folder_id.clone(),
            auth,
            token: Arc::new(Mutex::new(None)),
        })
    }

    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    pub async fn access_token(&self) -> Result<String> {
        let key = match &self.auth {
            DriveAuth::Static(token) => return Ok(token.clone()),
            DriveAuth::ServiceAccount(key) => key,
        };

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + chrono::Duration::seconds(60) {
                return Ok(token.value.clone());
            }
        }

        let token_uri = key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: DRIVE_SCOPE,
            aud: token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &EncodingKey::from_rsa_pem(key.private_key.as_bytes())?,
        )?;

        let resp = self
            .client
            .post(token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        let body: TokenResponse = ensure_success(resp, "token exchange").await?.json().await?;

        tracing::info!("Obtained Drive access token for {}", key.client_email);
        *cached = Some(CachedToken {
            value: body.access_token.clone(),
            expires_at: Utc::now() + chrono::Duration::seconds(body.expires_in),
        });
        Ok(body.access_token)
    }

    pub async fn verify_folder(&self) -> Result<UploadedFile> {
        let token = self.access_token().await?;
        let url = Url::parse_with_params(
            &format!("{}/{}", FILES_URL, self.folder_id),
            &[("fields", "id,name,webViewLink"), ("supportsAllDrives", "true")],
        )
        .map_err(|e| Error::Internal(e.to_string()))?;
        let resp = self.client.get(url).bearer_auth(token).send().await?;
        let folder: UploadedFile = ensure_success(resp, "folder lookup").await?.json().await?;
        tracing::info!("Drive folder reachable: {} ({})", folder.name, folder.id);
        Ok(folder)
    }

    pub async fn find_or_create_folder(&self, name: &str) -> Result<UploadedFile> {
        #[derive(Deserialize)]
        struct FileList {
            files: Vec<UploadedFile>,
        }

        let token = self.access_token().await?;
        let query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            name.replace('\'', "\\'"),
            FOLDER_MIME
        );
        let url = Url::parse_with_params(
            FILES_URL,
            &[("q", query.as_str()), ("fields", "files(id,name,webViewLink)")],
        )
        .map_err(|e| Error::Internal(e.to_string()))?;
        let resp = self.client.get(url).bearer_auth(&token).send().await?;
        let list: FileList = ensure_success(resp, "folder search").await?.json().await?;
        if let Some(existing) = list.files.into_iter().next() {
            return Ok(existing);
        }

        let resp = self
            .client
            .post(format!("{}?fields=id,name,webViewLink", FILES_URL))
            .bearer_auth(&token)
            .json(&json!({ "name": name, "mimeType": FOLDER_MIME }))
            .send()
            .await?;
        let created: UploadedFile = ensure_success(resp, "folder create").await?.json().await?;
        tracing::info!("Created Drive folder {} ({})", created.name, created.id);
        Ok(created)
    }
}

#[async_trait]
impl RemoteStore for DriveService {
    async fn upload(&self, name: &str, mime_type: &str, data: Vec<u8>) -> Result<UploadedFile> {
        let token = self.access_token().await?;
        let boundary = format!("quiz-{}", uuid::Uuid::new_v4().simple());
        let metadata = json!({ "name": name, "parents": [self.folder_id] });
        let body = multipart_related(&boundary, &metadata, mime_type, &data)?;

        let url = Url::parse_with_params(
            UPLOAD_URL,
            &[
                ("uploadType", "multipart"),
                ("fields", "id,name,webViewLink"),
                ("supportsAllDrives", "true"),
            ],
        )
        .map_err(|e| Error::Internal(e.to_string()))?;

        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .timeout(Duration::from_secs(120))
            .body(body)
            .send()
            .await?;
        let file: UploadedFile = ensure_success(resp, "upload").await?.json().await?;
        tracing::info!("Uploaded {} to Drive as {}", name, file.id);
        Ok(file)
    }
}

/// Uploads a timestamped copy of the question spreadsheet.
pub async fn backup_questions(remote: &dyn RemoteStore, path: &Path) -> Result<UploadedFile> {
    let data = tokio::fs::read(path).await.map_err(|e| {
        Error::NotFound(format!("Question file {} is not readable: {}", path.display(), e))
    })?;
    let name = format!("questions_backup_{}.xlsx", Utc::now().format("%Y%m%d_%H%M%S"));
    let file = remote.upload(&name, XLSX_MIME, data).await?;
    tracing::info!("Question spreadsheet backed up as {} ({})", file.name, file.id);
    Ok(file)
}

pub fn multipart_related(
    boundary: &str,
    metadata: &serde_json::Value,
    mime_type: &str,
    data: &[u8],
) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(&serde_json::to_vec(metadata)?);
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    Ok(body)
}

async fn ensure_success(resp: Response, action: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::error!("Drive {} failed with {}: {}", action, status, body);
    Err(Error::Internal(format!("Drive {} failed with {}", action, status)))
}
