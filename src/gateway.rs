use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{RemoteError, UploadError};
use crate::model::raw::{NewRecord, RawRecord};

/// Access to the hosted product table and image storage.
/// Every call is one shot, retrying is left to whoever calls.
pub trait Gateway {
    /// All rows, newest first.
    fn fetch_all(&self) -> Result<Vec<RawRecord>, RemoteError>;
    fn insert(&self, record: &NewRecord) -> Result<RawRecord, RemoteError>;
    fn delete_by_id(&self, id: &str) -> Result<(), RemoteError>;
    /// Stores the image and returns its public URL.
    fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, UploadError>;
}

/// Hosted backend speaking PostgREST for rows and the storage API for images.
pub struct RestGateway {
    url: String,
    anon_key: String,
    table: String,
    bucket: String,
    access_token: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl RestGateway {
    pub fn new(config: &Config) -> Result<Self, RemoteError> {
        // A backend that stops answering must not hang the listing
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(RestGateway {
            url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            table: config.table.clone(),
            bucket: config.bucket.clone(),
            access_token: None,
            client,
        })
    }

    /// Writes made through this gateway are authorised as the signed in admin.
    pub fn with_session(mut self, access_token: &str) -> Self {
        self.access_token = Some(access_token.to_owned());
        self
    }

    /// Password sign in, returns the access token.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<String, RemoteError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.url);
        let response = self.send(
            self.authorised(self.client.post(&url))
                .json(&serde_json::json!({ "email": email, "password": password })),
        )?;
        let token: TokenResponse = response
            .json()
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;
        info!("Signed in as {}", email);
        Ok(token.access_token)
    }

    fn rows_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    fn fetch_request(&self) -> RequestBuilder {
        self.authorised(self.client.get(&self.rows_url()))
            .query(&[("select", "*"), ("order", "created_at.desc")])
    }

    fn insert_request(&self, record: &NewRecord) -> RequestBuilder {
        self.authorised(self.client.post(&self.rows_url()))
            .header("Prefer", "return=representation")
            .json(&[record])
    }

    fn delete_request(&self, id: &str) -> RequestBuilder {
        self.authorised(self.client.delete(&self.rows_url()))
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{}", id))])
    }

    fn upload_request(&self, object: &str, file_name: &str, bytes: Vec<u8>) -> RequestBuilder {
        self.authorised(self.client.post(&format!(
            "{}/storage/v1/object/{}/{}",
            self.url, self.bucket, object
        )))
        .header("Content-Type", content_type(file_name))
        .body(bytes)
    }

    fn public_url(&self, object: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.url, self.bucket, object
        )
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let request = request
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        debug!("Request {} {}", request.method(), request.url());
        let response = self
            .client
            .execute(request)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                message: error_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned()),
            });
        }
        Ok(response)
    }

    fn send_for_rows<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, RemoteError> {
        self.send(request)?
            .json()
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }
}

impl Gateway for RestGateway {
    fn fetch_all(&self) -> Result<Vec<RawRecord>, RemoteError> {
        let rows: Vec<RawRecord> = self.send_for_rows(self.fetch_request())?;
        debug!("Fetched {} rows", rows.len());
        Ok(rows)
    }

    fn insert(&self, record: &NewRecord) -> Result<RawRecord, RemoteError> {
        inserted_row(self.send_for_rows(self.insert_request(record))?)
    }

    fn delete_by_id(&self, id: &str) -> Result<(), RemoteError> {
        confirm_deleted(id, self.send_for_rows(self.delete_request(id))?)
    }

    fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, UploadError> {
        let object = object_name(file_name, Utc::now());
        self.send(self.upload_request(&object, file_name, bytes))
            .map_err(|e| UploadError::Rejected(e.to_string()))?;
        Ok(self.public_url(&object))
    }
}

fn inserted_row(rows: Vec<RawRecord>) -> Result<RawRecord, RemoteError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| RemoteError::Malformed("insert returned no row".to_owned()))
}

// The representation lists the rows removed, none means the id was unknown
fn confirm_deleted(id: &str, deleted: Vec<Value>) -> Result<(), RemoteError> {
    if deleted.is_empty() {
        return Err(RemoteError::NotFound(id.to_owned()));
    }
    Ok(())
}

// Error bodies differ between the row, auth and storage APIs
fn error_message(body: &str) -> Option<String> {
    let body: Value = serde_json::from_str(body).ok()?;
    ["message", "error_description", "msg", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .next()
        .map(str::to_owned)
}

fn object_name(file_name: &str, now: DateTime<Utc>) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image");
    let clean: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '-' })
        .collect();
    format!("{}-{}", now.timestamp_millis(), clean)
}

fn content_type(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
