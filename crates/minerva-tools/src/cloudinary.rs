//! Cloudinary image upload and listing.
//!
//! Upload goes through the signed upload endpoint with the turn's
//! attached media (binary data cannot travel through the function-call
//! argument schema). Listing uses the Admin API with basic auth.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use sha2::{Digest, Sha256};
use tracing::debug;

use minerva_ai::{Tool, ToolContext, ToolDeclaration, ToolError};

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Maximum resources returned by the listing tool.
const MAX_LIST_RESULTS: usize = 30;

/// Cloudinary account credentials, shared by the image tools.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

/// Compute the Cloudinary request signature: parameters sorted by name,
/// joined as `k=v` pairs with `&`, secret appended, SHA-256 hex digest.
fn request_signature(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by_key(|(name, _)| *name);

    let to_sign: Vec<String> = sorted
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(to_sign.join("&"));
    hasher.update(api_secret);
    format!("{:x}", hasher.finalize())
}

fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(5))
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .expect("failed to build HTTP client")
}

fn condense_resource(resource: &JsonValue) -> JsonValue {
    json!({
        "public_id": resource["public_id"].as_str().unwrap_or(""),
        "url": resource["secure_url"].as_str().unwrap_or(""),
        "format": resource["format"].as_str().unwrap_or(""),
        "bytes": resource["bytes"].as_u64().unwrap_or(0),
        "created_at": resource["created_at"].as_str().unwrap_or(""),
    })
}

/// Uploads the turn's attached image to Cloudinary.
pub struct ImageUploadTool {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

impl ImageUploadTool {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            http: build_http_client(),
        }
    }
}

#[async_trait]
impl Tool for ImageUploadTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: "upload_image".to_string(),
            description: "Upload the image attached to the current message to cloud storage."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "folder": {
                        "type": "string",
                        "description": "Destination folder, e.g. 'chat-uploads'"
                    },
                    "public_id": {
                        "type": "string",
                        "description": "Optional name for the stored image"
                    }
                }
            }),
        }
    }

    async fn invoke(&self, args: &JsonValue, ctx: &ToolContext<'_>) -> Result<JsonValue, ToolError> {
        let media = ctx.media.ok_or(ToolError::MissingMedia)?;

        let folder = args["folder"].as_str().filter(|s| !s.is_empty());
        let public_id = args["public_id"].as_str().filter(|s| !s.is_empty());
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut signed_params: Vec<(&str, String)> = vec![("timestamp", timestamp.clone())];
        if let Some(folder) = folder {
            signed_params.push(("folder", folder.to_string()));
        }
        if let Some(public_id) = public_id {
            signed_params.push(("public_id", public_id.to_string()));
        }
        let signature = request_signature(&signed_params, &self.config.api_secret);

        let mut form: Vec<(&str, String)> = vec![
            (
                "file",
                format!("data:{};base64,{}", media.mime_type, media.data),
            ),
            ("api_key", self.config.api_key.clone()),
            ("signature", signature),
        ];
        form.extend(signed_params);

        debug!(folder = folder.unwrap_or(""), "Uploading image to Cloudinary");

        let url = format!(
            "{}/{}/image/upload",
            CLOUDINARY_API_BASE, self.config.cloud_name
        );
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Request(format!(
                "Cloudinary upload returned HTTP {status}"
            )));
        }

        let payload: JsonValue = response
            .json()
            .await
            .map_err(|e| ToolError::InvalidResponse(e.to_string()))?;

        Ok(condense_resource(&payload))
    }
}

/// Lists images stored in a Cloudinary folder.
pub struct ImageListTool {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

impl ImageListTool {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            http: build_http_client(),
        }
    }
}

#[async_trait]
impl Tool for ImageListTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: "list_images".to_string(),
            description: "List images previously uploaded to a cloud storage folder.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "folder": {
                        "type": "string",
                        "description": "Folder to list, e.g. 'chat-uploads'"
                    }
                },
                "required": ["folder"]
            }),
        }
    }

    async fn invoke(&self, args: &JsonValue, _ctx: &ToolContext<'_>) -> Result<JsonValue, ToolError> {
        let folder = args["folder"]
            .as_str()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArgs("missing required argument 'folder'".into()))?;

        debug!(%folder, "Listing Cloudinary images");

        let url = format!(
            "{}/{}/resources/image/upload",
            CLOUDINARY_API_BASE, self.config.cloud_name
        );
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(&[
                ("prefix", folder),
                ("max_results", &MAX_LIST_RESULTS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Request(format!(
                "Cloudinary listing returned HTTP {status}"
            )));
        }

        let payload: JsonValue = response
            .json()
            .await
            .map_err(|e| ToolError::InvalidResponse(e.to_string()))?;

        let images: Vec<JsonValue> = payload["resources"]
            .as_array()
            .map(|resources| resources.iter().map(condense_resource).collect())
            .unwrap_or_default();

        Ok(json!({
            "folder": folder,
            "count": images.len(),
            "images": images,
        }))
    }
}
