use crate::auth::ServiceAccountCredentials;
use std::{fmt, net::SocketAddr, path::PathBuf};
use thiserror::Error;

pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_MODEL: &str = "gemini-1.0-pro-vision";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("failed to read credentials file {path}: {source}")]
    CredentialsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the service needs at startup. Loading fails as a whole; there is
/// no partially configured state.
#[derive(Clone)]
pub struct Config {
    pub project_id: String,
    pub bucket_name: String,
    /// Raw service-account JSON, handed to the storage operator as-is.
    pub credentials_json: String,
    pub credentials: ServiceAccountCredentials,
    pub password: String,
    pub location: String,
    pub model: String,
    pub upload_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let project_id = get("PROJECT_ID");
        let bucket_name = get("BUCKET_NAME");
        let inline_credentials = get("GCS_CREDENTIALS");
        let credentials_file = get("GCS_CREDENTIALS_FILE");
        // the password is compared verbatim, so it is not trimmed
        let password = lookup("APP_PASSWORD").filter(|v| !v.is_empty());

        let mut missing = Vec::new();
        if project_id.is_none() {
            missing.push("PROJECT_ID");
        }
        if bucket_name.is_none() {
            missing.push("BUCKET_NAME");
        }
        if inline_credentials.is_none() && credentials_file.is_none() {
            missing.push("GCS_CREDENTIALS");
        }
        if password.is_none() {
            missing.push("APP_PASSWORD");
        }

        let (Some(project_id), Some(bucket_name), Some(password)) =
            (project_id, bucket_name, password)
        else {
            return Err(ConfigError::Missing(missing));
        };

        let credentials_json = match (inline_credentials, credentials_file) {
            (Some(json), _) => json,
            (None, Some(path)) => {
                let path = PathBuf::from(path);
                std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::CredentialsFile { path, source })?
            }
            (None, None) => return Err(ConfigError::Missing(missing)),
        };

        let credentials: ServiceAccountCredentials = serde_json::from_str(&credentials_json)
            .map_err(|e| ConfigError::Invalid {
                key: "GCS_CREDENTIALS",
                reason: e.to_string(),
            })?;

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(v) => v.parse::<usize>().map_err(|e| ConfigError::Invalid {
                key: "MAX_UPLOAD_BYTES",
                reason: e.to_string(),
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            project_id,
            bucket_name,
            credentials_json,
            credentials,
            password,
            location: get("VERTEX_LOCATION").unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            model: get("VERTEX_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            bind_addr,
            max_upload_bytes,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("project_id", &self.project_id)
            .field("bucket_name", &self.bucket_name)
            .field("client_email", &self.credentials.client_email)
            .field("password", &"<redacted>")
            .field("location", &self.location)
            .field("model", &self.model)
            .field("upload_dir", &self.upload_dir)
            .field("bind_addr", &self.bind_addr)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}
