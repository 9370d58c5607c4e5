use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use opendal::{services::Gcs, Operator};
use serde::Serialize;
use std::{
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    OpenDalError(#[from] opendal::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path has no file name: {0}")]
    PathError(PathBuf),
}

/// `gs://bucket/object` address of an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StorageLocator(String);

impl StorageLocator {
    pub fn new(bucket: &str, object_name: &str) -> Self {
        Self(format!("gs://{bucket}/{object_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copies a local file into the bucket under its base name, replacing any
    /// object already stored under that name.
    async fn upload(&self, local_path: &Path) -> StorageResult<StorageLocator>;
}

#[derive(Clone, Debug)]
pub struct BucketUploader {
    bucket: String,
    op: Operator,
}

impl BucketUploader {
    /// Google Cloud Storage backend signed with the given service-account JSON.
    pub fn gcs(bucket: &str, credentials_json: &str) -> StorageResult<Self> {
        let mut builder = Gcs::default();
        builder.root("/");
        builder.bucket(bucket);
        // opendal expects the key file base64 encoded
        builder.credential(&general_purpose::STANDARD.encode(credentials_json));
        let op: Operator = Operator::new(builder)?.finish();

        Ok(Self::with_operator(bucket, op))
    }

    pub fn with_operator(bucket: impl Into<String>, op: Operator) -> Self {
        Self {
            bucket: bucket.into(),
            op,
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }
}

pub fn object_name(local_path: &Path) -> StorageResult<String> {
    local_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| StorageError::PathError(local_path.to_path_buf()))
}

#[async_trait]
impl ObjectStore for BucketUploader {
    async fn upload(&self, local_path: &Path) -> StorageResult<StorageLocator> {
        let name = object_name(local_path)?;
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|source| StorageError::Read {
                path: local_path.to_path_buf(),
                source,
            })?;

        tracing::debug!("uploading {} bytes to {}/{}", data.len(), self.bucket, name);
        self.op.write(&name, data).await?;

        Ok(StorageLocator::new(&self.bucket, &name))
    }
}
