//! MinIO / S3-compatible object storage client.
//!
//! Wraps `aws-sdk-s3` to provide upload, public URL generation and
//! (batch) deletion for generation files.

use anyhow::{Context, Result};
use aws_sdk_s3::{
    config::{Builder as S3Builder, Credentials, Region},
    primitives::ByteStream,
    types::{Delete, ObjectIdentifier},
    Client,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;

/// Characters escaped in object-key URL paths: everything but RFC 3986
/// unreserved characters and the `/` separator.
const KEY_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// S3 caps a DeleteObjects request at 1000 keys.
const DELETE_BATCH: usize = 1000;

/// Storage configuration (loaded from app config).
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// MinIO / S3 endpoint URL (e.g. `http://localhost:9000`)
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// Region (use `us-east-1` for MinIO)
    pub region: String,
    /// Public base URL objects are served from. Falls back to the endpoint.
    pub public_url: Option<String>,
}

impl From<&stockpilot_common::config::StorageConfig> for StorageConfig {
    fn from(cfg: &stockpilot_common::config::StorageConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            access_key: cfg.access_key.clone(),
            secret_key: cfg.secret_key.clone(),
            bucket: cfg.bucket.clone(),
            region: cfg.region.clone(),
            public_url: cfg.public_url.clone(),
        }
    }
}

/// Outcome of a best-effort batch delete.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchDelete {
    pub deleted: usize,
    /// Keys the store refused, with its reason.
    pub failed: Vec<(String, String)>,
}

/// S3/MinIO storage client: wraps the AWS SDK.
#[derive(Clone)]
pub struct StorageClient {
    inner: Client,
    bucket: String,
    public_base: String,
}

impl StorageClient {
    /// Initialise client from config.
    pub fn new(cfg: &StorageConfig) -> Result<Self> {
        let creds = Credentials::new(
            &cfg.access_key,
            &cfg.secret_key,
            None, // session token
            None, // expiry
            "stockpilot-storage",
        );

        let s3_cfg = S3Builder::new()
            .endpoint_url(&cfg.endpoint)
            .credentials_provider(creds)
            .region(Region::new(cfg.region.clone()))
            // Force path-style URLs (required for MinIO)
            .force_path_style(true)
            .build();

        let public_base = cfg
            .public_url
            .clone()
            .unwrap_or_else(|| cfg.endpoint.clone());

        Ok(Self {
            inner: Client::from_conf(s3_cfg),
            bucket: cfg.bucket.clone(),
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload bytes to the given key.
    ///
    /// Returns the storage key (same as `key` param) on success.
    pub async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        self.inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .with_context(|| format!("Failed to upload {key} to object storage"))?;

        Ok(key.to_string())
    }

    /// Permanent public URL of an object (`<base>/<bucket>/<key>`), with the
    /// key percent-encoded.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base,
            self.bucket,
            utf8_percent_encode(key, KEY_PATH)
        )
    }

    /// Map a public URL back to its key in this client's bucket.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        storage_key_from_url(url, &self.bucket)
    }

    /// Delete many objects. Per-key refusals are reported, not raised; only a
    /// failed request is an error.
    pub async fn delete_objects(&self, keys: &[String]) -> Result<BatchDelete> {
        let mut outcome = BatchDelete::default();

        for chunk in keys.chunks(DELETE_BATCH) {
            let objects = chunk
                .iter()
                .map(|k| ObjectIdentifier::builder().key(k).build())
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to build object identifiers")?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .context("Failed to build delete request")?;

            let out = self
                .inner
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .with_context(|| format!("Failed to delete {} objects", chunk.len()))?;

            // Quiet mode only reports failures.
            let errors = out.errors();
            outcome.deleted += chunk.len().saturating_sub(errors.len());
            outcome.failed.extend(errors.iter().map(|e| {
                (
                    e.key().unwrap_or_default().to_string(),
                    e.message().unwrap_or("unknown error").to_string(),
                )
            }));
        }

        Ok(outcome)
    }

    /// Ensure the bucket exists; create it if absent.
    pub async fn ensure_bucket(&self) -> Result<()> {
        match self.inner.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                tracing::debug!(bucket = %self.bucket, "Bucket already exists");
                Ok(())
            }
            Err(_) => {
                tracing::info!(bucket = %self.bucket, "Bucket does not exist, creating");
                self.inner
                    .create_bucket()
                    .bucket(&self.bucket)
                    .send()
                    .await
                    .context("Failed to create object storage bucket")?;
                Ok(())
            }
        }
    }
}

/// Extract the object key from a public URL.
///
/// The key is everything after the first `/<bucket>/` path segment, with
/// query string and fragment removed, percent-decoded. Works for
/// hosted-storage URLs (`.../storage/v1/object/public/<bucket>/<key>`) and
/// path-style S3 URLs (`<endpoint>/<bucket>/<key>`). URLs without that
/// segment, or whose key does not decode to UTF-8, yield `None`.
pub fn storage_key_from_url(url: &str, bucket: &str) -> Option<String> {
    let pattern = format!(r"/{}/([^?#]+)", regex::escape(bucket));
    let re = Regex::new(&pattern).ok()?;
    let raw = re.captures(url)?.get(1)?.as_str().trim_end_matches('/');
    let key = percent_decode_str(raw).decode_utf8().ok()?;
    (!key.is_empty()).then(|| key.into_owned())
}
