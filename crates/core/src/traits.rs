//! ObjectStore trait definition
//!
//! This trait defines the handful of S3 operations a session performs.
//! It keeps the session sequence decoupled from the S3 SDK so it can be
//! exercised against mocks.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::Serialize;

use crate::error::Result;
use crate::object::ObjectRef;

/// Metadata for an object or bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    /// Object key or bucket name
    pub key: String,

    /// Size in bytes (None for buckets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp (creation date for buckets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag without surrounding quotes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Storage class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size.max(0) as u64, humansize::BINARY)),
            last_modified: None,
            etag: None,
            storage_class: None,
            content_type: None,
        }
    }

    /// Create a new ObjectInfo for a bucket
    pub fn bucket(name: impl Into<String>) -> Self {
        Self {
            key: name.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
            storage_class: None,
            content_type: None,
        }
    }

    /// Set the ETag, stripping the quotes S3 wraps it in
    pub fn with_etag(mut self, etag: Option<&str>) -> Self {
        self.etag = etag.map(|e| e.trim_matches('"').to_string());
        self
    }
}

/// Result of a single list request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListResult {
    /// Listed objects
    pub items: Vec<ObjectInfo>,

    /// Whether the store has more items than it returned
    pub truncated: bool,

    /// Continuation token for the next page (reported, never followed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

impl ListResult {
    /// Whether the listing contains the given key
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|i| i.key == key)
    }
}

/// Body and metadata of a read object
///
/// Serializes the body as `text`, which is null for non-UTF-8 content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectContent {
    /// Object metadata
    pub info: ObjectInfo,

    /// Full object body
    #[serde(rename = "text", serialize_with = "serialize_body")]
    pub data: Vec<u8>,
}

impl ObjectContent {
    /// Body as text, when it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

fn serialize_body<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match std::str::from_utf8(data) {
        Ok(text) => serializer.serialize_str(text),
        Err(_) => serializer.serialize_none(),
    }
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
/// Every method issues exactly one request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List buckets visible to the credentials
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    /// List the first page of objects in a bucket
    async fn list_objects(&self, bucket: &str) -> Result<ListResult>;

    /// Upload an object, replacing any existing one under the same key
    async fn put_object(
        &self,
        object: &ObjectRef,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<ObjectInfo>;

    /// Get object content and metadata
    async fn get_object(&self, object: &ObjectRef) -> Result<ObjectContent>;

    /// Delete an object
    async fn delete_object(&self, object: &ObjectRef) -> Result<()>;
}
