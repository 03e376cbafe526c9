//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from s3conn-core.

use async_trait::async_trait;
use aws_sdk_s3::config::{RequestChecksumCalculation, ResponseChecksumValidation};
use aws_sdk_s3::primitives::ByteStream;

use s3conn_core::{
    Credentials, Error, ListResult, ObjectContent, ObjectInfo, ObjectRef, ObjectStore, Result,
};

use crate::error::{from_sdk, Resource};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from credentials
    pub async fn new(credentials: &Credentials) -> Result<Self> {
        let static_credentials = aws_credential_types::Credentials::new(
            credentials.access_key.clone(),
            credentials.secret_key.clone(),
            None, // session token
            None, // expiry
            "s3conn-static-credentials",
        );

        // Trailing slash would double up with path-style bucket segments
        let endpoint = credentials.endpoint.as_str().trim_end_matches('/');

        // Each call is a single attempt
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(static_credentials)
            .region(aws_config::Region::new(credentials.region.clone()))
            .endpoint_url(endpoint)
            .retry_config(aws_config::retry::RetryConfig::disabled())
            .load()
            .await;

        // Most S3-compatible stores reject the default flexible checksum headers
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(credentials.bucket_lookup.force_path_style())
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        tracing::debug!(
            endpoint,
            region = %credentials.region,
            path_style = credentials.bucket_lookup.force_path_style(),
            "created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

fn to_timestamp(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(dt.secs(), dt.subsec_nanos() as i32).ok()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        tracing::debug!("list_buckets");
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| from_sdk(e, Resource::Account))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                let mut info = ObjectInfo::bucket(b.name().unwrap_or_default());
                info.last_modified = b.creation_date().and_then(to_timestamp);
                info
            })
            .collect();

        Ok(buckets)
    }

    async fn list_objects(&self, bucket: &str) -> Result<ListResult> {
        tracing::debug!(bucket, "list_objects_v2");
        let response = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| from_sdk(e, Resource::Bucket(bucket)))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let key = object.key().unwrap_or_default();
                let mut info =
                    ObjectInfo::file(key, object.size().unwrap_or(0)).with_etag(object.e_tag());
                info.last_modified = object.last_modified().and_then(to_timestamp);
                info.storage_class = object.storage_class().map(|sc| sc.as_str().to_string());
                info
            })
            .collect();

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(str::to_string),
        })
    }

    async fn put_object(
        &self,
        object: &ObjectRef,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<ObjectInfo> {
        tracing::debug!(%object, size = data.len(), ?content_type, "put_object");
        let size = data.len() as i64;

        let response = self
            .inner
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .body(ByteStream::from(data))
            .set_content_type(content_type.clone())
            .send()
            .await
            .map_err(|e| from_sdk(e, Resource::Object(object)))?;

        let mut info = ObjectInfo::file(&object.key, size).with_etag(response.e_tag());
        info.content_type = content_type;

        Ok(info)
    }

    async fn get_object(&self, object: &ObjectRef) -> Result<ObjectContent> {
        tracing::debug!(%object, "get_object");
        let response = self
            .inner
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| from_sdk(e, Resource::Object(object)))?;

        let etag = response.e_tag().map(str::to_string);
        let last_modified = response.last_modified().and_then(to_timestamp);
        let content_type = response.content_type().map(str::to_string);
        let storage_class = response.storage_class().map(|sc| sc.as_str().to_string());

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        let mut info = ObjectInfo::file(&object.key, data.len() as i64).with_etag(etag.as_deref());
        info.last_modified = last_modified;
        info.content_type = content_type;
        info.storage_class = storage_class;

        Ok(ObjectContent { info, data })
    }

    async fn delete_object(&self, object: &ObjectRef) -> Result<()> {
        tracing::debug!(%object, "delete_object");
        self.inner
            .delete_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| from_sdk(e, Resource::Object(object)))?;

        Ok(())
    }
}
