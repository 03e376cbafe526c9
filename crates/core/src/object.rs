//! Object addressing
//!
//! An object is addressed by its bucket name and key, written `bucket/key`.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Maximum key length accepted by S3
const MAX_KEY_LEN: usize = 1024;

/// A bucket and key pair pointing to one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRef {
    /// Bucket name
    pub bucket: String,
    /// Object key
    pub key: String,
}

impl ObjectRef {
    /// Create a new ObjectRef, validating both parts
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let key = key.into();

        validate_bucket(&bucket)?;

        if key.is_empty() {
            return Err(Error::InvalidPath("Object key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(Error::InvalidPath(format!(
                "Object key is {} bytes, the limit is {MAX_KEY_LEN}",
                key.len()
            )));
        }

        Ok(Self { bucket, key })
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Check a bucket name for the characters every provider rejects
pub fn validate_bucket(bucket: &str) -> Result<()> {
    if bucket.is_empty() {
        return Err(Error::InvalidPath("Bucket name cannot be empty".to_string()));
    }
    if bucket.contains('/') {
        return Err(Error::InvalidPath(format!(
            "Bucket name cannot contain '/': {bucket}"
        )));
    }
    if bucket.chars().any(char::is_whitespace) {
        return Err(Error::InvalidPath(format!(
            "Bucket name cannot contain whitespace: '{bucket}'"
        )));
    }
    Ok(())
}
