//! Connection credentials
//!
//! Credentials name an S3-compatible endpoint and the key pair used to sign
//! requests against it. They are read once from the process environment
//! (optionally seeded from a `.env` file) and never change afterwards.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

/// Seed the process environment from a `.env` file in the working directory
///
/// Variables already set in the environment take precedence over the file.
/// Returns the path that was loaded, or `None` when there is no `.env` file.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(Error::Config(format!("Failed to read .env file: {e}"))),
    }
}

/// Endpoint URL variable
pub const ENV_ENDPOINT: &str = "S3_URL";

/// Access key id variable
pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";

/// Secret access key variable
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";

/// Optional signing region variable
pub const ENV_REGION: &str = "S3_REGION";

/// Region used when none is configured
///
/// S3-compatible providers ignore the region but SigV4 needs one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// How bucket names are placed in request URLs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketLookup {
    /// Let the client decide; resolves to path-style
    #[default]
    Auto,
    /// `https://endpoint/bucket/key`
    Path,
    /// `https://bucket.endpoint/key`
    Dns,
}

impl BucketLookup {
    /// Whether requests should use path-style addressing
    pub const fn force_path_style(self) -> bool {
        matches!(self, BucketLookup::Auto | BucketLookup::Path)
    }
}

/// Credentials and endpoint for one store
#[derive(Clone)]
pub struct Credentials {
    /// S3 endpoint URL
    pub endpoint: Url,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Signing region
    pub region: String,

    /// Bucket addressing style
    pub bucket_lookup: BucketLookup,
}

impl Credentials {
    /// Create credentials from explicit values
    pub fn new(
        endpoint: &str,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();

        if access_key.is_empty() {
            return Err(Error::Config(format!("{ENV_ACCESS_KEY} is empty")));
        }
        if secret_key.is_empty() {
            return Err(Error::Config(format!("{ENV_SECRET_KEY} is empty")));
        }

        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            access_key,
            secret_key,
            region: DEFAULT_REGION.to_string(),
            bucket_lookup: BucketLookup::default(),
        })
    }

    /// Read credentials from the process environment
    ///
    /// Call [`load_dotenv`] first for `.env` values to be visible here.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("environment variable {name} is not set")))
        };

        let endpoint = required(ENV_ENDPOINT)?;
        let access_key = required(ENV_ACCESS_KEY)?;
        let secret_key = required(ENV_SECRET_KEY)?;

        let mut credentials = Self::new(&endpoint, access_key, secret_key)?;
        if let Some(region) = lookup(ENV_REGION).filter(|r| !r.trim().is_empty()) {
            credentials.region = region.trim().to_string();
        }

        Ok(credentials)
    }

    /// Override the signing region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Override the bucket addressing style
    pub fn with_bucket_lookup(mut self, lookup: BucketLookup) -> Self {
        self.bucket_lookup = lookup;
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint.as_str())
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket_lookup", &self.bucket_lookup)
            .finish()
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "{ENV_ENDPOINT} must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(Error::Config(format!("{ENV_ENDPOINT} has no host: {raw}")));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_ENDPOINT, "https://nyc3.digitaloceanspaces.com"),
            (ENV_ACCESS_KEY, "DO00EXAMPLE"),
            (ENV_SECRET_KEY, "topsecret"),
        ]
    }

    #[test]
    fn test_from_lookup_complete() {
        let creds = Credentials::from_lookup(lookup_from(&full_env())).unwrap();
        assert_eq!(creds.endpoint.host_str(), Some("nyc3.digitaloceanspaces.com"));
        assert_eq!(creds.access_key, "DO00EXAMPLE");
        assert_eq!(creds.secret_key, "topsecret");
        assert_eq!(creds.region, DEFAULT_REGION);
        assert_eq!(creds.bucket_lookup, BucketLookup::Auto);
    }

    #[test]
    fn test_from_lookup_region_override() {
        let mut env = full_env();
        env.push((ENV_REGION, " nyc3 "));
        let creds = Credentials::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(creds.region, "nyc3");
    }

    #[test]
    fn test_from_lookup_missing_variable_is_named() {
        for missing in [ENV_ENDPOINT, ENV_ACCESS_KEY, ENV_SECRET_KEY] {
            let env: Vec<_> = full_env().into_iter().filter(|(k, _)| *k != missing).collect();
            let err = Credentials::from_lookup(lookup_from(&env)).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
            assert!(err.to_string().contains(missing), "{err}");
        }
    }

    #[test]
    fn test_from_lookup_blank_variable_is_missing() {
        let mut env = full_env();
        env.retain(|(k, _)| *k != ENV_SECRET_KEY);
        env.push((ENV_SECRET_KEY, "   "));
        let err = Credentials::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(err.to_string().contains(ENV_SECRET_KEY));
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = Credentials::new("nyc3.digitaloceanspaces.com", "a", "b").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));

        let err = Credentials::new("ftp://example.com", "a", "b").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("http://localhost:9000", "access", "hunter2").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("access"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_bucket_lookup_path_style() {
        assert!(BucketLookup::Auto.force_path_style());
        assert!(BucketLookup::Path.force_path_style());
        assert!(!BucketLookup::Dns.force_path_style());

        let creds = Credentials::new("http://localhost:9000", "a", "b")
            .unwrap()
            .with_bucket_lookup(BucketLookup::Dns)
            .with_region("fra1");
        assert_eq!(creds.bucket_lookup, BucketLookup::Dns);
        assert_eq!(creds.region, "fra1");
    }
}
