//! SDK error classification
//!
//! Maps aws-sdk-s3 errors onto the s3conn-core error type using the S3
//! error code when the service sent one and the HTTP status otherwise.
//! HEAD requests carry no body, so a 404 there only has the status to go on.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use s3conn_core::{Error, ObjectRef};

/// What a failed request was addressing
#[derive(Debug, Clone, Copy)]
pub(crate) enum Resource<'a> {
    Account,
    Bucket(&'a str),
    Object(&'a ObjectRef),
}

impl Resource<'_> {
    fn bucket(&self) -> Option<&str> {
        match self {
            Resource::Account => None,
            Resource::Bucket(b) => Some(*b),
            Resource::Object(o) => Some(o.bucket.as_str()),
        }
    }
}

/// Error codes meaning the credentials were rejected
const AUTH_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "ExpiredToken",
    "InvalidAccessKeyId",
    "InvalidToken",
    "SignatureDoesNotMatch",
];

/// Error codes for transient server-side trouble
const UNAVAILABLE_CODES: &[&str] = &[
    "InternalError",
    "RequestTimeout",
    "ServiceUnavailable",
    "SlowDown",
];

/// Convert an SDK error for a request against `resource`
pub(crate) fn from_sdk<E>(err: SdkError<E, HttpResponse>, resource: Resource<'_>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = DisplayErrorContext(&err).to_string();

    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => Error::Network(message),
        SdkError::ConstructionFailure(_) => Error::General(message),
        _ => {
            let status = err.raw_response().map(|r| r.status().as_u16());
            classify(err.code(), status, resource, message)
        }
    }
}

/// Classify a service response by error code and HTTP status
pub(crate) fn classify(
    code: Option<&str>,
    status: Option<u16>,
    resource: Resource<'_>,
    message: String,
) -> Error {
    match code {
        Some("NoSuchBucket") => {
            Error::BucketNotFound(resource.bucket().map(str::to_string).unwrap_or(message))
        }
        Some("NoSuchKey") => match resource {
            Resource::Object(o) => Error::ObjectNotFound(o.to_string()),
            _ => Error::ObjectNotFound(message),
        },
        Some(c) if AUTH_CODES.contains(&c) => Error::Auth(message),
        Some(c) if UNAVAILABLE_CODES.contains(&c) => Error::Network(message),
        _ => match status {
            Some(401 | 403) => Error::Auth(message),
            Some(404) => match resource {
                Resource::Object(o) => Error::ObjectNotFound(o.to_string()),
                Resource::Bucket(b) => Error::BucketNotFound(b.to_string()),
                Resource::Account => Error::General(message),
            },
            Some(500..=599) => Error::Network(message),
            _ => Error::General(message),
        },
    }
}
