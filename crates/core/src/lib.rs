//! s3conn-core: Core library for the s3conn connectivity check
//!
//! This crate provides the SDK-independent parts of s3conn:
//! - Credentials read from the environment
//! - Object addressing
//! - ObjectStore trait for the S3 operations a session performs
//! - The session sequence itself
//!
//! Nothing here depends on a specific S3 SDK, so the session can be
//! exercised against mocks.

pub mod credentials;
pub mod error;
pub mod object;
pub mod session;
pub mod traits;

pub use credentials::{BucketLookup, Credentials};
pub use error::{Error, Result};
pub use object::ObjectRef;
pub use session::{
    Checks, SessionFailure, SessionObserver, SessionPlan, SessionReport, Step, StepOutcome,
};
pub use traits::{ListResult, ObjectContent, ObjectInfo, ObjectStore};
