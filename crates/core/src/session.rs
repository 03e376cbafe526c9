//! The fixed operation sequence
//!
//! A session lists buckets, lists the target bucket, uploads one object,
//! lists the bucket again, reads the object back and optionally deletes it.
//! Each step is awaited before the next begins and the first failure ends
//! the session.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::error::Error;
use crate::object::ObjectRef;
use crate::traits::{ListResult, ObjectContent, ObjectInfo, ObjectStore};

/// One step of the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ListBuckets,
    ListObjects,
    PutObject,
    ListObjectsAfterPut,
    GetObject,
    DeleteObject,
}

impl Step {
    /// Progress label for the step
    pub const fn label(self) -> &'static str {
        match self {
            Step::ListBuckets => "Listing buckets",
            Step::ListObjects => "Listing objects",
            Step::PutObject => "Uploading object",
            Step::ListObjectsAfterPut => "Listing objects after upload",
            Step::GetObject => "Reading object",
            Step::DeleteObject => "Deleting object",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ListBuckets => "list buckets",
            Step::ListObjects => "list objects",
            Step::PutObject => "put object",
            Step::ListObjectsAfterPut => "list objects after put",
            Step::GetObject => "get object",
            Step::DeleteObject => "delete object",
        };
        f.write_str(name)
    }
}

/// What a completed step returned
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepOutcome {
    ListBuckets {
        buckets: Vec<ObjectInfo>,
    },
    ListObjects {
        bucket: String,
        #[serde(flatten)]
        listing: ListResult,
    },
    PutObject {
        object: ObjectRef,
        info: ObjectInfo,
    },
    ListObjectsAfterPut {
        bucket: String,
        #[serde(flatten)]
        listing: ListResult,
    },
    GetObject {
        object: ObjectRef,
        #[serde(flatten)]
        content: ObjectContent,
    },
    DeleteObject {
        object: ObjectRef,
    },
}

impl StepOutcome {
    /// The step this outcome belongs to
    pub const fn step(&self) -> Step {
        match self {
            StepOutcome::ListBuckets { .. } => Step::ListBuckets,
            StepOutcome::ListObjects { .. } => Step::ListObjects,
            StepOutcome::PutObject { .. } => Step::PutObject,
            StepOutcome::ListObjectsAfterPut { .. } => Step::ListObjectsAfterPut,
            StepOutcome::GetObject { .. } => Step::GetObject,
            StepOutcome::DeleteObject { .. } => Step::DeleteObject,
        }
    }
}

/// What a session writes and where
#[derive(Debug, Clone)]
pub struct SessionPlan {
    /// Object to write and read back
    pub object: ObjectRef,

    /// Body to upload
    pub body: Vec<u8>,

    /// Content type sent with the upload
    pub content_type: Option<String>,

    /// Delete the object once it has been read back
    pub delete_after: bool,
}

impl SessionPlan {
    /// Create a plan uploading `body` to `object`
    pub fn new(object: ObjectRef, body: impl Into<Vec<u8>>) -> Self {
        Self {
            object,
            body: body.into(),
            content_type: None,
            delete_after: false,
        }
    }
}

/// Consistency checks derived from the step outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Checks {
    /// The listing after the upload contains the uploaded key
    pub key_listed_after_put: bool,

    /// The bytes read back equal the bytes written
    pub round_trip_intact: bool,
}

impl Checks {
    /// Whether every check passed
    pub const fn passed(&self) -> bool {
        self.key_listed_after_put && self.round_trip_intact
    }
}

/// Outcome of a completed session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    /// Outcomes in execution order
    pub steps: Vec<StepOutcome>,

    /// Consistency checks
    pub checks: Checks,
}

/// A session that stopped at a failing step
#[derive(Debug, Error)]
#[error("{step} failed: {source}")]
pub struct SessionFailure {
    /// The step that failed
    pub step: Step,

    /// The error the store returned
    pub source: Error,
}

impl SessionFailure {
    /// Exit code of the underlying error
    pub const fn exit_code(&self) -> i32 {
        self.source.exit_code()
    }
}

/// Receives progress callbacks while a session runs
pub trait SessionObserver {
    /// A step is about to issue its request
    fn step_started(&mut self, _step: Step) {}

    /// A step completed
    fn step_finished(&mut self, _outcome: &StepOutcome) {}

    /// A step failed; the session ends after this call
    fn step_failed(&mut self, _step: Step, _error: &Error) {}
}

impl SessionObserver for () {}

/// Run the sequence against a store
pub async fn run<S, O>(
    store: &S,
    plan: &SessionPlan,
    observer: &mut O,
) -> Result<SessionReport, SessionFailure>
where
    S: ObjectStore + ?Sized,
    O: SessionObserver + ?Sized,
{
    let bucket = plan.object.bucket.as_str();
    let key = plan.object.key.as_str();
    let mut steps = Vec::with_capacity(6);
    let mut checks = Checks::default();

    observer.step_started(Step::ListBuckets);
    let buckets = store
        .list_buckets()
        .await
        .map_err(|e| failed(&mut *observer, Step::ListBuckets, e))?;
    if !buckets.iter().any(|b| b.key == bucket) {
        tracing::warn!(bucket, "target bucket is not among the listed buckets");
    }
    finish(observer, &mut steps, StepOutcome::ListBuckets { buckets });

    observer.step_started(Step::ListObjects);
    let listing = store
        .list_objects(bucket)
        .await
        .map_err(|e| failed(&mut *observer, Step::ListObjects, e))?;
    finish(
        observer,
        &mut steps,
        StepOutcome::ListObjects {
            bucket: bucket.to_string(),
            listing,
        },
    );

    observer.step_started(Step::PutObject);
    let info = store
        .put_object(&plan.object, plan.body.clone(), plan.content_type.clone())
        .await
        .map_err(|e| failed(&mut *observer, Step::PutObject, e))?;
    finish(
        observer,
        &mut steps,
        StepOutcome::PutObject {
            object: plan.object.clone(),
            info,
        },
    );

    observer.step_started(Step::ListObjectsAfterPut);
    let listing = store
        .list_objects(bucket)
        .await
        .map_err(|e| failed(&mut *observer, Step::ListObjectsAfterPut, e))?;
    checks.key_listed_after_put = listing.contains_key(key);
    if !checks.key_listed_after_put {
        tracing::warn!(
            bucket,
            key,
            truncated = listing.truncated,
            "uploaded key missing from listing"
        );
    }
    finish(
        observer,
        &mut steps,
        StepOutcome::ListObjectsAfterPut {
            bucket: bucket.to_string(),
            listing,
        },
    );

    observer.step_started(Step::GetObject);
    let content = store
        .get_object(&plan.object)
        .await
        .map_err(|e| failed(&mut *observer, Step::GetObject, e))?;
    checks.round_trip_intact = content.data == plan.body;
    if !checks.round_trip_intact {
        tracing::warn!(
            object = %plan.object,
            written = plan.body.len(),
            read = content.data.len(),
            "object content differs from what was written"
        );
    }
    finish(
        observer,
        &mut steps,
        StepOutcome::GetObject {
            object: plan.object.clone(),
            content,
        },
    );

    if plan.delete_after {
        observer.step_started(Step::DeleteObject);
        store
            .delete_object(&plan.object)
            .await
            .map_err(|e| failed(&mut *observer, Step::DeleteObject, e))?;
        finish(
            observer,
            &mut steps,
            StepOutcome::DeleteObject {
                object: plan.object.clone(),
            },
        );
    }

    Ok(SessionReport { steps, checks })
}

fn finish<O>(observer: &mut O, steps: &mut Vec<StepOutcome>, outcome: StepOutcome)
where
    O: SessionObserver + ?Sized,
{
    tracing::debug!(step = %outcome.step(), "step finished");
    observer.step_finished(&outcome);
    steps.push(outcome);
}

fn failed<O>(observer: &mut O, step: Step, source: Error) -> SessionFailure
where
    O: SessionObserver + ?Sized,
{
    tracing::debug!(%step, error = %source, "step failed");
    observer.step_failed(step, &source);
    SessionFailure { step, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::traits::MockObjectStore;
    use async_trait::async_trait;
    use mockall::Sequence;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn plan(body: &[u8]) -> SessionPlan {
        SessionPlan::new(ObjectRef::new("bucket", "probe.txt").unwrap(), body)
    }

    fn listing(keys: &[&str]) -> ListResult {
        ListResult {
            items: keys.iter().map(|k| ObjectInfo::file(*k, 0)).collect(),
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct Recorder {
        started: Vec<Step>,
        finished: Vec<Step>,
        failed: Option<Step>,
    }

    impl SessionObserver for Recorder {
        fn step_started(&mut self, step: Step) {
            self.started.push(step);
        }

        fn step_finished(&mut self, outcome: &StepOutcome) {
            self.finished.push(outcome.step());
        }

        fn step_failed(&mut self, step: Step, _error: &Error) {
            self.failed = Some(step);
        }
    }

    /// Bucket map kept in memory, behaving like a store for the properties
    /// the session relies on.
    #[derive(Default)]
    struct MemoryStore {
        buckets: Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
    }

    impl MemoryStore {
        fn with_bucket(name: &str) -> Self {
            let store = Self::default();
            store
                .buckets
                .lock()
                .unwrap()
                .insert(name.to_string(), BTreeMap::new());
            store
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
            let buckets = self.buckets.lock().unwrap();
            Ok(buckets.keys().map(ObjectInfo::bucket).collect())
        }

        async fn list_objects(&self, bucket: &str) -> Result<ListResult> {
            let buckets = self.buckets.lock().unwrap();
            let objects = buckets
                .get(bucket)
                .ok_or_else(|| Error::BucketNotFound(bucket.to_string()))?;
            Ok(ListResult {
                items: objects
                    .iter()
                    .map(|(k, v)| ObjectInfo::file(k, v.len() as i64))
                    .collect(),
                ..Default::default()
            })
        }

        async fn put_object(
            &self,
            object: &ObjectRef,
            data: Vec<u8>,
            _content_type: Option<String>,
        ) -> Result<ObjectInfo> {
            let mut buckets = self.buckets.lock().unwrap();
            let objects = buckets
                .get_mut(&object.bucket)
                .ok_or_else(|| Error::BucketNotFound(object.bucket.clone()))?;
            let info = ObjectInfo::file(&object.key, data.len() as i64);
            objects.insert(object.key.clone(), data);
            Ok(info)
        }

        async fn get_object(&self, object: &ObjectRef) -> Result<ObjectContent> {
            let buckets = self.buckets.lock().unwrap();
            let objects = buckets
                .get(&object.bucket)
                .ok_or_else(|| Error::BucketNotFound(object.bucket.clone()))?;
            let data = objects
                .get(&object.key)
                .cloned()
                .ok_or_else(|| Error::ObjectNotFound(object.to_string()))?;
            Ok(ObjectContent {
                info: ObjectInfo::file(&object.key, data.len() as i64),
                data,
            })
        }

        async fn delete_object(&self, object: &ObjectRef) -> Result<()> {
            let mut buckets = self.buckets.lock().unwrap();
            if let Some(objects) = buckets.get_mut(&object.bucket) {
                objects.remove(&object.key);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let mut store = MockObjectStore::new();
        let mut seq = Sequence::new();

        store
            .expect_list_buckets()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![ObjectInfo::bucket("bucket")]));
        store
            .expect_list_objects()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(listing(&[])));
        store
            .expect_put_object()
            .withf(|obj, data, ct| obj.key == "probe.txt" && data.as_slice() == b"hello" && ct.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|obj, data, _| Ok(ObjectInfo::file(obj.key.clone(), data.len() as i64)));
        store
            .expect_list_objects()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(listing(&["probe.txt"])));
        store
            .expect_get_object()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|obj| {
                Ok(ObjectContent {
                    info: ObjectInfo::file(obj.key.clone(), 5),
                    data: b"hello".to_vec(),
                })
            });
        store.expect_delete_object().never();

        let mut recorder = Recorder::default();
        let report = run(&store, &plan(b"hello"), &mut recorder).await.unwrap();

        let order = vec![
            Step::ListBuckets,
            Step::ListObjects,
            Step::PutObject,
            Step::ListObjectsAfterPut,
            Step::GetObject,
        ];
        assert_eq!(recorder.started, order);
        assert_eq!(recorder.finished, order);
        assert_eq!(
            report.steps.iter().map(StepOutcome::step).collect::<Vec<_>>(),
            order
        );
        assert!(report.checks.passed());
    }

    #[tokio::test]
    async fn test_failure_stops_sequence() {
        let mut store = MockObjectStore::new();
        store
            .expect_list_buckets()
            .returning(|| Ok(vec![ObjectInfo::bucket("bucket")]));
        store.expect_list_objects().returning(|_| Ok(listing(&[])));
        store
            .expect_put_object()
            .returning(|_, _, _| Err(Error::Auth("AccessDenied".into())));
        store.expect_get_object().never();
        store.expect_delete_object().never();

        let mut recorder = Recorder::default();
        let mut plan = plan(b"x");
        plan.delete_after = true;
        let failure = run(&store, &plan, &mut recorder).await.unwrap_err();

        assert_eq!(failure.step, Step::PutObject);
        assert!(matches!(failure.source, Error::Auth(_)));
        assert_eq!(failure.exit_code(), 4);
        assert_eq!(recorder.failed, Some(Step::PutObject));
        assert_eq!(recorder.finished, vec![Step::ListBuckets, Step::ListObjects]);
        assert_eq!(
            failure.to_string(),
            "put object failed: Authentication failed: AccessDenied"
        );
    }

    #[tokio::test]
    async fn test_content_type_is_forwarded() {
        let mut store = MockObjectStore::new();
        store.expect_list_buckets().returning(|| Ok(vec![]));
        store
            .expect_list_objects()
            .returning(|_| Ok(listing(&["probe.txt"])));
        store
            .expect_put_object()
            .withf(|_, _, ct| ct.as_deref() == Some("text/plain"))
            .times(1)
            .returning(|obj, _, _| Ok(ObjectInfo::file(obj.key.clone(), 0)));
        store.expect_get_object().returning(|obj| {
            Ok(ObjectContent {
                info: ObjectInfo::file(obj.key.clone(), 0),
                data: Vec::new(),
            })
        });

        let mut plan = plan(b"");
        plan.content_type = Some("text/plain".to_string());
        let report = run(&store, &plan, &mut ()).await.unwrap();
        assert!(report.checks.passed());
    }

    #[tokio::test]
    async fn test_checks_report_mismatch() {
        let mut store = MockObjectStore::new();
        store.expect_list_buckets().returning(|| Ok(vec![]));
        store.expect_list_objects().returning(|_| Ok(listing(&["other"])));
        store
            .expect_put_object()
            .returning(|obj, _, _| Ok(ObjectInfo::file(obj.key.clone(), 3)));
        store.expect_get_object().returning(|obj| {
            Ok(ObjectContent {
                info: ObjectInfo::file(obj.key.clone(), 3),
                data: b"xyz".to_vec(),
            })
        });

        let report = run(&store, &plan(b"abc"), &mut ()).await.unwrap();
        assert!(!report.checks.key_listed_after_put);
        assert!(!report.checks.round_trip_intact);
        assert!(!report.checks.passed());
    }

    #[tokio::test]
    async fn test_delete_after_read() {
        let store = MemoryStore::with_bucket("bucket");
        let mut plan = plan(b"temporary");
        plan.delete_after = true;

        let report = run(&store, &plan, &mut ()).await.unwrap();
        assert_eq!(report.steps.len(), 6);
        assert!(matches!(
            report.steps.last(),
            Some(StepOutcome::DeleteObject { .. })
        ));
        assert!(!store.list_objects("bucket").await.unwrap().contains_key("probe.txt"));
    }

    #[tokio::test]
    async fn test_round_trip_and_listing_against_memory_store() {
        let store = MemoryStore::with_bucket("bucket");
        let body: Vec<u8> = (0..=255u8).collect();

        let report = run(&store, &plan(&body), &mut ()).await.unwrap();
        assert!(report.checks.key_listed_after_put);
        assert!(report.checks.round_trip_intact);

        match &report.steps[1] {
            StepOutcome::ListObjects { listing, .. } => assert!(listing.items.is_empty()),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match &report.steps[4] {
            StepOutcome::GetObject { content, .. } => assert_eq!(content.data, body),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_bucket_fails_distinctly_from_empty_bucket() {
        let store = MemoryStore::with_bucket("empty");

        let empty = store.list_objects("empty").await.unwrap();
        assert!(empty.items.is_empty());

        let failure = run(
            &store,
            &SessionPlan::new(ObjectRef::new("missing", "k").unwrap(), "x"),
            &mut (),
        )
        .await
        .unwrap_err();
        assert_eq!(failure.step, Step::ListObjects);
        assert!(matches!(failure.source, Error::BucketNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_missing_key_fails() {
        let store = MemoryStore::with_bucket("bucket");
        let err = store
            .get_object(&ObjectRef::new("bucket", "nope").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ObjectNotFound(_)));
    }

    #[test]
    fn test_report_serialization() {
        let report = SessionReport {
            steps: vec![
                StepOutcome::ListObjects {
                    bucket: "b".into(),
                    listing: listing(&["k"]),
                },
                StepOutcome::GetObject {
                    object: ObjectRef::new("b", "k").unwrap(),
                    content: ObjectContent {
                        info: ObjectInfo::file("k", 2),
                        data: b"ok".to_vec(),
                    },
                },
            ],
            checks: Checks {
                key_listed_after_put: true,
                round_trip_intact: true,
            },
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["steps"][0]["step"], "list_objects");
        assert_eq!(json["steps"][0]["items"][0]["key"], "k");
        assert_eq!(json["steps"][0]["truncated"], false);
        assert_eq!(json["steps"][1]["step"], "get_object");
        assert_eq!(json["steps"][1]["object"]["bucket"], "b");
        assert_eq!(json["steps"][1]["text"], "ok");
        assert_eq!(json["checks"]["round_trip_intact"], true);
    }
}
