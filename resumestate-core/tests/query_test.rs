//! Tests for the query export helper

use async_trait::async_trait;
use resumestate_core::client::ServiceError;
use resumestate_core::utils::{query, query_to, ObjectStore, QueryError, QueryRunner};
use std::sync::Mutex;

struct FakeRunner {
    result: Result<Option<String>, ServiceError>,
}

#[async_trait]
impl QueryRunner for FakeRunner {
    async fn run_query(
        &self,
        _query: &str,
        _job_name: &str,
    ) -> Result<Option<String>, ServiceError> {
        self.result.clone()
    }
}

#[derive(Default)]
struct FakeStore {
    fail: bool,
    copies: Mutex<Vec<(String, String, String, String)>>,
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
    ) -> Result<(), ServiceError> {
        if self.fail {
            return Err(ServiceError::new("CopyObject", "AccessDenied"));
        }
        self.copies.lock().unwrap().push((
            source_bucket.to_string(),
            source_key.to_string(),
            target_bucket.to_string(),
            target_key.to_string(),
        ));
        Ok(())
    }
}

fn succeeding(location: &str) -> FakeRunner {
    FakeRunner {
        result: Ok(Some(location.to_string())),
    }
}

#[tokio::test]
async fn test_query_returns_location() {
    let runner = succeeding("s3://athena-results/q/abc.csv");
    let location = query(&runner, "select 1", "daily").await.unwrap();
    assert_eq!(location, "s3://athena-results/q/abc.csv");
}

#[tokio::test]
async fn test_query_failure() {
    let runner = FakeRunner { result: Ok(None) };
    let err = query(&runner, "select 1", "daily").await.unwrap_err();
    assert!(matches!(err, QueryError::Failed { job_name, source: None } if job_name == "daily"));

    let runner = FakeRunner {
        result: Err(ServiceError::new("StartQueryExecution", "InvalidRequest")),
    };
    let err = query(&runner, "select 1", "daily").await.unwrap_err();
    assert!(matches!(err, QueryError::Failed { source: Some(_), .. }));
}

#[tokio::test]
async fn test_query_to_defaults_to_source_bucket() {
    let runner = succeeding("s3://athena-results/q/abc.csv");
    let store = FakeStore::default();

    let target = query_to(&runner, &store, "select 1", "daily", "exports/daily.csv", None)
        .await
        .unwrap();

    assert_eq!(target, "s3://athena-results/exports/daily.csv");
    assert_eq!(
        store.copies.lock().unwrap().as_slice(),
        &[(
            "athena-results".to_string(),
            "q/abc.csv".to_string(),
            "athena-results".to_string(),
            "exports/daily.csv".to_string()
        )]
    );
}

#[tokio::test]
async fn test_query_to_explicit_bucket() {
    let runner = succeeding("s3://athena-results/q/abc.csv");
    let store = FakeStore::default();

    let target = query_to(
        &runner,
        &store,
        "select 1",
        "daily",
        "exports/daily.csv",
        Some("reporting"),
    )
    .await
    .unwrap();

    assert_eq!(target, "s3://reporting/exports/daily.csv");
    assert_eq!(store.copies.lock().unwrap()[0].2, "reporting");
}

#[tokio::test]
async fn test_query_to_without_location() {
    let runner = succeeding("");
    let store = FakeStore::default();

    let err = query_to(&runner, &store, "select 1", "daily", "out.csv", None)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::NoOutputLocation(job) if job == "daily"));
    assert!(store.copies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_query_to_copy_failure() {
    let runner = succeeding("s3://athena-results/q/abc.csv");
    let store = FakeStore {
        fail: true,
        ..FakeStore::default()
    };

    let err = query_to(&runner, &store, "select 1", "daily", "out.csv", None)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::CopyFailed { bucket, .. } if bucket == "athena-results"));
}
