//! Run a warehouse query and copy its result object somewhere else

use crate::client::ServiceError;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("athena query {job_name} failed")]
    Failed {
        job_name: String,
        #[source]
        source: Option<ServiceError>,
    },

    #[error("query for {0} failed, no output location")]
    NoOutputLocation(String),

    #[error("output location is not an s3 url: {0}")]
    InvalidLocation(String),

    #[error("s3 copy to s3://{bucket}/{key} failed")]
    CopyFailed {
        bucket: String,
        key: String,
        #[source]
        source: ServiceError,
    },
}

/// Runs a query to completion
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Run `query` and return the `s3://` location of its result file.
    ///
    /// `Ok(None)` means the query finished without success.
    async fn run_query(&self, query: &str, job_name: &str)
        -> Result<Option<String>, ServiceError>;
}

/// Copies objects between buckets
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy with AES256 server-side encryption and the
    /// `bucket-owner-full-control` canned ACL
    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
    ) -> Result<(), ServiceError>;
}

/// Split `s3://bucket/key/parts` into `("bucket", "key/parts")`
pub fn split_s3_location(location: &str) -> Result<(String, String), QueryError> {
    location
        .strip_prefix("s3://")
        .and_then(|rest| rest.split_once('/'))
        .filter(|(bucket, key)| !bucket.is_empty() && !key.is_empty())
        .map(|(bucket, key)| (bucket.to_string(), key.to_string()))
        .ok_or_else(|| QueryError::InvalidLocation(location.to_string()))
}

/// Run a query and return the location (in s3) of its csv result
pub async fn query(
    runner: &dyn QueryRunner,
    query_str: &str,
    job_name: &str,
) -> Result<String, QueryError> {
    let location = match runner.run_query(query_str, job_name).await {
        Ok(Some(location)) => location,
        Ok(None) => {
            error!(job_name, "athena query failed");
            return Err(QueryError::Failed {
                job_name: job_name.to_string(),
                source: None,
            });
        }
        Err(source) => {
            error!(job_name, error = %source, "athena query failed");
            return Err(QueryError::Failed {
                job_name: job_name.to_string(),
                source: Some(source),
            });
        }
    };

    info!(job_name, location = %location, "query result location");
    Ok(location)
}

/// Run a query and copy its result to `target_key`.
///
/// Without a `target_bucket` the copy stays in the bucket the query wrote to.
/// Returns the `s3://` url of the copy.
pub async fn query_to(
    runner: &dyn QueryRunner,
    store: &dyn ObjectStore,
    query_str: &str,
    job_name: &str,
    target_key: &str,
    target_bucket: Option<&str>,
) -> Result<String, QueryError> {
    let location = query(runner, query_str, job_name).await?;
    if location.is_empty() {
        return Err(QueryError::NoOutputLocation(job_name.to_string()));
    }

    let (source_bucket, source_key) = split_s3_location(&location)?;
    let target_bucket = target_bucket.unwrap_or(&source_bucket);
    let target_location = format!("s3://{}/{}", target_bucket, target_key);

    info!(
        from = %location,
        to = %target_location,
        "s3 copy"
    );
    // EU results copied to a US bucket cross accounts
    store
        .copy_object(&source_bucket, &source_key, target_bucket, target_key)
        .await
        .map_err(|source| QueryError::CopyFailed {
            bucket: target_bucket.to_string(),
            key: target_key.to_string(),
            source,
        })?;

    Ok(target_location)
}
