//! S3-backed [`ObjectStore`]

use super::query::ObjectStore;
use crate::client::ServiceError;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{
    CompletedMultipartUpload, CompletedPart, ObjectCannedAcl, ServerSideEncryption,
};
use tracing::{debug, info, warn};

/// Largest object a single `CopyObject` call accepts
pub const MAX_SINGLE_COPY_SIZE: i64 = 5 * 1024 * 1024 * 1024;

/// Part size used for multipart copies
pub const MULTIPART_COPY_PART_SIZE: i64 = 512 * 1024 * 1024;

fn service_error<E>(operation: &'static str, err: E) -> ServiceError
where
    E: std::error::Error,
{
    ServiceError::new(operation, DisplayErrorContext(&err).to_string())
}

/// `bucket/key` with every key segment percent-encoded, as `x-amz-copy-source` expects
pub fn copy_source(bucket: &str, key: &str) -> String {
    let key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", bucket, key)
}

/// Inclusive byte ranges covering an object of `size` bytes, numbered from 1
pub fn copy_part_ranges(size: i64, part_size: i64) -> Vec<(i32, String)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut part_number = 1;
    while start < size {
        let end = (start + part_size).min(size) - 1;
        ranges.push((part_number, format!("bytes={}-{}", start, end)));
        start = end + 1;
        part_number += 1;
    }
    ranges
}

#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &SdkConfig) -> Self {
        Self::new(aws_sdk_s3::Client::new(config))
    }

    async fn object_size(&self, bucket: &str, key: &str) -> Result<i64, ServiceError> {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| service_error("HeadObject", err))?;

        output.content_length().ok_or_else(|| {
            ServiceError::new("HeadObject", format!("no content length for s3://{}/{}", bucket, key))
        })
    }

    async fn multipart_copy(
        &self,
        source: &str,
        size: i64,
        target_bucket: &str,
        target_key: &str,
    ) -> Result<(), ServiceError> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(target_bucket)
            .key(target_key)
            .server_side_encryption(ServerSideEncryption::Aes256)
            .acl(ObjectCannedAcl::BucketOwnerFullControl)
            .send()
            .await
            .map_err(|err| service_error("CreateMultipartUpload", err))?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| ServiceError::new("CreateMultipartUpload", "no upload id returned"))?
            .to_string();

        match self
            .copy_parts(source, size, target_bucket, target_key, &upload_id)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                // Parts of an unfinished upload are billed until aborted
                if let Err(abort) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(target_bucket)
                    .key(target_key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!(
                        upload_id = %upload_id,
                        error = %DisplayErrorContext(&abort),
                        "failed to abort multipart copy"
                    );
                }
                Err(e)
            }
        }
    }

    async fn copy_parts(
        &self,
        source: &str,
        size: i64,
        target_bucket: &str,
        target_key: &str,
        upload_id: &str,
    ) -> Result<(), ServiceError> {
        let mut parts = Vec::new();
        for (part_number, range) in copy_part_ranges(size, MULTIPART_COPY_PART_SIZE) {
            debug!(part_number, range = %range, "copying part");
            let output = self
                .client
                .upload_part_copy()
                .bucket(target_bucket)
                .key(target_key)
                .upload_id(upload_id)
                .part_number(part_number)
                .copy_source(source)
                .copy_source_range(range)
                .send()
                .await
                .map_err(|err| service_error("UploadPartCopy", err))?;

            let e_tag = output
                .copy_part_result()
                .and_then(|result| result.e_tag())
                .ok_or_else(|| {
                    ServiceError::new(
                        "UploadPartCopy",
                        format!("no ETag returned for part {}", part_number),
                    )
                })?;
            parts.push(
                CompletedPart::builder()
                    .e_tag(e_tag)
                    .part_number(part_number)
                    .build(),
            );
        }

        self.client
            .complete_multipart_upload()
            .bucket(target_bucket)
            .key(target_key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|err| service_error("CompleteMultipartUpload", err))?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
    ) -> Result<(), ServiceError> {
        let source = copy_source(source_bucket, source_key);
        let size = self.object_size(source_bucket, source_key).await?;

        if size > MAX_SINGLE_COPY_SIZE {
            info!(size, source = %source, "object too large for a single copy, using multipart");
            return self
                .multipart_copy(&source, size, target_bucket, target_key)
                .await;
        }

        self.client
            .copy_object()
            .copy_source(source)
            .bucket(target_bucket)
            .key(target_key)
            .server_side_encryption(ServerSideEncryption::Aes256)
            .acl(ObjectCannedAcl::BucketOwnerFullControl)
            .send()
            .await
            .map_err(|err| service_error("CopyObject", err))?;

        Ok(())
    }
}
