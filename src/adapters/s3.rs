use crate::config::StoreSettings;
use crate::domain::model::ObjectInfo;
use crate::domain::ports::{ObjectListing, ObjectSink, ObjectStore};
use crate::utils::compression::{gunzip, is_gzip};
use crate::utils::error::{ImporterError, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::Object;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};

/// S3 API backend. GCS buckets are reachable through the interoperability
/// endpoint `https://storage.googleapis.com` with HMAC credentials.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    pub async fn from_settings(settings: &StoreSettings) -> Self {
        let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(settings.force_path_style.unwrap_or(false));

        if let Some(region) = &settings.region {
            builder = builder.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(S3Client::from_conf(builder.build()))
    }
}

fn object_info(object: &Object) -> Option<ObjectInfo> {
    let name = object.key()?.to_string();
    let updated_at = match object
        .last_modified()
        .and_then(|d| DateTime::<Utc>::from_timestamp(d.secs(), d.subsec_nanos()))
    {
        Some(updated_at) => updated_at,
        None => {
            tracing::debug!("Object {} has no last-modified time, using the epoch", name);
            DateTime::<Utc>::default()
        }
    };

    Some(ObjectInfo {
        name,
        size: object.size().unwrap_or(0),
        updated_at,
    })
}

impl ObjectStore for S3Store {
    type Sink = S3Sink;

    fn list_objects<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> ObjectListing<'a> {
        // State is the continuation token of the next page; `None` once the last page is read.
        let pages = stream::try_unfold(Some(None::<String>), move |state| async move {
            let Some(token) = state else {
                return Ok(None);
            };

            let resp = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(token)
                .send()
                .await
                .map_err(|e| ImporterError::store("list_objects", DisplayErrorContext(&e)))?;

            let objects: Vec<ObjectInfo> = resp.contents().iter().filter_map(object_info).collect();
            let next = match (resp.is_truncated(), resp.next_continuation_token()) {
                (Some(true), Some(token)) => Some(Some(token.to_string())),
                _ => None,
            };

            tracing::debug!("Listed page of {} objects from {}/{}", objects.len(), bucket, prefix);
            Ok::<_, ImporterError>(Some((objects, next)))
        });

        pages
            .map_ok(|objects| stream::iter(objects.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    async fn read_object(&self, bucket: &str, name: &str, decompress: bool) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|s| s.is_no_such_key()).unwrap_or(false) {
                    ImporterError::ObjectNotFound {
                        bucket: bucket.to_string(),
                        name: name.to_string(),
                    }
                } else {
                    ImporterError::store("read_object", DisplayErrorContext(&e))
                }
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| ImporterError::store("read_object", e))?
            .into_bytes()
            .to_vec();

        // The endpoint may already have decoded a gzip-encoded object.
        if decompress && is_gzip(&data) {
            gunzip(name, &data)
        } else {
            Ok(data)
        }
    }

    async fn open_write(&self, bucket: &str, name: &str) -> Result<S3Sink> {
        Ok(S3Sink {
            client: self.client.clone(),
            bucket: bucket.to_string(),
            name: name.to_string(),
            buffer: Vec::new(),
        })
    }
}

/// Buffers the object body and uploads it with a single `PutObject` on close.
///
/// The whole output file is held in memory until `close`, so memory use grows
/// with the size of the transformed file. `PutObject` also caps a single
/// upload at 5 GiB.
pub struct S3Sink {
    client: S3Client,
    bucket: String,
    name: String,
    buffer: Vec<u8>,
}

impl ObjectSink for S3Sink {
    async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.name)
            .content_type("text/csv")
            .body(ByteStream::from(self.buffer))
            .send()
            .await
            .map_err(|e| ImporterError::write(&self.name, DisplayErrorContext(&e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::primitives::DateTime as SmithyDateTime;

    #[test]
    fn test_object_info_uses_last_modified() {
        let object = Object::builder()
            .key("in/a.csv.gz")
            .size(10)
            .last_modified(SmithyDateTime::from_secs(1_709_632_800))
            .build();

        let info = object_info(&object).unwrap();
        assert_eq!(info.name, "in/a.csv.gz");
        assert_eq!(info.size, 10);
        assert_eq!(info.updated_at.timestamp(), 1_709_632_800);
    }

    #[test]
    fn test_object_info_without_last_modified_falls_back_to_epoch() {
        let object = Object::builder().key("in/a.csv.gz").size(10).build();

        let info = object_info(&object).unwrap();
        assert_eq!(info.name, "in/a.csv.gz");
        assert_eq!(info.size, 10);
        assert_eq!(info.updated_at, DateTime::<Utc>::default());
    }

    #[test]
    fn test_object_info_without_key_is_skipped() {
        let object = Object::builder().size(10).build();
        assert!(object_info(&object).is_none());
    }
}
