use crate::domain::model::ObjectInfo;
use crate::domain::ports::{ObjectListing, ObjectSink, ObjectStore};
use crate::utils::compression::gunzip;
use crate::utils::error::{ImporterError, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const PARTIAL_SUFFIX: &str = ".partial";

/// Filesystem-backed store: each bucket is a directory under `root` and
/// object names are `/`-separated paths relative to it.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, name: &str) -> PathBuf {
        let mut path = self.root.join(bucket);
        for segment in name.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    fn scan(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let bucket_dir = self.root.join(bucket);
        if !bucket_dir.is_dir() {
            return Err(ImporterError::store(
                "list_objects",
                format!("bucket directory {} does not exist", bucket_dir.display()),
            ));
        }

        let mut objects = Vec::new();
        walk(&bucket_dir, &bucket_dir, &mut objects)
            .map_err(|e| ImporterError::store("list_objects", e))?;

        objects.retain(|object| object.name.starts_with(prefix));
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }
}

fn walk(base: &Path, dir: &Path, out: &mut Vec<ObjectInfo>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            walk(base, &path, out)?;
            continue;
        }

        let Ok(relative) = path.strip_prefix(base) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if name.ends_with(PARTIAL_SUFFIX) {
            continue;
        }

        out.push(ObjectInfo {
            name,
            size: metadata.len() as i64,
            updated_at: DateTime::<Utc>::from(metadata.modified()?),
        });
    }
    Ok(())
}

impl ObjectStore for LocalStore {
    type Sink = LocalSink;

    fn list_objects<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> ObjectListing<'a> {
        match self.scan(bucket, prefix) {
            Ok(objects) => stream::iter(objects.into_iter().map(Ok)).boxed(),
            Err(e) => stream::once(async move { Err::<ObjectInfo, _>(e) }).boxed(),
        }
    }

    async fn read_object(&self, bucket: &str, name: &str, decompress: bool) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, name);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImporterError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(ImporterError::store("read_object", e)),
        };

        if decompress {
            gunzip(name, &data)
        } else {
            Ok(data)
        }
    }

    async fn open_write(&self, bucket: &str, name: &str) -> Result<LocalSink> {
        let path = self.object_path(bucket, name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ImporterError::write(name, e))?;
        }

        let mut partial = path.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);

        let file = tokio::fs::File::create(&partial)
            .await
            .map_err(|e| ImporterError::write(name, e))?;

        Ok(LocalSink {
            name: name.to_string(),
            file,
            partial,
            path,
        })
    }
}

/// Writes to `<path>.partial` and renames into place on close.
pub struct LocalSink {
    name: String,
    file: tokio::fs::File,
    partial: PathBuf,
    path: PathBuf,
}

impl ObjectSink for LocalSink {
    async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| ImporterError::write(&self.name, e))
    }

    async fn close(mut self) -> Result<()> {
        self.file
            .flush()
            .await
            .map_err(|e| ImporterError::write(&self.name, e))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| ImporterError::write(&self.name, e))?;
        tokio::fs::rename(&self.partial, &self.path)
            .await
            .map_err(|e| ImporterError::write(&self.name, e))
    }
}
