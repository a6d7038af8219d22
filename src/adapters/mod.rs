// Adapters layer: concrete object store implementations behind the domain port.

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use crate::config::{StoreBackend, StoreSettings};
use crate::domain::ports::{ObjectListing, ObjectSink, ObjectStore};
use crate::utils::error::Result;

pub use local::{LocalSink, LocalStore};
pub use memory::{MemorySink, MemoryStore};
#[cfg(feature = "s3")]
pub use s3::{S3Sink, S3Store};

/// Store selected at runtime from `[store]`.
#[derive(Debug, Clone)]
pub enum AnyStore {
    Local(LocalStore),
    #[cfg(feature = "s3")]
    S3(S3Store),
}

impl AnyStore {
    pub async fn from_settings(settings: &StoreSettings) -> Result<Self> {
        match settings.backend {
            StoreBackend::Local => {
                let root = crate::utils::validation::validate_required_field(
                    "store.root",
                    &settings.root,
                )?;
                Ok(Self::Local(LocalStore::new(root)))
            }
            #[cfg(feature = "s3")]
            StoreBackend::S3 => Ok(Self::S3(S3Store::from_settings(settings).await)),
            #[cfg(not(feature = "s3"))]
            StoreBackend::S3 => Err(crate::utils::error::ImporterError::ConfigError {
                message: "store.backend = \"s3\" requires the `s3` feature".to_string(),
            }),
        }
    }
}

pub enum AnySink {
    Local(LocalSink),
    #[cfg(feature = "s3")]
    S3(S3Sink),
}

impl ObjectStore for AnyStore {
    type Sink = AnySink;

    fn list_objects<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> ObjectListing<'a> {
        match self {
            Self::Local(store) => store.list_objects(bucket, prefix),
            #[cfg(feature = "s3")]
            Self::S3(store) => store.list_objects(bucket, prefix),
        }
    }

    async fn read_object(&self, bucket: &str, name: &str, decompress: bool) -> Result<Vec<u8>> {
        match self {
            Self::Local(store) => store.read_object(bucket, name, decompress).await,
            #[cfg(feature = "s3")]
            Self::S3(store) => store.read_object(bucket, name, decompress).await,
        }
    }

    async fn open_write(&self, bucket: &str, name: &str) -> Result<AnySink> {
        match self {
            Self::Local(store) => store.open_write(bucket, name).await.map(AnySink::Local),
            #[cfg(feature = "s3")]
            Self::S3(store) => store.open_write(bucket, name).await.map(AnySink::S3),
        }
    }
}

impl ObjectSink for AnySink {
    async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        match self {
            Self::Local(sink) => sink.write(chunk).await,
            #[cfg(feature = "s3")]
            Self::S3(sink) => sink.write(chunk).await,
        }
    }

    async fn close(self) -> Result<()> {
        match self {
            Self::Local(sink) => sink.close().await,
            #[cfg(feature = "s3")]
            Self::S3(sink) => sink.close().await,
        }
    }
}
