use crate::domain::model::ObjectInfo;
use crate::utils::error::Result;
use futures::stream::BoxStream;

/// Lazy, finite listing. Once it yields an error it cannot be resumed.
pub type ObjectListing<'a> = BoxStream<'a, Result<ObjectInfo>>;

/// Write side of a destination object. Nothing is visible until `close` succeeds.
pub trait ObjectSink: Send {
    fn write(&mut self, chunk: &[u8]) -> impl std::future::Future<Output = Result<()>> + Send;
    fn close(self) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ObjectStore: Send + Sync {
    type Sink: ObjectSink;

    fn list_objects<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> ObjectListing<'a>;

    /// Reads a whole object. With `decompress` the store returns the decoded body.
    fn read_object(
        &self,
        bucket: &str,
        name: &str,
        decompress: bool,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    fn open_write(
        &self,
        bucket: &str,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Self::Sink>> + Send;
}
