pub mod importer;
pub mod incremental;
pub mod selector;
pub mod transformer;

pub use crate::domain::model::{FileMetadata, ObjectInfo, SourceRow, TargetRow};
pub use crate::domain::ports::{ObjectListing, ObjectSink, ObjectStore};
pub use crate::utils::error::Result;
