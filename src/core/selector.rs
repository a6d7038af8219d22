use crate::domain::model::{FileMetadata, ObjectInfo, ARCHIVE_SUFFIX, MARKER_SUFFIX};
use crate::domain::ports::ObjectStore;
use crate::utils::deadline::Deadline;
use crate::utils::error::Result;
use futures::TryStreamExt;
use std::collections::HashSet;

/// Names a marker may use to complete `archive`: the archive name itself,
/// without `.gz`, and without `.csv.gz`.
fn completion_stems(archive: &str) -> impl Iterator<Item = &str> {
    [
        Some(archive),
        archive.strip_suffix(".gz"),
        archive.strip_suffix(ARCHIVE_SUFFIX),
    ]
    .into_iter()
    .flatten()
}

fn is_retained(object: &ObjectInfo) -> bool {
    object.name.ends_with(MARKER_SUFFIX)
        || (object.name.ends_with(ARCHIVE_SUFFIX) && object.size > 0)
}

/// Pure selection over a complete listing. Listing order is preserved.
pub fn select_from_listing<I>(objects: I) -> Vec<FileMetadata>
where
    I: IntoIterator<Item = ObjectInfo>,
{
    let retained: Vec<ObjectInfo> = objects.into_iter().filter(is_retained).collect();

    let completed: HashSet<&str> = retained
        .iter()
        .filter_map(|object| object.name.strip_suffix(MARKER_SUFFIX))
        .collect();

    retained
        .iter()
        .filter(|object| object.name.ends_with(ARCHIVE_SUFFIX))
        .filter(|object| completion_stems(&object.name).any(|stem| completed.contains(stem)))
        .cloned()
        .map(FileMetadata::from)
        .collect()
}

/// Lists `bucket/prefix` and returns the completed, non-empty archives.
pub async fn select_candidates<S: ObjectStore>(
    store: &S,
    bucket: &str,
    prefix: &str,
    deadline: &Deadline,
) -> Result<Vec<FileMetadata>> {
    let mut listing = store.list_objects(bucket, prefix);
    let mut objects = Vec::new();

    while let Some(object) = deadline.run("list_objects", listing.try_next()).await? {
        tracing::debug!("File in the origin bucket: {} ({} bytes)", object.name, object.size);
        objects.push(object);
    }

    let candidates = select_from_listing(objects);
    tracing::info!(
        "Found {} completed archive(s) in {}/{}",
        candidates.len(),
        bucket,
        prefix
    );
    Ok(candidates)
}
