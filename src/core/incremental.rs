use crate::domain::model::{canonical_timestamp, FileMetadata};
use crate::domain::ports::ObjectStore;
use crate::utils::deadline::Deadline;
use crate::utils::error::Result;
use futures::TryStreamExt;

/// Canonical modification timestamps of every object under `bucket/prefix`.
pub async fn destination_timestamps<S: ObjectStore>(
    store: &S,
    bucket: &str,
    prefix: &str,
    deadline: &Deadline,
) -> Result<Vec<String>> {
    let mut listing = store.list_objects(bucket, prefix);
    let mut timestamps = Vec::new();

    while let Some(object) = deadline.run("list_objects", listing.try_next()).await? {
        tracing::debug!("File in the destination bucket: {}", object.name);
        timestamps.push(canonical_timestamp(&object.updated_at));
    }

    Ok(timestamps)
}

/// Greatest timestamp by string order, `None` for an empty destination.
pub fn watermark(mut timestamps: Vec<String>) -> Option<String> {
    timestamps.sort_by(|a, b| b.cmp(a));
    timestamps.into_iter().next()
}

/// Keeps candidates strictly newer than the destination watermark. All
/// candidates pass when the destination is empty.
pub fn files_to_process(candidates: Vec<FileMetadata>, timestamps: Vec<String>) -> Vec<FileMetadata> {
    match watermark(timestamps) {
        Some(latest) => {
            let selected: Vec<FileMetadata> = candidates
                .into_iter()
                .filter(|file| file.canonical_timestamp() > latest)
                .collect();
            tracing::info!(
                "Destination watermark is {}, {} file(s) newer than it",
                latest,
                selected.len()
            );
            selected
        }
        None => {
            tracing::info!("Destination is empty, sending all {} file(s) for processing", candidates.len());
            candidates
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use chrono::{DateTime, TimeZone, Utc};
    use std::time::Duration;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn file(name: &str, updated_at: DateTime<Utc>) -> FileMetadata {
        FileMetadata {
            name: name.to_string(),
            size: 10,
            updated_at,
        }
    }

    #[test]
    fn test_empty_destination_keeps_everything() {
        let candidates = vec![file("a.csv.gz", at(1, 0)), file("b.csv.gz", at(2, 0))];
        assert_eq!(files_to_process(candidates.clone(), vec![]), candidates);
    }

    #[test]
    fn test_only_strictly_newer_candidates_pass() {
        let candidates = vec![
            file("old.csv.gz", at(1, 0)),
            file("same.csv.gz", at(3, 0)),
            file("new.csv.gz", at(4, 0)),
        ];
        let timestamps = vec![
            canonical_timestamp(&at(2, 0)),
            canonical_timestamp(&at(3, 0)),
            canonical_timestamp(&at(1, 12)),
        ];

        let selected = files_to_process(candidates, timestamps);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "new.csv.gz");
    }

    #[test]
    fn test_watermark_is_string_maximum() {
        let timestamps = vec![
            "2024-03-01T00:00:00.000000000Z".to_string(),
            "2024-03-10T00:00:00.000000000Z".to_string(),
            "2024-03-09T23:59:59.999999999Z".to_string(),
        ];
        assert_eq!(
            watermark(timestamps).as_deref(),
            Some("2024-03-10T00:00:00.000000000Z")
        );
        assert_eq!(watermark(vec![]), None);
    }

    #[test]
    fn test_subsecond_precision_is_respected() {
        let base = at(5, 10);
        let later = base + chrono::Duration::nanoseconds(1);
        let selected = files_to_process(
            vec![file("a.csv.gz", base), file("b.csv.gz", later)],
            vec![canonical_timestamp(&base)],
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "b.csv.gz");
    }

    #[tokio::test]
    async fn test_destination_timestamps_from_store() {
        let store = MemoryStore::new();
        store.put_object("dest", "out/20240301-000000.csv", b"x".to_vec(), at(1, 0));
        store.put_object("dest", "out/20240302-000000.csv", b"x".to_vec(), at(2, 0));
        store.put_object("dest", "archive/20240303-000000.csv", b"x".to_vec(), at(3, 0));

        let deadline = Deadline::after(Duration::from_secs(5));
        let timestamps = destination_timestamps(&store, "dest", "out/", &deadline)
            .await
            .unwrap();

        assert_eq!(
            timestamps,
            vec![canonical_timestamp(&at(1, 0)), canonical_timestamp(&at(2, 0))]
        );
    }
}
