use chrono::{DateTime, TimeZone, Utc};
use file_service_importer::config::{
    DestinationConfig, ImporterConfig, JobConfig, OriginConfig, StoreSettings,
};
use file_service_importer::domain::model::{MalformedRowPolicy, TARGET_HEADER};
use file_service_importer::{Importer, ImporterError, MemoryStore};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

fn config() -> ImporterConfig {
    ImporterConfig {
        origin: OriginConfig {
            bucket: "incoming".to_string(),
            prefix: "cname/".to_string(),
            decompressive_transcoding: false,
        },
        destination: DestinationConfig {
            bucket: "processed".to_string(),
            prefix: "out/".to_string(),
        },
        store: StoreSettings::default(),
        job: JobConfig::default(),
    }
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn put_archive(store: &MemoryStore, name: &str, body: &str, updated_at: DateTime<Utc>) {
    store.put_object("incoming", name, gzip(body), updated_at);
    store.put_object("incoming", &format!("{}.done", name), vec![], updated_at);
}

fn read_output(store: &MemoryStore, name: &str) -> Vec<String> {
    let data = store
        .object("processed", name)
        .unwrap_or_else(|| panic!("missing output {}", name));
    String::from_utf8(data)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_end_to_end_first_run() {
    let store = MemoryStore::new();
    put_archive(
        &store,
        "cname/a.csv.gz",
        "5551234,Jo,Doe,Retail,false\nabc,No,Phone,Retail,false\n",
        at(5, 10),
    );
    put_archive(
        &store,
        "cname/b.csv.gz",
        "U,5550001, Ann , Lee ,Food,true\n",
        at(6, 8),
    );
    // Zero-byte archive with a marker is excluded.
    store.put_object("incoming", "cname/empty.csv.gz", vec![], at(7, 0));
    store.put_object("incoming", "cname/empty.csv.gz.done", vec![], at(7, 0));
    // Archive still uploading: no marker yet.
    store.put_object("incoming", "cname/pending.csv.gz", gzip("5551234,Jo,Doe,Retail,false\n"), at(8, 0));

    let importer = Importer::new(store.clone(), config());
    let summary = importer.run().await.unwrap();

    assert_eq!(summary.plan.candidates, 2);
    assert_eq!(summary.files_written(), 2);
    assert_eq!(summary.rows_written(), 2);
    assert_eq!(
        store.object_names("processed"),
        vec!["out/20240305-100000.csv", "out/20240306-080000.csv"]
    );

    let first = read_output(&store, "out/20240305-100000.csv");
    assert_eq!(first[0], TARGET_HEADER.join(","));
    assert_eq!(first[1], "5551234,Jo Doe,Jo,Doe,,,,,,,,,,,,,A,Retail,false");
    assert_eq!(first.len(), 2);

    let second = read_output(&store, "out/20240306-080000.csv");
    assert_eq!(second[1], "5550001,Ann Lee,Ann,Lee,,,,,,,,,,,,,U,Food,true");
}

#[tokio::test]
async fn test_rerun_without_new_files_is_noop() {
    let store = MemoryStore::new();
    put_archive(&store, "cname/a.csv.gz", "5551234,Jo,Doe,Retail,false\n", at(5, 10));

    let importer = Importer::new(store.clone(), config());
    let first = importer.run().await.unwrap();
    assert_eq!(first.files_written(), 1);
    let writes_after_first_run = store.writes_opened();

    let second = importer.run().await.unwrap();
    assert!(second.plan.files.is_empty());
    assert!(second.plan.watermark.is_some());
    assert_eq!(second.files_written(), 0);
    assert_eq!(store.writes_opened(), writes_after_first_run);
    assert_eq!(store.object_names("processed").len(), 1);
}

#[tokio::test]
async fn test_only_files_newer_than_watermark_are_processed() {
    let store = MemoryStore::new();
    store.put_object("processed", "out/20240305-000000.csv", b"x".to_vec(), at(5, 12));
    put_archive(&store, "cname/old.csv.gz", "5551234,Jo,Doe,Retail,false\n", at(5, 11));
    put_archive(&store, "cname/new.csv.gz", "5551234,Jo,Doe,Retail,false\n", at(5, 13));

    let importer = Importer::new(store.clone(), config());
    let summary = importer.run().await.unwrap();

    assert_eq!(summary.plan.candidates, 2);
    assert_eq!(summary.plan.watermark.as_deref(), Some("2024-03-05T12:00:00.000000000Z"));
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.reports[0].source, "cname/new.csv.gz");
    assert_eq!(summary.reports[0].destination, "out/20240305-130000.csv");
}

#[tokio::test]
async fn test_malformed_row_aborts_batch() {
    let store = MemoryStore::new();
    put_archive(&store, "cname/a.csv.gz", "5551234,Jo,Doe\n", at(5, 10));
    put_archive(&store, "cname/b.csv.gz", "5551234,Jo,Doe,Retail,false\n", at(6, 10));

    let importer = Importer::new(store.clone(), config());
    let err = importer.run().await.unwrap_err();

    assert!(matches!(err, ImporterError::UnsupportedColumnCount { count: 3, .. }));
    assert_eq!(err.exit_code(), 1);
    // The later file is never reached.
    assert!(store.object_names("processed").is_empty());
}

#[tokio::test]
async fn test_malformed_row_skipped_with_skip_policy() {
    let store = MemoryStore::new();
    put_archive(
        &store,
        "cname/a.csv.gz",
        "5551234,Jo,Doe\n5551234,Jo,Doe,Retail,false\n",
        at(5, 10),
    );

    let mut config = config();
    config.job.malformed_rows = MalformedRowPolicy::Skip;
    let importer = Importer::new(store.clone(), config);
    let summary = importer.run().await.unwrap();

    assert_eq!(summary.reports[0].rows_malformed, 1);
    assert_eq!(summary.reports[0].rows_written, 1);
}

#[tokio::test]
async fn test_origin_listing_failure_is_fatal() {
    let store = MemoryStore::new();
    put_archive(&store, "cname/a.csv.gz", "5551234,Jo,Doe,Retail,false\n", at(5, 10));
    store.fail_listing_after("incoming", 1);

    let importer = Importer::new(store.clone(), config());
    let err = importer.run().await.unwrap_err();

    assert!(matches!(err, ImporterError::StoreUnavailable { .. }));
    assert_eq!(store.writes_opened(), 0);
}

#[tokio::test]
async fn test_destination_listing_failure_is_fatal() {
    let store = MemoryStore::new();
    put_archive(&store, "cname/a.csv.gz", "5551234,Jo,Doe,Retail,false\n", at(5, 10));
    store.fail_listing_after("processed", 0);

    let importer = Importer::new(store.clone(), config());
    let err = importer.run().await.unwrap_err();
    assert!(matches!(err, ImporterError::StoreUnavailable { .. }));
}
