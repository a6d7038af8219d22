use crate::config::ImporterConfig;
use crate::domain::model::{
    FileMetadata, MalformedRowPolicy, SourceRow, TargetRow, DEFAULT_ACTION, TARGET_HEADER,
};
use crate::domain::ports::{ObjectSink, ObjectStore};
use crate::utils::compression::is_gzip;
use crate::utils::deadline::Deadline;
use crate::utils::error::{ImporterError, Result};
use flate2::read::MultiGzDecoder;
use serde::Serialize;
use std::borrow::Cow;
use std::io::Read;

/// Where a file is read from and written to, and how rows are treated.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub origin_bucket: String,
    pub destination_bucket: String,
    pub destination_prefix: String,
    pub decompressive_transcoding: bool,
    pub malformed_rows: MalformedRowPolicy,
}

impl From<&ImporterConfig> for TransformOptions {
    fn from(config: &ImporterConfig) -> Self {
        Self {
            origin_bucket: config.origin.bucket.clone(),
            destination_bucket: config.destination.bucket.clone(),
            destination_prefix: config.destination.prefix.clone(),
            decompressive_transcoding: config.origin.decompressive_transcoding,
            malformed_rows: config.job.malformed_rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformReport {
    pub source: String,
    pub destination: String,
    pub rows_written: u64,
    pub rows_rejected: u64,
    pub rows_malformed: u64,
}

/// Positional interpretation of a source record; `None` for unsupported field counts.
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn parse_source_row(record: &csv::ByteRecord) -> Option<SourceRow> {
    let fields: Vec<Cow<'_, str>> = record.iter().map(String::from_utf8_lossy).collect();
    let (action, rest) = match fields.len() {
        5 => (DEFAULT_ACTION, &fields[..]),
        6 => (&*fields[0], &fields[1..]),
        _ => return None,
    };

    Some(SourceRow {
        action: action.to_string(),
        phone_number: rest[0].to_string(),
        first_name: rest[1].trim().to_string(),
        last_name: rest[2].trim().to_string(),
        category_name: rest[3].to_string(),
        is_business: rest[4].to_string(),
    })
}

pub fn map_row(row: SourceRow) -> TargetRow {
    let full_name = format!("{} {}", row.first_name, row.last_name)
        .trim()
        .to_string();

    TargetRow {
        phone_number: row.phone_number,
        full_name,
        first_name: row.first_name,
        last_name: row.last_name,
        action: row.action,
        category_name: row.category_name,
        is_business: row.is_business,
        ..Default::default()
    }
}

/// A row is kept when its phone number is a base-10 integer and it has a name.
pub fn is_valid(row: &TargetRow) -> bool {
    row.phone_number.parse::<i64>().is_ok() && !row.full_name.is_empty()
}

fn encode<T: Serialize>(record: T) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.serialize(record)?;
    writer
        .into_inner()
        .map_err(|e| ImporterError::IoError(e.into_error()))
}

fn decode_error(file: &FileMetadata, inline_gzip: bool, err: csv::Error) -> ImporterError {
    if inline_gzip {
        if let csv::ErrorKind::Io(io) = err.kind() {
            return ImporterError::DecompressionFailure {
                name: file.name.clone(),
                message: io.to_string(),
            };
        }
    }
    ImporterError::CsvError(err)
}

/// Rewrites one source archive into `<prefix><YYYYMMDD-HHMMSS>.csv`.
pub async fn transform_file<S: ObjectStore>(
    store: &S,
    options: &TransformOptions,
    file: &FileMetadata,
    deadline: &Deadline,
) -> Result<TransformReport> {
    tracing::info!("Processing file: {} ({} bytes)", file.name, file.size);

    let inline_gzip = !options.decompressive_transcoding;
    let data = deadline
        .run(
            "read_object",
            store.read_object(&options.origin_bucket, &file.name, options.decompressive_transcoding),
        )
        .await?;

    if inline_gzip && !is_gzip(&data) {
        return Err(ImporterError::DecompressionFailure {
            name: file.name.clone(),
            message: "missing gzip header".to_string(),
        });
    }

    let body: Box<dyn Read + Send + '_> = if inline_gzip {
        Box::new(MultiGzDecoder::new(data.as_slice()))
    } else {
        Box::new(data.as_slice())
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body);

    let destination = file.destination_name(&options.destination_prefix);
    let mut sink = deadline
        .run(
            "open_write",
            store.open_write(&options.destination_bucket, &destination),
        )
        .await?;

    let header = encode(TARGET_HEADER)?;
    deadline.run("write_object", sink.write(&header)).await?;

    let mut report = TransformReport {
        source: file.name.clone(),
        destination: destination.clone(),
        rows_written: 0,
        rows_rejected: 0,
        rows_malformed: 0,
    };
    let mut record = csv::ByteRecord::new();
    let mut row_number: u64 = 0;

    while reader
        .read_byte_record(&mut record)
        .map_err(|e| decode_error(file, inline_gzip, e))?
    {
        row_number += 1;

        let Some(source_row) = parse_source_row(&record) else {
            match options.malformed_rows {
                MalformedRowPolicy::Abort => {
                    return Err(ImporterError::UnsupportedColumnCount {
                        name: file.name.clone(),
                        row: row_number,
                        count: record.len(),
                    });
                }
                MalformedRowPolicy::Skip => {
                    tracing::warn!(
                        "Skipping row {} of {}: {} columns",
                        row_number,
                        file.name,
                        record.len()
                    );
                    report.rows_malformed += 1;
                    continue;
                }
            }
        };

        let target = map_row(source_row);
        if !is_valid(&target) {
            tracing::debug!("Dropping row {} of {}", row_number, file.name);
            report.rows_rejected += 1;
            continue;
        }

        let line = encode(&target)?;
        deadline.run("write_object", sink.write(&line)).await?;
        report.rows_written += 1;
    }

    deadline.run("close_object", sink.close()).await?;

    tracing::info!(
        "Uploaded {} ({} rows written, {} rejected, {} malformed)",
        destination,
        report.rows_written,
        report.rows_rejected,
        report.rows_malformed
    );
    Ok(report)
}
