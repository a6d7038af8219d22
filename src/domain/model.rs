use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Compressed CSV archive extension.
pub const ARCHIVE_SUFFIX: &str = ".csv.gz";
/// Zero-byte companion object marking an archive as fully uploaded.
pub const MARKER_SUFFIX: &str = ".done";
/// Destination file name layout, `YYYYMMDD-HHMMSS`.
pub const DESTINATION_TIME_FORMAT: &str = "%Y%m%d-%H%M%S";
/// Action applied to rows that do not carry one.
pub const DEFAULT_ACTION: &str = "A";

pub const TARGET_HEADER: [&str; 19] = [
    "phoneNumber",
    "fullName",
    "firstName",
    "lastName",
    "address",
    "city",
    "area",
    "zipCode",
    "country",
    "jobTitle",
    "email",
    "companyName",
    "website",
    "longitude",
    "latitude",
    "subSource",
    "action",
    "categoryName",
    "isBusiness",
];

/// What to do with a source row whose field count is neither 5 nor 6.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Drop the row with a warning and keep going.
    Skip,
}

/// One entry of an object listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub name: String,
    pub size: i64,
    pub updated_at: DateTime<Utc>,
}

/// A source archive selected for processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub size: i64,
    pub updated_at: DateTime<Utc>,
}

impl FileMetadata {
    pub fn canonical_timestamp(&self) -> String {
        canonical_timestamp(&self.updated_at)
    }

    pub fn destination_name(&self, prefix: &str) -> String {
        format!(
            "{}{}.csv",
            prefix,
            self.updated_at.format(DESTINATION_TIME_FORMAT)
        )
    }
}

impl From<ObjectInfo> for FileMetadata {
    fn from(info: ObjectInfo) -> Self {
        Self {
            name: info.name,
            size: info.size,
            updated_at: info.updated_at,
        }
    }
}

/// Fixed-width UTC form, so string order matches chronological order.
pub fn canonical_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// A source row after positional interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub action: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub category_name: String,
    pub is_business: String,
}

/// Output row in the normalized 19-column layout. Field order is the header order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRow {
    pub phone_number: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub area: String,
    pub zip_code: String,
    pub country: String,
    pub job_title: String,
    pub email: String,
    pub company_name: String,
    pub website: String,
    pub longitude: String,
    pub latitude: String,
    pub sub_source: String,
    pub action: String,
    pub category_name: String,
    pub is_business: String,
}
