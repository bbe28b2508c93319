//! Email validation job types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rest::pagination::ListSegment;

/// Lifecycle state of a validation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationStatus {
    InProgress,
    Completed,
    Deleted,
    Expired,
    /// A status this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl ValidationStatus {
    /// No further polling is meaningful.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Deleted | Self::Expired)
    }

    /// Name used by the service, `None` for [`ValidationStatus::Unknown`].
    pub fn wire_name(self) -> Option<&'static str> {
        match self {
            Self::InProgress => Some("InProgress"),
            Self::Completed => Some("Completed"),
            Self::Deleted => Some("Deleted"),
            Self::Expired => Some("Expired"),
            Self::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion progress reported while a job is in progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Between 0 and 1.
    #[serde(default)]
    pub percentage: f64,
    /// `[d.]hh:mm:ss[.fffffff]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<String>,
}

/// Summary of a validation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOverview {
    pub id: Uuid,
    pub status: ValidationStatus,
    #[serde(default)]
    pub no_of_entries: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "clientIP", default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deduplication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<String>,
}

/// One validated (or pending) email address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationEntry {
    #[serde(default)]
    pub index: u64,
    #[serde(default)]
    pub input_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address_local_part: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address_domain_part: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_disposable_email_address: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_role_account: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_free_email_address: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_failure_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// A validation job with its entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validation {
    pub overview: ValidationOverview,
    pub entries: Vec<ValidationEntry>,
}

/// Wire shape of `GET email-validations/{id}`: entries may be truncated.
#[derive(Debug, Deserialize)]
pub(crate) struct ValidationSnapshot {
    pub overview: ValidationOverview,
    #[serde(default)]
    pub entries: Option<ListSegment<ValidationEntry>>,
}

/// One address to validate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEntry {
    pub input_data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

impl RequestEntry {
    pub fn new(input_data: impl Into<String>) -> Self {
        Self {
            input_data: input_data.into(),
            custom: None,
        }
    }

    pub fn with_custom(mut self, custom: impl Into<String>) -> Self {
        self.custom = Some(custom.into());
        self
    }
}

/// Job settings shared by inline and file submissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Standard`, `High` or `Extreme`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// 0 (lowest) to 255 (highest).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// `Off`, `Safe` or `Relaxed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplication: Option<String>,
    /// How long results are kept, as `[d.]hh:mm:ss`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<CompletionCallback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,
}

/// Webhook invoked by the service when the job completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionCallback {
    pub url: String,
}

/// Inline submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationRequest {
    pub entries: Vec<RequestEntry>,
    #[serde(flatten)]
    pub settings: JobSettings,
}

impl ValidationRequest {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: addresses.into_iter().map(RequestEntry::new).collect(),
            settings: JobSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: JobSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// File submission, sent as `multipart/form-data`.
#[derive(Debug, Clone, PartialEq)]
pub struct FileValidationRequest {
    pub content: Vec<u8>,
    pub file_name: String,
    /// e.g. `text/plain`, `text/csv`, or a spreadsheet type.
    pub content_type: String,
    pub options: FileOptions,
    pub settings: JobSettings,
}

/// How the service reads the uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_row: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_row: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_ending: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

/// Content of the `settings` part of a file submission.
#[derive(Serialize)]
pub(crate) struct FileSettings<'a> {
    #[serde(flatten)]
    pub options: &'a FileOptions,
    #[serde(flatten)]
    pub settings: &'a JobSettings,
}

impl FileValidationRequest {
    pub fn new(
        content: Vec<u8>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            content,
            file_name: file_name.into(),
            content_type: content_type.into(),
            options: FileOptions::default(),
            settings: JobSettings::default(),
        }
    }
}

/// Sort order of job listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Filters for listing validation jobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationListOptions {
    /// Page size hint.
    pub limit: Option<u32>,
    /// Resume a previous listing; other filters are ignored.
    pub cursor: Option<String>,
    pub created_since: Option<String>,
    pub created_until: Option<String>,
    pub statuses: Vec<ValidationStatus>,
    pub owner: Option<String>,
    pub direction: Option<Direction>,
}

/// Filters for listing the entries of a job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryListOptions {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    /// Entry statuses, e.g. `Success`, `DomainDoesNotExist`.
    pub statuses: Vec<String>,
}
