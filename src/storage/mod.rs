pub mod key;
mod local_fs;

pub use local_fs::LocalFileStore;

use crate::errors::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing-facing view of one directory entry. `id` is `None` for entries
/// whose name does not carry an identifier prefix (foreign entries); those
/// are listed but can never be fetched or deleted by identifier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Option<Uuid>,
    pub filename: String,
    pub size: u64,
    pub date_uploaded: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Filename,
    Size,
    DateUploaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy)]
pub struct ListQuery {
    pub page: usize,
    pub page_size: usize,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

#[derive(Debug, Serialize)]
pub struct ListPage {
    pub total: usize,
    pub items: Vec<FileRecord>,
}

/// A stored file resolved by identifier, ready to be served for download.
#[derive(Debug)]
pub struct StoredFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFailure {
    pub id: Uuid,
    pub error: String,
}

/// Outcome of a batch delete. Each requested identifier lands in exactly one
/// bucket: counted in `deleted`, listed in `not_found`, or attributed a
/// post-resolve failure in `failed`.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub deleted: usize,
    pub not_found: Vec<Uuid>,
    pub failed: Vec<DeleteFailure>,
}

#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Persists `bytes` under a freshly generated identifier and returns the
    /// resulting storage key.
    async fn store(&self, filename: &str, bytes: Vec<u8>) -> Result<String, ApiError>;

    /// Scans the whole directory, sorts, and returns one page plus the
    /// pre-pagination total.
    async fn list(&self, query: ListQuery) -> Result<ListPage, ApiError>;

    /// Resolves an identifier to its entry and reads it. `None` means no
    /// entry carries that identifier.
    async fn fetch(&self, id: Uuid) -> Result<Option<StoredFile>, ApiError>;

    /// Deletes every entry matching one of `ids`, independently per entry.
    async fn delete_many(&self, ids: &[Uuid]) -> Result<DeleteReport, ApiError>;
}
