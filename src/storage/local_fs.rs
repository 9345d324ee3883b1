use super::*;
use crate::errors::ApiError;
use std::path::PathBuf;
use tokio::fs;

/// In-flight uploads are written under this prefix, then renamed into place.
const TMP_PREFIX: &str = ".tmp-";

/// File repository over a single storage directory. No index is kept; every
/// operation re-scans the directory, so the directory is the only source of
/// truth.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: PathBuf) -> Result<Self, ApiError> {
        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|e| ApiError::storage(&root, e))?;
        }
        Ok(Self { root })
    }

    /// All entry names in the storage directory, skipping in-flight temp
    /// files. Enumeration order is whatever the filesystem reports.
    async fn entry_names(&self) -> Result<Vec<String>, ApiError> {
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| ApiError::storage(&self.root, e))?;

        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ApiError::storage(&self.root, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| ApiError::storage(entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(TMP_PREFIX) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// Clients may declare a filename with path components; only the final
/// component is kept.
fn client_basename(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

fn uploaded_at(meta: &std::fs::Metadata) -> DateTime<Utc> {
    // birth time is not reported on every platform
    meta.created()
        .or_else(|_| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_default()
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, filename: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        let name = client_basename(filename);
        if name.is_empty() {
            return Err(ApiError::BadRequest("upload is missing a filename".into()));
        }

        let id = Uuid::new_v4();
        let storage_key = key::encode(id, name);
        let dest = self.root.join(&storage_key);
        let tmp = self.root.join(format!("{TMP_PREFIX}{id}"));

        // write fully under the temp name, then rename, so a concurrent scan
        // never observes a partial file under the final name
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| ApiError::storage(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &dest).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ApiError::storage(&dest, e));
        }

        tracing::debug!(%id, key = %storage_key, "stored upload");
        Ok(storage_key)
    }

    async fn list(&self, query: ListQuery) -> Result<ListPage, ApiError> {
        if query.page_size == 0 {
            return Err(ApiError::BadRequest("pageSize must be at least 1".into()));
        }

        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| ApiError::storage(&self.root, e))?;

        let mut records = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ApiError::storage(&self.root, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(TMP_PREFIX) {
                continue;
            }
            let meta = entry
                .metadata()
                .await
                .map_err(|e| ApiError::storage(entry.path(), e))?;
            if !meta.is_file() {
                continue;
            }

            // entries without an identifier prefix are still listed, under
            // their raw name
            let (id, filename) = match key::decode(&name) {
                Some((id, f)) => (Some(id), f.to_owned()),
                None => (None, name),
            };

            records.push(FileRecord {
                id,
                filename,
                size: meta.len(),
                date_uploaded: uploaded_at(&meta),
            });
        }

        // stable sort; flipping the comparator rather than reversing the
        // result keeps ties in enumeration order for both directions
        records.sort_by(|a, b| {
            let ord = match query.sort_field {
                SortField::Filename => a.filename.cmp(&b.filename),
                SortField::Size => a.size.cmp(&b.size),
                SortField::DateUploaded => a.date_uploaded.cmp(&b.date_uploaded),
            };
            match query.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = records.len();
        let start = query.page.saturating_mul(query.page_size);
        let items = records
            .into_iter()
            .skip(start)
            .take(query.page_size)
            .collect();

        Ok(ListPage { total, items })
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<StoredFile>, ApiError> {
        for name in self.entry_names().await? {
            let Some((entry_id, filename)) = key::decode(&name) else {
                continue;
            };
            if entry_id == id {
                let path = self.root.join(&name);
                let bytes = fs::read(&path)
                    .await
                    .map_err(|e| ApiError::storage(&path, e))?;
                return Ok(Some(StoredFile {
                    filename: filename.to_owned(),
                    bytes,
                }));
            }
        }
        Ok(None)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<DeleteReport, ApiError> {
        let names = self.entry_names().await?;

        let mut report = DeleteReport::default();
        for &id in ids {
            // at most one entry per identifier; first match wins
            let resolved = names
                .iter()
                .find(|name| matches!(key::decode(name), Some((entry_id, _)) if entry_id == id));

            let Some(name) = resolved else {
                report.not_found.push(id);
                continue;
            };

            let path = self.root.join(name);
            match fs::remove_file(&path).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    // attributed to this identifier; the rest still proceed
                    tracing::warn!(%id, path = %path.display(), error = %e, "delete failed");
                    report.failed.push(DeleteFailure {
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
