use axum::{
    Json, Router,
    extract::{Extension, Multipart, Path, Query},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use dotenvy::dotenv;
use serde::Deserialize;
use std::{collections::HashSet, env, net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

mod errors;
mod storage;

use errors::ApiError;
use storage::{FileStore, ListQuery, LocalFileStore, SortField, SortOrder};

#[derive(Debug, Clone)]
struct AppConfig {
    storage_path: String,
    host: String,
    port: u16,
}

impl AppConfig {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            storage_path: env::var("STORAGE_PATH").unwrap_or_else(|_| "./uploads".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a number"),
        }
    }

    fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid host or port")
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env();

    let store: Arc<dyn FileStore> = Arc::new(
        LocalFileStore::new(PathBuf::from(&config.storage_path))
            .expect("Failed to initialize storage directory"),
    );

    let app = Router::new()
        .route("/upload", post(upload))
        .route("/files", get(list_files).delete(delete_files))
        .route("/files/{id}", get(get_file))
        .layer(CorsLayer::permissive())
        .layer(Extension(store));

    let addr = config.socket_addr();
    tracing::info!("Server running on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn upload(
    Extension(store): Extension<Arc<dyn FileStore>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut stored = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        stored.push(store.store(&filename, data.to_vec()).await?);
    }

    if stored.is_empty() {
        return Err(ApiError::BadRequest("no file field in upload".into()));
    }

    Ok(Json(serde_json::json!({
        "message": "File uploaded successfully!",
        "files": stored,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListParams {
    page: usize,
    page_size: usize,
    sort_field: SortField,
    sort_order: SortOrder,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 10,
            sort_field: SortField::DateUploaded,
            sort_order: SortOrder::Asc,
        }
    }
}

async fn list_files(
    Extension(store): Extension<Arc<dyn FileStore>>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = store
        .list(ListQuery {
            page: params.page,
            page_size: params.page_size,
            sort_field: params.sort_field,
            sort_order: params.sort_order,
        })
        .await?;

    Ok(Json(serde_json::json!({
        "totalFilesCount": page.total,
        "files": page.items,
    })))
}

async fn get_file(
    Path(id): Path<String>,
    Extension(store): Extension<Arc<dyn FileStore>>,
) -> Result<impl IntoResponse, ApiError> {
    let id: Uuid = id
        .parse()
        .map_err(|_| ApiError::BadRequest("malformed file id".into()))?;

    let file = store.fetch(id).await?.ok_or(ApiError::NotFound)?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                mime::APPLICATION_OCTET_STREAM.to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", header_safe(&file.filename)),
            ),
        ],
        file.bytes,
    ))
}

// keeps the suggested save name representable in a header value
fn header_safe(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && *c != '"')
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest {
    file_ids: Vec<Uuid>,
}

async fn delete_files(
    Extension(store): Extension<Arc<dyn FileStore>>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.file_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "fileIds must be a non-empty array".into(),
        ));
    }

    let mut seen = HashSet::new();
    let mut ids = request.file_ids;
    ids.retain(|id| seen.insert(*id));

    let report = store.delete_many(&ids).await?;
    if report.deleted == 0 && report.failed.is_empty() {
        return Err(ApiError::NotFound);
    }

    tracing::info!(deleted = report.deleted, "batch delete completed");

    Ok(Json(serde_json::json!({
        "message": format!("{} file(s) deleted successfully.", report.deleted),
        "deletedCount": report.deleted,
        "notFound": report.not_found,
        "failed": report.failed,
    })))
}
