use std::path::Path;
use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use crate::core::db::Answer;
use crate::core::error::DbError;
use crate::core::ingest;
use crate::core::types::Table;
use super::{ApiError, AppState};

/// 上传后返回的预览行数
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /upload_excel: 保存上传的文件，解析后整表替换
pub async fn upload_excel(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) = upload.ok_or_else(|| ApiError::bad_request("No file part"))?;
    if file_name.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }
    let safe_name = secure_filename(&file_name);
    if safe_name.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }

    // 同一时刻只处理一个上传，保证磁盘与内存中的表按相同顺序替换
    let _upload = state.uploads.lock().await;

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let path = state.upload_dir.join(&safe_name);
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!(file = %path.display(), bytes = data.len(), "saved upload");

    // 解析和落盘都在锁外的阻塞线程里进行，写锁只用于换入内存
    let (table_name, writer) = {
        let db = state.db.read().await;
        (db.table_name().to_string(), db.table_writer())
    };
    let table = tokio::task::spawn_blocking(move || -> Result<Table, DbError> {
        let table = ingest::read_table(&path, &table_name)?;
        if let Some(writer) = writer {
            writer.write(&table)?;
        }
        Ok(table)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    let mut db = state.db.write().await;
    let summary = db.install_table(table);
    let db = db.downgrade();
    let preview = db.preview(PREVIEW_ROWS)?;

    Ok(Json(json!({
        "message": summary.message(),
        "columns": summary.columns,
        "preview": preview,
    })))
}

/// POST /query: 英文问句 → SQL → 结果
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Answer>, ApiError> {
    let Json(request) = payload?;
    let db = state.db.read().await;
    match db.ask(&request.query) {
        Ok(answer) => {
            info!(rule = ?answer.rule, sql = %answer.sql, rows = answer.result.rows.len(), "query answered");
            Ok(Json(answer))
        }
        Err(e) => {
            warn!(query = %request.query, error = %e, "query failed");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

/// GET /columns: 当前表的列名
pub async fn columns(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let db = state.db.read().await;
    let table = db.table_name().to_string();
    match db.columns(&table) {
        Ok(columns) => Ok(Json(json!({ "table": table, "columns": columns }))),
        Err(DbError::TableError(msg)) => Err(ApiError::NotFound(msg)),
        Err(e) => Err(e.into()),
    }
}

/// 去掉路径部分，只保留字母数字和 `._-`，空白换成下划线
pub fn secure_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let base = base.rsplit('\\').next().unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    cleaned.trim_start_matches(|c: char| c == '.' || c == '_').to_string()
}
