//! HTTP 接口。
//!
//! - `POST /upload_excel` 上传表格文件(multipart 字段 `file`)，替换当前表
//! - `POST /query` 提交 `{"query": "..."}`，返回 `{"sql", "result"}`
//! - `GET /columns` 当前表的列名
//! - `GET /health` 健康检查

pub mod error;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tracing::info;
use crate::config::ServerConfig;
use crate::core::db::Database;

pub use error::ApiError;

/// 共享状态。查询持有读锁，导入只在换入内存时持有写锁
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RwLock<Database>>,
    /// 串行化上传，解析与落盘期间不阻塞查询
    pub uploads: Arc<Mutex<()>>,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(db: Database, upload_dir: PathBuf) -> Self {
        AppState {
            db: Arc::new(RwLock::new(db)),
            uploads: Arc::new(Mutex::new(())),
            upload_dir,
        }
    }
}

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload_excel", post(handlers::upload_excel))
        .route("/query", post(handlers::query))
        .route("/columns", get(handlers::columns))
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(db: Database, config: &ServerConfig) -> anyhow::Result<()> {
    let state = AppState::new(db, config.upload_dir.clone());
    let app = create_router(state, config.max_upload_bytes());

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("sheet_query listening on http://{}", listener.local_addr()?);
    info!("  uploads: {}", config.upload_dir.display());

    axum::serve(listener, app).await?;
    Ok(())
}
