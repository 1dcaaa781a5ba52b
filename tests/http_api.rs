use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sheet_query::server::{create_router, AppState};
use sheet_query::{Database, StorageType};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const BOUNDARY: &str = "sheet-query-test-boundary";

fn app(dir: &TempDir) -> Router {
    let db = Database::new(StorageType::Memory);
    let state = AppState::new(db, dir.path().join("uploads"));
    create_router(state, 1024 * 1024)
}

fn multipart_body(field: &str, file_name: &str, content: &str) -> Vec<u8> {
    multipart_bytes(field, file_name, content.as_bytes())
}

fn multipart_bytes(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n",
        b = BOUNDARY,
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload_excel")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn query_request(query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_check_reports_ok() {
    let dir = tempdir().unwrap();
    let app = app(&dir);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn query_before_upload_is_an_error() {
    let dir = tempdir().unwrap();
    let app = app(&dir);
    let (status, body) = send(&app, query_request("count")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("uploaded_table"));
}

#[tokio::test]
async fn upload_then_query() {
    let dir = tempdir().unwrap();
    let app = app(&dir);

    let csv = "name,age\nAlice,30\nBob,25\nCara,41\n";
    let (status, body) = send(&app, upload_request(multipart_body("file", "people.csv", csv))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Table 'uploaded_table' created with 3 rows.");
    assert_eq!(body["columns"], json!(["name", "age"]));
    assert_eq!(body["preview"]["columns"], json!(["name", "age"]));
    assert_eq!(body["preview"]["rows"][0], json!(["Alice", 30]));
    assert!(dir.path().join("uploads").join("people.csv").exists());

    let (status, body) = send(&app, query_request("average age")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sql"], "SELECT AVG(age) AS average_age FROM uploaded_table");
    assert_eq!(body["result"], json!({ "columns": ["average_age"], "rows": [[32.0]] }));

    let (status, body) = send(&app, query_request("where age > 26")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["rows"], json!([["Alice", 30], ["Cara", 41]]));

    let request = Request::builder().uri("/columns").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "table": "uploaded_table", "columns": ["name", "age"] }));
}

#[tokio::test]
async fn bad_generated_sql_returns_the_error_message() {
    let dir = tempdir().unwrap();
    let app = app(&dir);
    send(&app, upload_request(multipart_body("file", "people.csv", "name,age\nAlice,30\n"))).await;

    let (status, body) = send(&app, query_request("where age >")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let dir = tempdir().unwrap();
    let app = app(&dir);
    let (status, body) = send(&app, upload_request(multipart_body("other", "x.csv", "a\n1\n"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file part" }));
}

#[tokio::test]
async fn upload_with_empty_filename_is_rejected() {
    let dir = tempdir().unwrap();
    let app = app(&dir);
    let (status, body) = send(&app, upload_request(multipart_body("file", "", "a\n1\n"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No selected file" }));
}

#[tokio::test]
async fn unreadable_upload_is_a_client_error() {
    let dir = tempdir().unwrap();
    let app = app(&dir);
    let (status, body) = send(&app, upload_request(multipart_body("file", "notes.txt", "hello"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("txt"));
}

#[tokio::test]
async fn workbook_upload_uses_the_first_sheet() {
    let dir = tempdir().unwrap();
    let app = app(&dir);
    let workbook = std::fs::read(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/study.xlsx")).unwrap();

    let (status, body) = send(&app, upload_request(multipart_bytes("file", "study.xlsx", &workbook))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Table 'uploaded_table' created with 3 rows.");
    assert_eq!(body["columns"], json!(["Name", "Score", "Passed"]));

    let (status, body) = send(&app, query_request("highest score")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sql"], "SELECT * FROM uploaded_table ORDER BY Score DESC LIMIT 1");
    assert_eq!(body["result"]["rows"], json!([["Bob", 92.0, 0]]));
}

#[tokio::test]
async fn malformed_query_body_gets_a_json_error() {
    let dir = tempdir().unwrap();
    let app = app(&dir);

    let request = Request::builder()
        .method("POST")
        .uri("/query")
        .body(Body::from("count"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn columns_without_a_table_is_not_found() {
    let dir = tempdir().unwrap();
    let app = app(&dir);
    let request = Request::builder().uri("/columns").body(Body::empty()).unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
