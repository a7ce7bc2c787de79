use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use keepsake_impls::{MemoryBlobStore, MemoryDatabase};
use keepsake_shop::{SharedBlobStore, Shop, MAX_FILE_SIZE};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{app, ServerConfig, ServerContext};

const BOUNDARY: &str = "keepsake-test-boundary";

struct TestApp {
    router: axum::Router,
    blobs: Arc<MemoryBlobStore>,
}

impl TestApp {
    fn new() -> Self {
        let blobs = Arc::new(MemoryBlobStore::new());
        let shop = Shop::new(
            Arc::new(MemoryDatabase::new()),
            blobs.clone() as SharedBlobStore,
        );

        let router = app(ServerContext::new(shop), &ServerConfig::default())
            .expect("app is built");

        Self { router, blobs }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request is handled");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is read");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is json")
        };

        (status, body)
    }

    async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(Method::GET).uri(uri);

        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(Method::DELETE).uri(uri);

        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.send(request.body(Body::empty()).unwrap()).await
    }

    /// Registers a seller and returns their token
    async fn seller(&self) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/register",
                None,
                json!({ "username": "seller", "password": "correct horse" }),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().expect("token is returned").to_string()
    }

    async fn upload_file(&self, field: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{field}\"; filename=\"photo.png\"\r\n\
                 Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }
}

fn valid_upload() -> Value {
    json!({
        "videos": [{ "name": "clip.mp4", "url": "https://blob.example/v1" }],
        "images": [{ "name": "photo.jpg", "url": "https://blob.example/i1" }],
        "songRequest": "X",
    })
}

#[tokio::test]
async fn create_upload_and_view_order() {
    let app = TestApp::new();
    let token = app.seller().await;

    let (status, created) = app
        .json(Method::POST, "/api/orders", None, json!({ "id": "A1" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "A1");
    assert_eq!(created["hasUploaded"], false);
    assert_eq!(created["files"], json!({ "videos": [], "images": [] }));

    let (status, uploaded) = app
        .json(Method::POST, "/api/orders/A1/upload", None, valid_upload())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["hasUploaded"], true);

    let (status, order) = app.get("/api/orders/A1", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["hasUploaded"], true);
    assert_eq!(order["songRequest"], "X");
    assert_eq!(
        order["files"]["videos"],
        json!([{ "name": "clip.mp4", "url": "https://blob.example/v1" }])
    );
    assert_eq!(
        order["files"]["images"],
        json!([{ "name": "photo.jpg", "url": "https://blob.example/i1" }])
    );
    assert_eq!(order["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn duplicate_order_id_is_rejected() {
    let app = TestApp::new();

    app.json(Method::POST, "/api/orders", None, json!({ "id": "A1" }))
        .await;
    app.json(Method::POST, "/api/orders/A1/upload", None, valid_upload())
        .await;

    let (status, body) = app
        .json(Method::POST, "/api/orders", None, json!({ "id": "A1" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Order ID already exists");

    let token = app.seller().await;
    let (_, order) = app.get("/api/orders/A1", Some(&token)).await;
    assert_eq!(order["hasUploaded"], true);
}

#[tokio::test]
async fn upload_to_missing_order_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app
        .json(Method::POST, "/api/orders/nope/upload", None, valid_upload())
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found");
}

#[tokio::test]
async fn second_upload_is_rejected() {
    let app = TestApp::new();
    app.json(Method::POST, "/api/orders", None, json!({ "id": "A1" }))
        .await;

    let (first, _) = app
        .json(Method::POST, "/api/orders/A1/upload", None, valid_upload())
        .await;
    let (second, body) = app
        .json(Method::POST, "/api/orders/A1/upload", None, valid_upload())
        .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Order already has uploads");
}

#[tokio::test]
async fn mistyped_upload_does_not_hide_order_state() {
    let app = TestApp::new();

    let (status, body) = app
        .json(
            Method::POST,
            "/api/orders/nope/upload",
            None,
            json!({ "songRequest": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found");

    app.json(Method::POST, "/api/orders", None, json!({ "id": "A1" }))
        .await;
    app.json(Method::POST, "/api/orders/A1/upload", None, valid_upload())
        .await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/orders/A1/upload",
            None,
            json!({ "videos": null }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Order already has uploads");
}

#[tokio::test]
async fn garbage_upload_body_is_invalid_upload_data() {
    let app = TestApp::new();
    app.json(Method::POST, "/api/orders", None, json!({ "id": "A1" }))
        .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/orders/A1/upload")
        .body(Body::from("definitely not json"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid upload data"));

    let token = app.seller().await;
    let (_, order) = app.get("/api/orders/A1", Some(&token)).await;
    assert_eq!(order["hasUploaded"], false);
}

#[tokio::test]
async fn padded_order_id_is_trimmed_before_the_length_check() {
    let app = TestApp::new();
    let id = "x".repeat(128);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/orders",
            None,
            json!({ "id": format!("  {}  ", id) }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], id.as_str());

    let (status, _) = app
        .json(
            Method::POST,
            "/api/orders",
            None,
            json!({ "id": "y".repeat(129) }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_upload_is_rejected() {
    let app = TestApp::new();
    app.json(Method::POST, "/api/orders", None, json!({ "id": "A1" }))
        .await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/orders/A1/upload",
            None,
            json!({ "videos": [], "images": [], "songRequest": "" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid upload data"));
}

#[tokio::test]
async fn dashboard_routes_require_authentication() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/orders", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");

    let (status, _) = app.get("/api/orders", Some("not-a-session")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/orders/A1", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.delete("/api/orders/A1", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn basic_authorization_is_malformed() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/api/orders")
        .header(header::AUTHORIZATION, "Basic c2VsbGVyOnB3")
        .body(Body::empty())
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Authorization must be Bearer");
}

#[tokio::test]
async fn list_and_search_orders() {
    let app = TestApp::new();
    let token = app.seller().await;

    for id in ["Wedding-1", "wedding-2", "Birthday"] {
        app.json(Method::POST, "/api/orders", None, json!({ "id": id }))
            .await;
    }

    let (status, all) = app.get("/api/orders", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (status, found) = app.get("/api/orders?search=WEDDING", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = TestApp::new();
    let token = app.seller().await;
    app.json(Method::POST, "/api/orders", None, json!({ "id": "A1" }))
        .await;

    let (status, _) = app.delete("/api/orders/A1", Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.delete("/api/orders/A1", Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/orders/A1", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_and_logout() {
    let app = TestApp::new();
    app.seller().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/login",
            None,
            json!({ "username": "seller", "password": "wrong password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/login",
            None,
            json!({ "username": "seller", "password": "correct horse" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "seller");
    assert!(body["user"].get("password").is_none());

    let token = body["token"].as_str().unwrap().to_string();

    let (status, user) = app.get("/api/user", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["username"], "seller");

    let (status, _) = app
        .json(Method::POST, "/api/logout", Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/user", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() {
    let app = TestApp::new();
    app.seller().await;

    let (status, _) = app
        .json(
            Method::POST,
            "/api/register",
            None,
            json!({ "username": "seller", "password": "another password" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/register",
            None,
            json!({ "username": "x", "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn file_upload_returns_blob_url() {
    let app = TestApp::new();

    let (status, body) = app.upload_file("file", b"png bytes").await;
    assert_eq!(status, StatusCode::OK);

    let url = body["url"].as_str().unwrap();
    let key = url.strip_prefix("memory://blobs/").expect("url points at the store");

    let stored = app.blobs.get(key).expect("blob is stored");
    assert_eq!(stored.bytes, b"png bytes");
    assert_eq!(stored.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn oversize_file_never_reaches_the_blob_store() {
    let app = TestApp::new();

    let (status, body) = app
        .upload_file("file", &vec![0; MAX_FILE_SIZE + 1])
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File size cannot exceed 3MB");
    assert!(app.blobs.is_empty());
}

#[tokio::test]
async fn body_over_the_http_limit_is_too_large() {
    let app = TestApp::new();

    let (status, body) = app.upload_file("file", &vec![0; 4 * 1024 * 1024]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File size cannot exceed 3MB");
    assert!(app.blobs.is_empty());
}

#[tokio::test]
async fn upload_without_file_field() {
    let app = TestApp::new();

    let (status, body) = app.upload_file("attachment", b"png bytes").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");
    assert!(app.blobs.is_empty());
}

#[tokio::test]
async fn api_document_lists_order_routes() {
    let app = TestApp::new();

    let (status, doc) = app.get("/api/docs.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"].get("/api/orders").is_some());
    assert!(doc["paths"].get("/api/orders/{id}/upload").is_some());
}
