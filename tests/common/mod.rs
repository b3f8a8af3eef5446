use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let router = longbox::build_app(pool.clone(), false).await;

        Self { router, db: pool }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a user in the database and return (user_id, invite_code).
    pub async fn create_user(&self, name: &str) -> (String, String) {
        let id = uuid::Uuid::new_v4().to_string();
        let invite_code = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (id, name, invite_code, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(&invite_code)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await
        .expect("Failed to create test user");

        (id, invite_code)
    }

    /// Log in as the given user and return the session cookie string.
    pub async fn login(&self, invite_code: &str) -> String {
        let body = serde_json::json!({ "inviteCode": invite_code }).to_string();
        let req = Request::builder()
            .uri("/login")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let resp = self.request(req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        resp.headers()
            .get("set-cookie")
            .expect("Login should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a JSON request with the given method and optional session cookie.
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response {
        self.send_json("POST", uri, body, cookie).await
    }

    pub async fn put_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response {
        self.send_json("PUT", uri, body, cookie).await
    }

    /// Send a POST request with an empty body and optional session cookie.
    pub async fn post_empty(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri).method("POST");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a DELETE request with an optional session cookie.
    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri).method("DELETE");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Read the full response body as parsed JSON.
pub async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Response body should be valid JSON")
}

/// Insert a recommended collection with minimal metadata and return its id.
pub async fn insert_recommended(db: &SqlitePool, name: &str, updated_at: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO recommended_collections (id, name, tags, created_at, updated_at) VALUES (?, ?, '', ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(updated_at)
    .bind(updated_at)
    .execute(db)
    .await
    .expect("Failed to insert recommended collection");
    id
}

pub async fn insert_recommended_item(
    db: &SqlitePool,
    recommended_id: &str,
    name: &str,
    number: Option<i64>,
    image: Option<&str>,
    position: i64,
) {
    sqlx::query(
        "INSERT INTO recommended_items (id, recommended_id, name, number, image, position) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(recommended_id)
    .bind(name)
    .bind(number)
    .bind(image)
    .bind(position)
    .execute(db)
    .await
    .expect("Failed to insert recommended item");
}

/// Insert a collection row with minimal metadata and return its id.
pub async fn insert_collection(
    db: &SqlitePool,
    owner_id: &str,
    name: &str,
    source_id: Option<&str>,
    created_at: &str,
    last_synced_at: Option<&str>,
) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO collections (id, owner_id, name, tags, source_id, last_synced_at, created_at, updated_at)
        VALUES (?, ?, ?, '', ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(owner_id)
    .bind(name)
    .bind(source_id)
    .bind(last_synced_at)
    .bind(created_at)
    .bind(created_at)
    .execute(db)
    .await
    .expect("Failed to insert collection");
    id
}

pub async fn insert_collection_item(
    db: &SqlitePool,
    collection_id: &str,
    name: &str,
    number: Option<i64>,
    image: Option<&str>,
    position: i64,
) {
    sqlx::query(
        "INSERT INTO collection_items (id, collection_id, name, number, image, position) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(collection_id)
    .bind(name)
    .bind(number)
    .bind(image)
    .bind(position)
    .execute(db)
    .await
    .expect("Failed to insert collection item");
}
