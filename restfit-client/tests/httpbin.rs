//! End-to-end tests against a local httpbin-style echo server.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{OriginalUri, Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{any, delete, get, patch, post, put};
use axum::{Json, Router};
use futures::StreamExt;
use parking_lot::Mutex;
use restfit_client::{
    CallArgs, Callback, ClientError, EndpointDefinition, ErrorKind, HyperTransport, MainQueue,
    Observer, ParamType, Phase, RestAdapter, ServiceDefinition, Service,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Echo {
    url: String,
    #[serde(default)]
    args: HashMap<String, String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    form: HashMap<String, String>,
    #[serde(default)]
    data: String,
    #[serde(default)]
    json: Option<Value>,
}

async fn echo(
    OriginalUri(uri): OriginalUri,
    Query(args): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let content_type = headers.get("content-type").cloned().unwrap_or_default();
    let form: HashMap<String, String> =
        if content_type.starts_with("application/x-www-form-urlencoded") {
            form_urlencoded::parse(body.as_bytes()).into_owned().collect()
        } else {
            HashMap::new()
        };
    let json_body: Option<Value> = if content_type.starts_with("application/json") {
        serde_json::from_str(&body).ok()
    } else {
        None
    };
    Json(json!({
        "url": uri.to_string(),
        "args": args,
        "headers": headers,
        "form": form,
        "data": body,
        "json": json_body,
    }))
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn delay(Path(seconds): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    Json(json!({ "url": format!("/delay/{seconds}") }))
}

/// Start the echo server and return its base URL.
async fn serve() -> String {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let app = Router::new()
        .route("/get", get(echo))
        .route("/post", post(echo))
        .route("/put", put(echo))
        .route("/patch", patch(echo))
        .route("/delete", delete(echo))
        .route("/status/{code}", any(status))
        .route("/delay/{seconds}", get(delay));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn httpbin() -> ServiceDefinition {
    ServiceDefinition::new("HttpBin")
        .header("Accept: application/json")
        .endpoint(
            EndpointDefinition::get("get", "/get")
                .query("query1", ParamType::Text)
                .query("query2", ParamType::Integer)
                .returns_stream(),
        )
        .endpoint(
            EndpointDefinition::get("search", "/get")
                .query_map("options")
                .returns_stream(),
        )
        .endpoint(
            EndpointDefinition::post("post", "/post")
                .field("field1", ParamType::Text)
                .field("field2", ParamType::Float)
                .callback(),
        )
        .endpoint(
            EndpointDefinition::put("put", "/put")
                .headers(["time: 123"])
                .body("user")
                .header("client", ParamType::Text)
                .returns_stream(),
        )
        .endpoint(
            EndpointDefinition::patch("patch", "/patch")
                .field("name", ParamType::Text)
                .returns_stream(),
        )
        .endpoint(
            EndpointDefinition::delete("delete", "/delete")
                .query("id", ParamType::Integer)
                .callback(),
        )
        .endpoint(
            EndpointDefinition::get("status", "/status/{code}")
                .path("code", ParamType::Integer)
                .returns_stream(),
        )
        .endpoint(
            EndpointDefinition::get("delay", "/delay/{seconds}")
                .path("seconds", ParamType::Integer)
                .returns_stream(),
        )
        .endpoint(
            EndpointDefinition::post("upload", "/post")
                .multipart()
                .part("file", ParamType::File)
                .field("title", ParamType::Text)
                .returns_stream(),
        )
}

async fn service(base_url: &str) -> Service {
    RestAdapter::builder(base_url)
        .build()
        .unwrap()
        .create(&httpbin())
        .unwrap()
}

#[tokio::test]
async fn test_get_with_query_parameters() {
    let base = serve().await;
    let api = service(&base).await;

    let echo: Echo = api
        .call("get", CallArgs::new().arg("abc").arg(123))
        .await
        .unwrap();
    assert_eq!(echo.url, "/get?query1=abc&query2=123");
    assert_eq!(echo.args["query1"], "abc");
    assert_eq!(echo.args["query2"], "123");
    assert_eq!(echo.headers["accept"], "application/json");
}

#[tokio::test]
async fn test_query_map_is_encoded() {
    let base = serve().await;
    let api = service(&base).await;

    let echo: Echo = api
        .call("search", CallArgs::new().map([("q", "a b&c"), ("page", "2")]))
        .await
        .unwrap();
    assert_eq!(echo.url, "/get?q=a%20b%26c&page=2");
    assert_eq!(echo.args["q"], "a b&c");
}

#[tokio::test]
async fn test_post_fields_through_callback() {
    let base = serve().await;
    let api = service(&base).await;

    let (tx, rx) = tokio::sync::oneshot::channel();
    api.enqueue::<Echo>(
        "post",
        CallArgs::new().arg("abc").arg(123.456f32),
        Callback::from_result(move |result| {
            let _ = tx.send(result);
        }),
    );
    let echo = rx.await.unwrap().unwrap();
    assert_eq!(echo.form["field1"], "abc");
    assert_eq!(echo.form["field2"], "123.456");
    assert!(
        echo.headers["content-type"].starts_with("application/x-www-form-urlencoded"),
        "{:?}",
        echo.headers
    );
}

#[tokio::test]
async fn test_put_json_body_and_headers() {
    let base = serve().await;
    let api = service(&base).await;

    let echo: Echo = api
        .call(
            "put",
            CallArgs::new().body(&json!({ "name": "unity" })).arg("unity"),
        )
        .await
        .unwrap();
    assert_eq!(echo.json, Some(json!({ "name": "unity" })));
    assert_eq!(echo.headers["time"], "123");
    assert_eq!(echo.headers["client"], "unity");
    assert_eq!(echo.headers["accept"], "application/json");
    assert!(echo.headers["content-type"].starts_with("application/json"));
}

#[tokio::test]
async fn test_patch_as_stream() {
    let base = serve().await;
    let api = service(&base).await;

    let items: Vec<Result<Echo, ClientError>> = api
        .call("patch", CallArgs::new().arg("restfit"))
        .into_stream()
        .collect()
        .await;
    assert_eq!(items.len(), 1);
    let echo = items.into_iter().next().unwrap().unwrap();
    assert_eq!(echo.form["name"], "restfit");
}

#[tokio::test]
async fn test_delete_on_main_queue() {
    let base = serve().await;
    let queue = MainQueue::new();
    let api = RestAdapter::builder(&base)
        .deliver_on(queue.clone())
        .build()
        .unwrap()
        .create(&httpbin())
        .unwrap();

    let delivered = Arc::new(Mutex::new(None));
    let slot = delivered.clone();
    api.enqueue::<Echo>(
        "delete",
        CallArgs::new().arg(7),
        Callback::new(
            move |echo: Echo| *slot.lock() = Some(echo.args["id"].clone()),
            |message: String| panic!("unexpected error: {message}"),
        ),
    );
    assert!(delivered.lock().is_none());

    queue.run_next().await;
    assert_eq!(delivered.lock().as_deref(), Some("7"));
}

#[tokio::test]
async fn test_multipart_upload() {
    let base = serve().await;
    let api = service(&base).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello multipart").unwrap();

    let echo: Echo = api
        .call("upload", CallArgs::new().arg(path).arg("my notes"))
        .await
        .unwrap();
    assert!(echo.headers["content-type"].starts_with("multipart/form-data; boundary="));
    assert!(echo.data.contains("name=\"file\"; filename=\"notes.txt\""));
    assert!(echo.data.contains("hello multipart"));
    assert!(echo.data.contains("name=\"title\""));
    assert!(echo.data.contains("my notes"));
}

#[tokio::test]
async fn test_status_404_is_http_error() {
    let base = serve().await;
    let api = service(&base).await;

    let err = api
        .call::<Echo>("status", CallArgs::new().arg(404))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.url(), Some(format!("{base}/status/404").as_str()));
    assert!(err.to_string().starts_with("error code :404"));
}

#[tokio::test]
async fn test_empty_body_is_conversion_error() {
    let base = serve().await;
    let api = service(&base).await;

    let err = api
        .call::<Echo>("status", CallArgs::new().arg(200))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);

    // Raw text skips conversion.
    let body: String = api.call("status", CallArgs::new().arg(200)).await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let base = serve().await;
    let api = RestAdapter::builder(&base)
        .transport(
            HyperTransport::builder()
                .timeout(Duration::from_millis(200))
                .build(),
        )
        .build()
        .unwrap()
        .create(&httpbin())
        .unwrap();

    let err = api
        .call::<Echo>("delay", CallArgs::new().arg(3))
        .await
        .unwrap_err();
    assert!(err.is_network());
    assert!(err.to_string().contains("timed out"));
    assert!(err.to_string().contains(&format!("{base}/delay/3")));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = service(&format!("http://{addr}")).await;
    let err = api
        .call::<Echo>("get", CallArgs::new().arg("abc").arg(1))
        .await
        .unwrap_err();
    assert!(err.is_network());
}

#[derive(Clone, Default)]
struct Counter(Arc<AtomicUsize>);

impl Observer<Echo> for Counter {
    fn on_next(&mut self, _value: Echo) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
    fn on_error(&mut self, _error: ClientError) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
    fn on_completed(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_dispose_in_flight_suppresses_result() {
    let base = serve().await;
    let api = service(&base).await;

    let events = Counter::default();
    let subscription = api
        .call::<Echo>("delay", CallArgs::new().arg(1))
        .subscribe(events.clone());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(subscription.phase(), Some(Phase::Sent));

    subscription.dispose();
    assert!(subscription.is_disposed());

    // Outlive the server's reply.
    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert_eq!(events.0.load(Ordering::SeqCst), 0);
}
