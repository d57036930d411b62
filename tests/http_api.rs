use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mediafire_relay::notify::{FileNotice, NotifyError, NotifySink};
use mediafire_relay::relay::RelayService;
use mediafire_relay::request::RecipientId;
use mediafire_relay::resolver::{ApiShape, ApiStrategy, ResolutionPipeline, ResolverStrategy};
use mediafire_relay::server::{router, AppState};
use mediafire_relay::size::{SizeInfo, SizeProbe};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SOURCE: &str = "https://www.mediafire.com/file/q1w2e3/report.pdf/file";
const DIRECT: &str = "https://download2210.mediafire.com/q1w2e3/report.pdf";

/// Records deliveries and answers with a preset result.
#[derive(Default)]
struct RecordingSink {
    notices: Mutex<Vec<(RecipientId, FileNotice)>>,
    replies: Mutex<Vec<(RecipientId, String)>>,
    failure: Option<NotifyError>,
}

impl RecordingSink {
    fn failing(err: NotifyError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    fn notices(&self) -> Vec<(RecipientId, FileNotice)> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    fn replies(&self) -> Vec<(RecipientId, String)> {
        self.replies.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn outcome(&self) -> Result<(), NotifyError> {
        self.failure.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl NotifySink for RecordingSink {
    async fn notify(&self, recipient: RecipientId, notice: &FileNotice) -> Result<(), NotifyError> {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push((recipient, notice.clone()));
        }
        self.outcome()
    }

    async fn reply(&self, recipient: RecipientId, text: &str) -> Result<(), NotifyError> {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push((recipient, text.to_string()));
        }
        self.outcome()
    }
}

struct FixedProbe(SizeInfo);

#[async_trait]
impl SizeProbe for FixedProbe {
    async fn probe(&self, _direct_link: &str) -> SizeInfo {
        self.0
    }
}

async fn upstream_with_file() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mediafiredl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{ "nama": "report.pdf", "link": DIRECT }]
        })))
        .mount(&server)
        .await;
    server
}

async fn upstream_without_file() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mediafiredl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": [] })))
        .mount(&server)
        .await;
    server
}

fn app(upstream: &MockServer, sink: Arc<RecordingSink>) -> Result<Router> {
    let strategies: Vec<Arc<dyn ResolverStrategy>> = vec![Arc::new(ApiStrategy::new(
        "vreden",
        format!("{}/api/mediafiredl?url={{url}}", upstream.uri()),
        ApiShape::ResultList,
        Duration::from_secs(5),
        "relay-tests/1.0",
    )?)];
    let pipeline = Arc::new(ResolutionPipeline::new(
        "mediafire.com",
        strategies,
        Duration::from_secs(5),
    ));
    let probe = Arc::new(FixedProbe(SizeInfo::Known(1536)));

    Ok(router(AppState {
        relay: RelayService::new(pipeline, probe, sink),
        bot_username: Some("mf_relay_bot".to_string()),
    }))
}

async fn send(app: Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn post_json(uri: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

#[tokio::test]
async fn test_download_sends_details_to_telegram() -> Result<()> {
    let upstream = upstream_with_file().await;
    let sink = Arc::new(RecordingSink::default());

    let (status, body) = send(
        app(&upstream, sink.clone())?,
        post_json(
            "/api/download",
            &json!({ "url": SOURCE, "telegramId": "123456789" }),
        )?,
    )
    .await?;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["fileName"], "report.pdf");
    assert_eq!(body["fileSize"], "1.50 KB");
    assert_eq!(body["telegramId"], "123456789");

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, RecipientId(123_456_789));
    assert_eq!(notices[0].1.link, DIRECT);
    Ok(())
}

#[tokio::test]
async fn test_numeric_telegram_id_is_accepted() -> Result<()> {
    let upstream = upstream_with_file().await;
    let sink = Arc::new(RecordingSink::default());

    let (status, body) = send(
        app(&upstream, sink.clone())?,
        post_json("/api/download", &json!({ "url": SOURCE, "telegramId": 42 }))?,
    )
    .await?;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["telegramId"], "42");
    Ok(())
}

#[tokio::test]
async fn test_link_without_scheme_is_resolved() -> Result<()> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mediafiredl"))
        .and(query_param("url", SOURCE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{ "nama": "report.pdf", "link": DIRECT }]
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    let sink = Arc::new(RecordingSink::default());

    let bare = SOURCE.trim_start_matches("https://");
    let (status, body) = send(
        app(&upstream, sink.clone())?,
        post_json("/api/download", &json!({ "url": bare, "telegramId": "7" }))?,
    )
    .await?;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(sink.notices().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_resolution() -> Result<()> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let cases = [
        (json!({ "telegramId": "1" }), "URL is required"),
        (json!({ "url": SOURCE }), "Telegram ID is required"),
        (
            json!({ "url": "https://drive.google.com/file/d/x", "telegramId": "1" }),
            "URL must be a mediafire.com link",
        ),
        (
            json!({ "url": SOURCE, "telegramId": "@someone" }),
            "Telegram ID must be numeric",
        ),
    ];

    for (payload, expected) in cases {
        let sink = Arc::new(RecordingSink::default());
        let (status, body) = send(
            app(&upstream, sink.clone())?,
            post_json("/api/download", &payload)?,
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["error"], expected);
        assert!(sink.notices().is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() -> Result<()> {
    let upstream = MockServer::start().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/download")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;

    let (status, body) = send(app(&upstream, Arc::default())?, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_unresolvable_link_is_not_found() -> Result<()> {
    let upstream = upstream_without_file().await;
    let sink = Arc::new(RecordingSink::default());

    let (status, body) = send(
        app(&upstream, sink.clone())?,
        post_json("/api/download", &json!({ "url": SOURCE, "telegramId": "7" }))?,
    )
    .await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "File not found on MediaFire");
    let details = body["details"].as_str().unwrap_or_default();
    assert!(details.contains("result list is empty"), "{details}");
    assert!(sink.notices().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_recipient_gets_start_guidance() -> Result<()> {
    let upstream = upstream_with_file().await;
    let sink = Arc::new(RecordingSink::failing(NotifyError::RecipientUnreachable(
        "Bad Request: chat not found".into(),
    )));

    let (status, body) = send(
        app(&upstream, sink)?,
        post_json("/api/download", &json!({ "url": SOURCE, "telegramId": "7" }))?,
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["details"].as_str().unwrap_or_default();
    assert!(details.contains("@mf_relay_bot"), "{details}");
    assert!(details.contains("/start"), "{details}");
    Ok(())
}

#[tokio::test]
async fn test_other_telegram_failure_is_server_error() -> Result<()> {
    let upstream = upstream_with_file().await;
    let sink = Arc::new(RecordingSink::failing(NotifyError::Delivery(
        "Too Many Requests: retry after 30".into(),
    )));

    let (status, body) = send(
        app(&upstream, sink)?,
        post_json("/api/download", &json!({ "url": SOURCE, "telegramId": "7" }))?,
    )
    .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"], "Too Many Requests: retry after 30");
    Ok(())
}

#[tokio::test]
async fn test_lookup_returns_direct_link_without_notifying() -> Result<()> {
    let upstream = upstream_with_file().await;
    let sink = Arc::new(RecordingSink::default());
    let uri = format!("/api/download?url={}", urlencoding::encode(SOURCE));

    let (status, body) = send(
        app(&upstream, sink.clone())?,
        Request::builder().uri(uri).body(Body::empty())?,
    )
    .await?;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["downloadUrl"], DIRECT);
    assert_eq!(body["fileName"], "report.pdf");
    assert_eq!(body["fileSize"], "1.50 KB");
    assert!(sink.notices().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_lookup_without_url_is_bad_request() -> Result<()> {
    let upstream = MockServer::start().await;
    let (status, body) = send(
        app(&upstream, Arc::default())?,
        Request::builder().uri("/api/download").body(Body::empty())?,
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL is required");
    Ok(())
}

#[tokio::test]
async fn test_webhook_start_replies_with_id() -> Result<()> {
    let upstream = MockServer::start().await;
    let sink = Arc::new(RecordingSink::default());
    let update = json!({
        "update_id": 10,
        "message": {
            "message_id": 1,
            "date": 0,
            "chat": { "id": 987_654, "type": "private" },
            "from": { "id": 987_654, "is_bot": false, "first_name": "Dana" },
            "text": "/start"
        }
    });

    let (status, body) = send(
        app(&upstream, sink.clone())?,
        post_json("/api/webhook", &update)?,
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    let replies = sink.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, RecipientId(987_654));
    assert!(replies[0].1.contains("<code>987654</code>"));
    Ok(())
}

#[tokio::test]
async fn test_webhook_ignores_other_updates() -> Result<()> {
    let upstream = MockServer::start().await;
    let sink = Arc::new(RecordingSink::default());
    let chatter = json!({
        "update_id": 11,
        "message": { "message_id": 2, "chat": { "id": 5 }, "text": "hello" }
    });

    let (status, body) = send(
        app(&upstream, sink.clone())?,
        post_json("/api/webhook", &chatter)?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let garbage = Request::builder()
        .method(Method::POST)
        .uri("/api/webhook")
        .body(Body::from("not an update"))?;
    let (status, body) = send(app(&upstream, sink.clone())?, garbage).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    assert!(sink.replies().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_webhook_acknowledges_even_when_reply_fails() -> Result<()> {
    let upstream = MockServer::start().await;
    let sink = Arc::new(RecordingSink::failing(NotifyError::Delivery("boom".into())));
    let update = json!({
        "message": { "chat": { "id": 3 }, "from": { "id": 3, "first_name": "Lee" }, "text": "/id" }
    });

    let (status, body) = send(app(&upstream, sink)?, post_json("/api/webhook", &update)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    Ok(())
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let upstream = MockServer::start().await;
    let (status, body) = send(
        app(&upstream, Arc::default())?,
        Request::builder().uri("/health").body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}
