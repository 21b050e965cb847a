//! Router-level tests for the bounce endpoints, backed by an in-memory store

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mailroom_bounces::handlers::{configure_routes, AppState};
use mailroom_bounces::types::BounceRow;
use mailroom_bounces::{
    Bounce, BounceError, BounceQuery, BounceRecorder, BounceSelection, BounceService,
    BounceStore, NewBounce, SnsConfirmer,
};
use mailroom_core::{I18n, PaginationSettings};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use url::Url;

#[derive(Default)]
struct MemoryStore {
    rows: Mutex<Vec<Bounce>>,
    queries: Mutex<Vec<BounceQuery>>,
    deletes: Mutex<Vec<BounceSelection>>,
}

#[async_trait]
impl BounceStore for MemoryStore {
    async fn insert(&self, bounces: Vec<NewBounce>) -> Result<Vec<Bounce>, BounceError> {
        let mut rows = self.rows.lock().unwrap();
        let mut stored = Vec::new();
        for b in bounces {
            let bounce = Bounce {
                id: rows.len() as i64 + 1,
                subscriber_uuid: b.subscriber_uuid,
                email: b.email,
                campaign_id: b.campaign_id,
                source: b.source,
                meta: b.meta,
                created_at: b.created_at,
            };
            rows.push(bounce.clone());
            stored.push(bounce);
        }
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Option<Bounce>, BounceError> {
        Ok(self.rows.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn query(&self, query: &BounceQuery) -> Result<Vec<BounceRow>, BounceError> {
        self.queries.lock().unwrap().push(query.clone());
        let rows = self.rows.lock().unwrap();
        let total = rows.len() as i64;
        Ok(rows
            .iter()
            .take(query.pagination.limit as usize)
            .cloned()
            .map(|b| BounceRow {
                id: b.id,
                subscriber_uuid: b.subscriber_uuid,
                email: b.email,
                campaign_id: b.campaign_id,
                source: b.source,
                meta: b.meta,
                created_at: b.created_at,
                total,
            })
            .collect())
    }

    async fn delete(&self, selection: &BounceSelection) -> Result<u64, BounceError> {
        self.deletes.lock().unwrap().push(selection.clone());
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        match selection {
            BounceSelection::All => rows.clear(),
            BounceSelection::Ids(ids) => rows.retain(|b| !ids.contains(&b.id)),
        }
        Ok((before - rows.len()) as u64)
    }
}

struct FailingRecorder(mpsc::UnboundedSender<i64>);

#[async_trait]
impl BounceRecorder for FailingRecorder {
    async fn record(&self, bounce: &Bounce) -> anyhow::Result<()> {
        let _ = self.0.send(bounce.id);
        anyhow::bail!("blocklist unavailable")
    }
}

struct RejectingConfirmer;

#[async_trait]
impl SnsConfirmer for RejectingConfirmer {
    async fn confirm(&self, _subscribe_url: &Url) -> Result<(), BounceError> {
        Err(BounceError::Confirmation("403 Forbidden".to_string()))
    }
}

struct TestSetup {
    store: Arc<MemoryStore>,
    recorded: mpsc::UnboundedReceiver<i64>,
    app: Router,
}

impl TestSetup {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let (tx, recorded) = mpsc::unbounded_channel();
        let service = Arc::new(BounceService::new(
            store.clone(),
            Arc::new(FailingRecorder(tx)),
            Arc::new(RejectingConfirmer),
            PaginationSettings::default(),
        ));
        let state = Arc::new(AppState {
            bounce_service: service,
            i18n: Arc::new(I18n::default()),
        });

        Self {
            store,
            recorded,
            app: configure_routes().with_state(state),
        }
    }

    async fn send(&self, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn ingest(&self, email: &str) {
        let (status, _) = self
            .send("POST", "/webhooks/bounce", &json!({ "email": email }).to_string())
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_native_webhook_stores_lowercased_email() {
    let mut setup = TestSetup::new();

    let (status, body) = setup
        .send(
            "POST",
            "/webhooks/bounce",
            r#"{"email": "User@Example.COM", "campaign_id": 3}"#,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": true }));

    let rows = setup.store.rows.lock().unwrap().clone();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].email, "user@example.com");
    assert_eq!(rows[0].meta, json!({}));

    // The failing recorder still ran, and the request was acknowledged anyway
    assert_eq!(setup.recorded.recv().await, Some(1));
}

#[tokio::test]
async fn test_subscriber_uuid_alone_is_enough() {
    let setup = TestSetup::new();
    let subscriber = uuid::Uuid::new_v4().to_string().to_uppercase();

    let (status, _) = setup
        .send(
            "POST",
            "/webhooks/bounce",
            &json!({ "subscriber_uuid": &subscriber, "source": "api" }).to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let rows = setup.store.rows.lock().unwrap();
    assert_eq!(rows[0].subscriber_uuid, subscriber);
    assert_eq!(rows[0].email, "");
    assert_eq!(rows[0].source, "api");
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected() {
    let setup = TestSetup::new();

    let cases = [
        ("/webhooks/bounce", "{}", "INVALID_DATA"),
        ("/webhooks/bounce", r#"{"email": "nope"}"#, "INVALID_EMAIL"),
        ("/webhooks/bounce", r#"{"subscriber_uuid": "123"}"#, "INVALID_UUID"),
        ("/webhooks/bounce", "not json", "INVALID_PAYLOAD"),
        ("/webhooks/bounce/mailgun", "{}", "UNKNOWN_SERVICE"),
        ("/webhooks/bounce/sendgrid", r#"{"event": "bounce"}"#, "INVALID_PAYLOAD"),
    ];
    for (uri, body, code) in cases {
        let (status, problem) = setup.send("POST", uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
        assert_eq!(problem["error_code"], code, "{uri} {body}");
    }

    assert!(setup.store.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_overlong_fields_are_client_errors() {
    let setup = TestSetup::new();

    let long_email = json!({ "email": format!("{}@example.com", "a".repeat(300)) });
    let long_source = json!({ "email": "a@b.com", "source": "s".repeat(60) });
    for (body, code) in [(long_email, "INVALID_EMAIL"), (long_source, "INVALID_SOURCE")] {
        let (status, problem) = setup
            .send("POST", "/webhooks/bounce", &body.to_string())
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(problem["error_code"], code);
    }

    assert!(setup.store.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_null_identity_fields_are_treated_as_empty() {
    let setup = TestSetup::new();
    let subscriber = uuid::Uuid::new_v4().to_string();

    let (status, _) = setup
        .send(
            "POST",
            "/webhooks/bounce",
            &json!({ "email": null, "subscriber_uuid": &subscriber, "source": null }).to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let rows = setup.store.rows.lock().unwrap();
    assert_eq!(rows[0].email, "");
    assert_eq!(rows[0].subscriber_uuid, subscriber);
    assert_eq!(rows[0].source, "native");
}

#[tokio::test]
async fn test_sendgrid_webhook_keeps_only_bounce_events() {
    let setup = TestSetup::new();
    let body = json!([
        {"event": "bounce", "email": "a@example.com", "timestamp": 1760947200},
        {"event": "open", "email": "b@example.com", "timestamp": 1760947200},
        {"event": "spamreport", "email": "c@example.com", "timestamp": 1760947200}
    ]);

    let (status, _) = setup
        .send("POST", "/webhooks/bounce/sendgrid", &body.to_string())
        .await;
    assert_eq!(status, StatusCode::OK);

    let rows = setup.store.rows.lock().unwrap();
    let emails: Vec<&str> = rows.iter().map(|b| b.email.as_str()).collect();
    assert_eq!(emails, vec!["a@example.com", "c@example.com"]);
    assert!(rows.iter().all(|b| b.source == "sendgrid"));
}

#[tokio::test]
async fn test_ses_confirmation_failures() {
    let setup = TestSetup::new();

    let hostile = json!({
        "Type": "SubscriptionConfirmation",
        "SubscribeURL": "http://169.254.169.254/latest/meta-data"
    });
    let (status, problem) = setup
        .send("POST", "/webhooks/bounce/ses", &hostile.to_string())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["error_code"], "INVALID_SUBSCRIBE_URL");

    let genuine = json!({
        "Type": "SubscriptionConfirmation",
        "SubscribeURL": "https://sns.eu-west-1.amazonaws.com/?Action=ConfirmSubscription"
    });
    let (status, problem) = setup
        .send("POST", "/webhooks/bounce/ses", &genuine.to_string())
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(problem["error_code"], "SNS_CONFIRMATION_FAILED");
}

#[tokio::test]
async fn test_list_echoes_page_and_clamps_per_page() {
    let setup = TestSetup::new();
    setup.ingest("a@example.com").await;
    setup.ingest("b@example.com").await;

    let (status, body) = setup
        .send("GET", "/bounces?page=1&per_page=1000&order_by=DROP%20TABLE&order=sideways", "")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["per_page"], 50);
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 2);

    let queries = setup.store.queries.lock().unwrap();
    assert_eq!(queries[0].sort, mailroom_bounces::SortField::CreatedAt);
    assert_eq!(queries[0].order, mailroom_bounces::SortOrder::Desc);
    assert_eq!(queries[0].pagination.limit, 50);
}

#[tokio::test]
async fn test_campaign_listing_filters_by_path_id() {
    let setup = TestSetup::new();

    let (status, _) = setup
        .send("GET", "/campaigns/7/bounces?source=ses", "")
        .await;
    assert_eq!(status, StatusCode::OK);

    let queries = setup.store.queries.lock().unwrap();
    assert_eq!(queries[0].campaign_id, Some(7));
    assert_eq!(queries[0].source.as_deref(), Some("ses"));
}

#[tokio::test]
async fn test_get_single_and_missing() {
    let setup = TestSetup::new();
    setup.ingest("a@example.com").await;

    let (status, body) = setup.send("GET", "/bounces/1", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["results"]["email"], "a@example.com");

    let (status, body) = setup.send("GET", "/bounces/5", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["results"], json!([]));
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_invalid_path_ids() {
    let setup = TestSetup::new();

    for (method, uri) in [
        ("DELETE", "/bounces/0"),
        ("DELETE", "/bounces/abc"),
        ("DELETE", "/bounces/-1"),
        ("GET", "/campaigns/0/bounces"),
        ("GET", "/campaigns/99999999999/bounces"),
    ] {
        let (status, problem) = setup.send(method, uri, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(problem["error_code"], "INVALID_ID", "{method} {uri}");
    }
}

#[tokio::test]
async fn test_get_with_unusable_id_lists_instead() {
    let setup = TestSetup::new();
    for email in ["a@example.com", "b@example.com"] {
        setup.ingest(email).await;
    }

    for uri in ["/bounces/0", "/bounces/abc", "/bounces/-3?per_page=10"] {
        let (status, body) = setup.send("GET", uri, "").await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["data"]["results"].as_array().map(Vec::len), Some(2), "{uri}");
        assert_eq!(body["data"]["total"], 2, "{uri}");
    }

    let queries = setup.store.queries.lock().unwrap();
    assert!(queries.iter().all(|q| q.id.is_none()));
    assert_eq!(queries.last().map(|q| q.pagination.per_page), Some(10));
}

#[tokio::test]
async fn test_delete_by_ids_and_all() {
    let setup = TestSetup::new();
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        setup.ingest(email).await;
    }

    let (status, body) = setup.send("DELETE", "/bounces?id=1&id=3", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": true }));
    assert_eq!(setup.store.rows.lock().unwrap().len(), 1);

    let (status, _) = setup.send("DELETE", "/bounces/2", "").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = setup.send("DELETE", "/bounces?all=true", "").await;
    assert_eq!(status, StatusCode::OK);

    let deletes = setup.store.deletes.lock().unwrap();
    assert_eq!(
        *deletes,
        vec![
            BounceSelection::Ids(vec![1, 3]),
            BounceSelection::Ids(vec![2]),
            BounceSelection::All,
        ]
    );
}

#[tokio::test]
async fn test_delete_without_target_is_rejected() {
    let setup = TestSetup::new();
    setup.ingest("a@example.com").await;

    for uri in ["/bounces", "/bounces?all=false", "/bounces?id=1&id=x"] {
        let (status, problem) = setup.send("DELETE", uri, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(problem["error_code"], "INVALID_ID", "{uri}");
    }

    assert!(setup.store.deletes.lock().unwrap().is_empty());
    assert_eq!(setup.store.rows.lock().unwrap().len(), 1);
}
