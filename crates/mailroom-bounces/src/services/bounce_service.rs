//! Bounce ingestion, listing and deletion

use std::sync::Arc;

use mailroom_core::PaginationSettings;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::confirm::{validate_subscribe_url, SnsConfirmer};
use crate::errors::BounceError;
use crate::query::BounceQuery;
use crate::recorder::BounceRecorder;
use crate::selection::BounceSelection;
use crate::sources::{BounceSource, Normalized};
use crate::store::BounceStore;
use crate::types::{Bounce, BounceListing, BounceResults, NewBounce};
use crate::validation;

/// What an accepted webhook call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Number of bounces stored (zero for provider events that are not bounces)
    Stored(usize),
    SubscriptionConfirmed,
}

pub struct BounceService {
    store: Arc<dyn BounceStore>,
    recorder: Arc<dyn BounceRecorder>,
    confirmer: Arc<dyn SnsConfirmer>,
    pagination: PaginationSettings,
}

impl BounceService {
    pub fn new(
        store: Arc<dyn BounceStore>,
        recorder: Arc<dyn BounceRecorder>,
        confirmer: Arc<dyn SnsConfirmer>,
        pagination: PaginationSettings,
    ) -> Self {
        Self {
            store,
            recorder,
            confirmer,
            pagination,
        }
    }

    pub fn pagination(&self) -> PaginationSettings {
        self.pagination
    }

    /// Accept a webhook body from the provider named by `service`.
    ///
    /// Every record is validated before anything is written. Stored records
    /// are then handed to the recorder on detached tasks.
    pub async fn ingest(&self, service: &str, body: &[u8]) -> Result<IngestOutcome, BounceError> {
        let source = BounceSource::from_discriminator(service)?;

        let inputs = match source.normalize(body)? {
            Normalized::Bounces(inputs) => inputs,
            Normalized::SubscriptionConfirmation { subscribe_url } => {
                let url = validate_subscribe_url(&subscribe_url)?;
                self.confirmer.confirm(&url).await?;
                return Ok(IngestOutcome::SubscriptionConfirmed);
            }
        };

        let bounces = inputs
            .into_iter()
            .map(validation::accept)
            .collect::<Result<Vec<NewBounce>, _>>()?;

        if bounces.is_empty() {
            debug!("No bounces in {} payload", source);
            return Ok(IngestOutcome::Stored(0));
        }

        let stored = self.store.insert(bounces).await?;
        let count = stored.len();

        for bounce in stored {
            self.spawn_record(bounce);
        }

        Ok(IngestOutcome::Stored(count))
    }

    fn spawn_record(&self, bounce: Bounce) {
        let recorder = self.recorder.clone();
        let span = info_span!("record_bounce", bounce_id = bounce.id, source = %bounce.source);

        tokio::spawn(
            async move {
                if let Err(e) = recorder.record(&bounce).await {
                    error!("Error recording bounce: {:#}", e);
                }
            }
            .instrument(span),
        );
    }

    /// Read one bounce (positive `query.id`) or a page of bounces
    pub async fn list(&self, query: &BounceQuery) -> Result<BounceListing, BounceError> {
        if let Some(id) = query.single_id() {
            return Ok(match self.store.get(id).await? {
                Some(bounce) => BounceListing::single(bounce),
                None => BounceListing::not_found(),
            });
        }

        let rows = self.store.query(query).await?;
        let total = rows.first().map(|row| row.total).unwrap_or(0);

        Ok(BounceListing {
            results: BounceResults::Many(rows.into_iter().map(Bounce::from).collect()),
            total: Some(total),
            per_page: Some(query.pagination.per_page),
            page: Some(query.pagination.page),
        })
    }

    pub async fn delete(&self, selection: BounceSelection) -> Result<u64, BounceError> {
        if selection == BounceSelection::All {
            warn!("Deleting all bounces");
        }
        self.store.delete(&selection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::LoggingRecorder;
    use crate::types::BounceRow;
    use crate::validation::ValidationError as ValidationErrorKind;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use url::Url;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<Bounce>>,
        fail: bool,
    }

    #[async_trait]
    impl BounceStore for MemoryStore {
        async fn insert(&self, bounces: Vec<NewBounce>) -> Result<Vec<Bounce>, BounceError> {
            if self.fail {
                return Err(BounceError::Database(sea_orm::DbErr::Custom("down".into())));
            }
            let mut rows = self.rows.lock().unwrap();
            let stored: Vec<Bounce> = bounces
                .into_iter()
                .map(|b| Bounce {
                    id: rows.len() as i64 + 1,
                    subscriber_uuid: b.subscriber_uuid,
                    email: b.email,
                    campaign_id: b.campaign_id,
                    source: b.source,
                    meta: b.meta,
                    created_at: b.created_at,
                })
                .collect();
            rows.extend(stored.iter().cloned());
            Ok(stored)
        }

        async fn get(&self, id: i64) -> Result<Option<Bounce>, BounceError> {
            Ok(self.rows.lock().unwrap().iter().find(|b| b.id == id).cloned())
        }

        async fn query(&self, _query: &BounceQuery) -> Result<Vec<BounceRow>, BounceError> {
            let rows = self.rows.lock().unwrap();
            let total = rows.len() as i64;
            Ok(rows
                .iter()
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
            anyhow::bail!("subscriber service unavailable")
        }
    }

    #[derive(Default)]
    struct RecordingConfirmer(Mutex<Vec<String>>);

    #[async_trait]
    impl SnsConfirmer for RecordingConfirmer {
        async fn confirm(&self, subscribe_url: &Url) -> Result<(), BounceError> {
            self.0.lock().unwrap().push(subscribe_url.to_string());
            Ok(())
        }
    }

    fn service_with(store: Arc<MemoryStore>, recorder: Arc<dyn BounceRecorder>) -> BounceService {
        BounceService::new(
            store,
            recorder,
            Arc::new(RecordingConfirmer::default()),
            PaginationSettings::default(),
        )
    }

    fn service(store: Arc<MemoryStore>) -> BounceService {
        service_with(store, Arc::new(LoggingRecorder))
    }

    #[tokio::test]
    async fn test_native_ingest_normalizes_record() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(store.clone());

        let outcome = svc.ingest("", br#"{"email": "A@B.COM"}"#).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Stored(1));

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows[0].email, "a@b.com");
        assert_eq!(rows[0].meta, json!({}));
        assert_eq!(rows[0].source, "native");
        assert!((Utc::now() - rows[0].created_at).num_seconds().abs() < 5);
    }

    #[tokio::test]
    async fn test_validation_failures_store_nothing() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(store.clone());

        let cases: [(&[u8], ValidationErrorKind); 3] = [
            (&br#"{}"#[..], ValidationErrorKind::MissingIdentity),
            (&br#"{"email": "nope"}"#[..], ValidationErrorKind::InvalidEmail),
            (&br#"{"subscriber_uuid": "1234"}"#[..], ValidationErrorKind::InvalidUuid),
        ];
        for (body, expected) in cases {
            match svc.ingest("", body).await {
                Err(BounceError::Validation(kind)) => assert_eq!(kind, expected),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_invalid_record_rejects_whole_batch() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(store.clone());

        let body = json!([
            {"event": "bounce", "email": "good@example.com"},
            {"event": "bounce", "email": "not-an-email"}
        ]);
        let err = svc
            .ingest("sendgrid", body.to_string().as_bytes())
            .await
            .unwrap_err();

        assert!(matches!(err, BounceError::Validation(_)));
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let svc = service(Arc::new(MemoryStore::default()));
        assert!(matches!(
            svc.ingest("mailgun", b"{}").await,
            Err(BounceError::UnknownService(_))
        ));
    }

    #[tokio::test]
    async fn test_recorder_failure_still_acknowledges() {
        let store = Arc::new(MemoryStore::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let svc = service_with(store.clone(), Arc::new(FailingRecorder(tx)));

        let outcome = svc.ingest("", br#"{"email": "x@y.com"}"#).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Stored(1));

        // The detached task still ran against the stored record
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_is_returned() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..Default::default()
        });
        let svc = service(store);

        assert!(matches!(
            svc.ingest("", br#"{"email": "x@y.com"}"#).await,
            Err(BounceError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_ses_subscription_confirmation() {
        let confirmer = Arc::new(RecordingConfirmer::default());
        let svc = BounceService::new(
            Arc::new(MemoryStore::default()),
            Arc::new(LoggingRecorder),
            confirmer.clone(),
            PaginationSettings::default(),
        );

        let body = json!({
            "Type": "SubscriptionConfirmation",
            "SubscribeURL": "https://sns.us-east-1.amazonaws.com/?Action=ConfirmSubscription&Token=x"
        });
        let outcome = svc.ingest("ses", body.to_string().as_bytes()).await.unwrap();
        assert_eq!(outcome, IngestOutcome::SubscriptionConfirmed);
        assert_eq!(confirmer.0.lock().unwrap().len(), 1);

        let hostile = json!({
            "Type": "SubscriptionConfirmation",
            "SubscribeURL": "https://internal.example.com/admin"
        });
        assert!(matches!(
            svc.ingest("ses", hostile.to_string().as_bytes()).await,
            Err(BounceError::InvalidSubscribeUrl(_))
        ));
        assert_eq!(confirmer.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_single_and_missing() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(store.clone());
        svc.ingest("", br#"{"email": "x@y.com"}"#).await.unwrap();

        let found = svc
            .list(&BounceQuery {
                id: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(matches!(found.results, BounceResults::One(ref b) if b.id == 1));
        assert_eq!(found.total, None);

        let missing = svc
            .list(&BounceQuery {
                id: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(missing, BounceListing::not_found());
    }

    #[tokio::test]
    async fn test_list_page_takes_total_from_first_row() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(store.clone());
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            svc.ingest("", format!(r#"{{"email": "{email}"}}"#).as_bytes())
                .await
                .unwrap();
        }

        let listing = svc.list(&BounceQuery::default()).await.unwrap();
        assert_eq!(listing.total, Some(3));
        assert_eq!(listing.page, Some(1));
        assert_eq!(listing.per_page, Some(20));
    }

    #[tokio::test]
    async fn test_list_empty_is_not_an_error() {
        let svc = service(Arc::new(MemoryStore::default()));
        let listing = svc.list(&BounceQuery::default()).await.unwrap();
        assert_eq!(listing.results, BounceResults::Many(Vec::new()));
        assert_eq!(listing.total, Some(0));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(store.clone());
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            svc.ingest("", format!(r#"{{"email": "{email}"}}"#).as_bytes())
                .await
                .unwrap();
        }

        assert_eq!(svc.delete(BounceSelection::Ids(vec![2])).await.unwrap(), 1);
        assert_eq!(svc.delete(BounceSelection::All).await.unwrap(), 2);
        assert!(store.rows.lock().unwrap().is_empty());
    }
}
