//! Bounce persistence

use std::sync::Arc;

use async_trait::async_trait;
use mailroom_entities::bounces;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
    TransactionTrait,
};
use tracing::debug;

use crate::errors::BounceError;
use crate::query::BounceQuery;
use crate::selection::BounceSelection;
use crate::types::{Bounce, BounceRow, NewBounce};

#[async_trait]
pub trait BounceStore: Send + Sync {
    /// Insert a batch atomically; returns the stored rows in input order
    async fn insert(&self, bounces: Vec<NewBounce>) -> Result<Vec<Bounce>, BounceError>;

    async fn get(&self, id: i64) -> Result<Option<Bounce>, BounceError>;

    /// One page of matching rows, each carrying the overall match count
    async fn query(&self, query: &BounceQuery) -> Result<Vec<BounceRow>, BounceError>;

    /// Returns the number of rows removed
    async fn delete(&self, selection: &BounceSelection) -> Result<u64, BounceError>;
}

pub struct SeaOrmBounceStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmBounceStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn active_model(bounce: NewBounce) -> bounces::ActiveModel {
    bounces::ActiveModel {
        id: NotSet,
        subscriber_uuid: Set(bounce.subscriber_uuid),
        email: Set(bounce.email),
        campaign_id: Set(bounce.campaign_id),
        source: Set(bounce.source),
        meta: Set(bounce.meta),
        created_at: Set(bounce.created_at),
    }
}

#[async_trait]
impl BounceStore for SeaOrmBounceStore {
    async fn insert(&self, mut bounces: Vec<NewBounce>) -> Result<Vec<Bounce>, BounceError> {
        if bounces.len() <= 1 {
            return match bounces.pop() {
                Some(bounce) => {
                    let model = active_model(bounce).insert(self.db.as_ref()).await?;
                    Ok(vec![model.into()])
                }
                None => Ok(Vec::new()),
            };
        }

        debug!("Inserting {} bounces in one transaction", bounces.len());
        let txn = self.db.begin().await?;
        let mut stored = Vec::with_capacity(bounces.len());
        for bounce in bounces {
            stored.push(active_model(bounce).insert(&txn).await?.into());
        }
        txn.commit().await?;
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Option<Bounce>, BounceError> {
        let model = bounces::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(model.map(Bounce::from))
    }

    async fn query(&self, query: &BounceQuery) -> Result<Vec<BounceRow>, BounceError> {
        let rows = query
            .select()
            .into_model::<BounceRow>()
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    async fn delete(&self, selection: &BounceSelection) -> Result<u64, BounceError> {
        let delete = bounces::Entity::delete_many();
        let delete = match selection {
            BounceSelection::All => delete,
            BounceSelection::Ids(ids) => delete.filter(bounces::Column::Id.is_in(ids.clone())),
        };

        let result = delete.exec(self.db.as_ref()).await?;
        Ok(result.rows_affected)
    }
}
