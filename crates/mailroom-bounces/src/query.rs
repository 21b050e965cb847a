//! Read query assembly
//!
//! Sort keys and directions only ever reach SQL through the enums below, so a
//! user-supplied `order_by` can select a column but never inject text.

use mailroom_core::Pagination;
use mailroom_entities::bounces;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect, Select};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Email,
    CampaignId,
    Source,
    Id,
}

impl SortField {
    /// Anything outside the allow-list falls back to `created_at`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("created_at") => SortField::CreatedAt,
            Some("email") => SortField::Email,
            Some("campaign_id") => SortField::CampaignId,
            Some("source") => SortField::Source,
            Some("id") => SortField::Id,
            _ => SortField::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Email => "email",
            SortField::CampaignId => "campaign_id",
            SortField::Source => "source",
            SortField::Id => "id",
        }
    }

    fn column(&self) -> bounces::Column {
        match self {
            SortField::CreatedAt => bounces::Column::CreatedAt,
            SortField::Email => bounces::Column::Email,
            SortField::CampaignId => bounces::Column::CampaignId,
            SortField::Source => bounces::Column::Source,
            SortField::Id => bounces::Column::Id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Only `asc` and `desc` are recognized; anything else sorts descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn order(&self) -> Order {
        match self {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Resolved filters, sort and page window for a bounce read
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BounceQuery {
    pub id: Option<i64>,
    pub campaign_id: Option<i32>,
    pub source: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    pub pagination: Pagination,
}

impl BounceQuery {
    /// A positive id selects exactly one record and skips pagination
    pub fn single_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }

    /// Page query over the filters, with every row carrying the count of all
    /// matching rows as `total`.
    pub fn select(&self) -> Select<bounces::Entity> {
        let mut select = bounces::Entity::find();

        if let Some(campaign_id) = self.campaign_id.filter(|id| *id > 0) {
            select = select.filter(bounces::Column::CampaignId.eq(campaign_id));
        }

        if let Some(source) = self.source.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(bounces::Column::Source.eq(source));
        }

        select
            .column_as(Expr::cust("COUNT(*) OVER()"), "total")
            .order_by(self.sort.column(), self.order.order())
            .order_by(bounces::Column::Id, self.order.order())
            .offset(self.pagination.offset)
            .limit(self.pagination.limit)
    }
}
