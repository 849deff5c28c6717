use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::value_objects::enums::{
    invoice_statuses::InvoiceStatus, listing_statuses::ListingStatus, sort_order::SortOrder,
    subscription_statuses::SubscriptionStatus,
};

/// Tables the query gateway can aggregate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Listings,
    Users,
    Subscriptions,
    Invoices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Status,
    CreatedAt,
    CategoryId,
    SellerId,
    PriceMinor,
    ViewCount,
    IsVerified,
    LastLoginAt,
    UserId,
    PlanId,
    StartedAt,
    ExpiresAt,
    SubscriptionId,
    TotalAmountMinor,
    DueDate,
    PaidAt,
}

impl Field {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Field::PriceMinor | Field::ViewCount | Field::TotalAmountMinor
        )
    }

    /// Fields usable as a group key: they hold a uuid reference.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Field::CategoryId | Field::SellerId | Field::UserId | Field::PlanId
        )
    }
}

impl Entity {
    pub fn table_name(&self) -> &'static str {
        match self {
            Entity::Listings => "listings",
            Entity::Users => "users",
            Entity::Subscriptions => "subscriptions",
            Entity::Invoices => "invoices",
        }
    }

    /// Column backing `field` on this entity, `None` when the entity has no such field.
    pub fn column(&self, field: Field) -> Option<&'static str> {
        let column = match (self, field) {
            (_, Field::Id) => "id",
            (Entity::Listings | Entity::Users | Entity::Invoices, Field::CreatedAt) => {
                "created_at"
            }
            (Entity::Listings | Entity::Subscriptions | Entity::Invoices, Field::Status) => {
                "status"
            }
            (Entity::Listings, Field::CategoryId) => "category_id",
            (Entity::Listings, Field::SellerId) => "seller_id",
            (Entity::Listings, Field::PriceMinor) => "price_minor",
            (Entity::Listings, Field::ViewCount) => "view_count",
            (Entity::Users, Field::IsVerified) => "is_verified",
            (Entity::Users, Field::LastLoginAt) => "last_login_at",
            (Entity::Subscriptions | Entity::Invoices, Field::UserId) => "user_id",
            (Entity::Subscriptions, Field::PlanId) => "plan_id",
            (Entity::Subscriptions, Field::StartedAt) => "started_at",
            (Entity::Subscriptions, Field::ExpiresAt) => "expires_at",
            (Entity::Invoices, Field::SubscriptionId) => "subscription_id",
            (Entity::Invoices, Field::TotalAmountMinor) => "total_amount_minor",
            (Entity::Invoices, Field::DueDate) => "due_date",
            (Entity::Invoices, Field::PaidAt) => "paid_at",
            _ => return None,
        };
        Some(column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Uuid(Uuid),
    Bool(bool),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        FilterValue::Uuid(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::Timestamp(value)
    }
}

impl From<ListingStatus> for FilterValue {
    fn from(value: ListingStatus) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<SubscriptionStatus> for FilterValue {
    fn from(value: SubscriptionStatus) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<InvoiceStatus> for FilterValue {
    fn from(value: InvoiceStatus) -> Self {
        FilterValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(Field, FilterValue),
    In(Field, Vec<FilterValue>),
    /// Half-open `[start, end)`, used for calendar periods.
    Range(Field, DateTime<Utc>, DateTime<Utc>),
    /// Inclusive `[start, end]`, used for the requested lookback window.
    Window(Field, DateTime<Utc>, DateTime<Utc>),
    Since(Field, DateTime<Utc>),
    Before(Field, DateTime<Utc>),
    /// Invoices only: the invoice belongs to a subscription in this status.
    SubscriptionStatus(SubscriptionStatus),
}

/// Typed request handed to the query gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub entity: Entity,
    pub filters: Vec<Filter>,
    pub order_by: Option<(Field, SortOrder)>,
    pub limit: Option<i64>,
}

impl EntityQuery {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, field: Field, value: impl Into<FilterValue>) -> Self {
        self.filter(Filter::Eq(field, value.into()))
    }

    pub fn order_by(mut self, field: Field, order: SortOrder) -> Self {
        self.order_by = Some((field, order));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One row of a bounded group-by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub key: Uuid,
    pub count: i64,
}
