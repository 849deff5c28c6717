//! In-memory [`QueryGateway`] that evaluates [`EntityQuery`] filters over plain
//! vectors. Mirrors the ordering rules of the Postgres adapter so use cases can
//! be tested without a database.

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
};
use uuid::Uuid;

use crate::domain::{
    entities::{
        invoices::InvoiceEntity, listings::ListingEntity, subscriptions::SubscriptionEntity,
        users::UserEntity,
    },
    repositories::query_gateway::QueryGateway,
    value_objects::{
        enums::sort_order::SortOrder,
        query::{Entity, EntityQuery, Field, Filter, FilterValue, GroupCount},
    },
};

#[derive(Debug, Default, Clone)]
pub struct InMemoryQueryGateway {
    pub listings: Vec<ListingEntity>,
    pub users: Vec<UserEntity>,
    pub subscriptions: Vec<SubscriptionEntity>,
    pub invoices: Vec<InvoiceEntity>,
    failing: HashSet<Entity>,
}

impl InMemoryQueryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query touching `entity` fails, as if its tables were missing.
    pub fn fail_on(mut self, entity: Entity) -> Self {
        self.failing.insert(entity);
        self
    }

    fn check_available(&self, entity: Entity) -> Result<()> {
        if self.failing.contains(&entity) {
            bail!("relation \"{}\" does not exist", entity.table_name());
        }
        Ok(())
    }

    fn rows(&self, entity: Entity) -> Vec<HashMap<Field, FilterValue>> {
        match entity {
            Entity::Listings => self.listings.iter().map(listing_row).collect(),
            Entity::Users => self.users.iter().map(user_row).collect(),
            Entity::Subscriptions => self.subscriptions.iter().map(subscription_row).collect(),
            Entity::Invoices => self.invoices.iter().map(invoice_row).collect(),
        }
    }

    fn matching(&self, query: &EntityQuery) -> Result<Vec<HashMap<Field, FilterValue>>> {
        self.check_available(query.entity)?;
        for filter in &query.filters {
            self.validate(query.entity, filter)?;
        }

        Ok(self
            .rows(query.entity)
            .into_iter()
            .filter(|row| query.filters.iter().all(|filter| self.accepts(row, filter)))
            .collect())
    }

    fn validate(&self, entity: Entity, filter: &Filter) -> Result<()> {
        let field = match filter {
            Filter::Eq(field, _)
            | Filter::In(field, _)
            | Filter::Range(field, _, _)
            | Filter::Window(field, _, _)
            | Filter::Since(field, _)
            | Filter::Before(field, _) => *field,
            Filter::SubscriptionStatus(_) => {
                if entity != Entity::Invoices {
                    bail!("subscription status filter only applies to invoices");
                }
                return self.check_available(Entity::Subscriptions);
            }
        };
        entity
            .column(field)
            .map(|_| ())
            .ok_or_else(|| anyhow!("{field:?} is not a column of {}", entity.table_name()))
    }

    fn accepts(&self, row: &HashMap<Field, FilterValue>, filter: &Filter) -> bool {
        match filter {
            Filter::Eq(field, value) => row.get(field) == Some(value),
            Filter::In(field, values) => row.get(field).is_some_and(|v| values.contains(v)),
            Filter::Range(field, start, end) => {
                timestamp(row, *field).is_some_and(|ts| ts >= *start && ts < *end)
            }
            Filter::Window(field, start, end) => {
                timestamp(row, *field).is_some_and(|ts| ts >= *start && ts <= *end)
            }
            Filter::Since(field, start) => timestamp(row, *field).is_some_and(|ts| ts >= *start),
            Filter::Before(field, end) => timestamp(row, *field).is_some_and(|ts| ts < *end),
            Filter::SubscriptionStatus(status) => {
                let Some(FilterValue::Uuid(subscription_id)) = row.get(&Field::SubscriptionId)
                else {
                    return false;
                };
                self.subscriptions
                    .iter()
                    .any(|s| s.id == *subscription_id && s.status == status.to_string())
            }
        }
    }

    fn ordered_ids(&self, query: &EntityQuery) -> Result<Vec<Uuid>> {
        let mut rows = self.matching(query)?;
        let (field, order) = query.order_by.unwrap_or((Field::CreatedAt, SortOrder::Desc));
        rows.sort_by(|a, b| {
            let primary = sort_key(a, field).cmp(&sort_key(b, field));
            let primary = match order {
                SortOrder::Asc => primary,
                SortOrder::Desc => primary.reverse(),
            };
            primary.then_with(|| id(a).cmp(&id(b)))
        });
        let limit = query.limit.map(|n| n.max(0) as usize).unwrap_or(usize::MAX);
        Ok(rows.iter().take(limit).map(id).collect())
    }
}

fn timestamp(row: &HashMap<Field, FilterValue>, field: Field) -> Option<DateTime<Utc>> {
    match row.get(&field) {
        Some(FilterValue::Timestamp(ts)) => Some(*ts),
        _ => None,
    }
}

fn id(row: &HashMap<Field, FilterValue>) -> Uuid {
    match row.get(&Field::Id) {
        Some(FilterValue::Uuid(id)) => *id,
        _ => Uuid::nil(),
    }
}

fn sort_key(row: &HashMap<Field, FilterValue>, field: Field) -> Option<String> {
    row.get(&field).map(|value| match value {
        FilterValue::Text(v) => v.clone(),
        FilterValue::Uuid(v) => v.to_string(),
        FilterValue::Bool(v) => v.to_string(),
        FilterValue::Int(v) => format!("{v:020}"),
        FilterValue::Timestamp(v) => v.to_rfc3339(),
    })
}

fn listing_row(listing: &ListingEntity) -> HashMap<Field, FilterValue> {
    HashMap::from([
        (Field::Id, listing.id.into()),
        (Field::Status, listing.status.as_str().into()),
        (Field::CategoryId, listing.category_id.into()),
        (Field::SellerId, listing.seller_id.into()),
        (Field::PriceMinor, i64::from(listing.price_minor).into()),
        (Field::ViewCount, i64::from(listing.view_count).into()),
        (Field::CreatedAt, listing.created_at.into()),
    ])
}

fn user_row(user: &UserEntity) -> HashMap<Field, FilterValue> {
    let mut row = HashMap::from([
        (Field::Id, user.id.into()),
        (Field::IsVerified, user.is_verified.into()),
        (Field::CreatedAt, user.created_at.into()),
    ]);
    if let Some(last_login_at) = user.last_login_at {
        row.insert(Field::LastLoginAt, last_login_at.into());
    }
    row
}

fn subscription_row(subscription: &SubscriptionEntity) -> HashMap<Field, FilterValue> {
    let mut row = HashMap::from([
        (Field::Id, subscription.id.into()),
        (Field::UserId, subscription.user_id.into()),
        (Field::PlanId, subscription.plan_id.into()),
        (Field::Status, subscription.status.as_str().into()),
        (Field::StartedAt, subscription.started_at.into()),
    ]);
    if let Some(expires_at) = subscription.expires_at {
        row.insert(Field::ExpiresAt, expires_at.into());
    }
    row
}

fn invoice_row(invoice: &InvoiceEntity) -> HashMap<Field, FilterValue> {
    let mut row = HashMap::from([
        (Field::Id, invoice.id.into()),
        (Field::UserId, invoice.user_id.into()),
        (Field::Status, invoice.status.as_str().into()),
        (
            Field::TotalAmountMinor,
            i64::from(invoice.total_amount_minor).into(),
        ),
        (Field::DueDate, invoice.due_date.into()),
        (Field::CreatedAt, invoice.created_at.into()),
    ]);
    if let Some(subscription_id) = invoice.subscription_id {
        row.insert(Field::SubscriptionId, subscription_id.into());
    }
    if let Some(paid_at) = invoice.paid_at {
        row.insert(Field::PaidAt, paid_at.into());
    }
    row
}

#[async_trait]
impl QueryGateway for InMemoryQueryGateway {
    async fn count(&self, query: &EntityQuery) -> Result<i64> {
        Ok(self.matching(query)?.len() as i64)
    }

    async fn sum(&self, query: &EntityQuery, field: Field) -> Result<i64> {
        if !field.is_numeric() || query.entity.column(field).is_none() {
            bail!("cannot sum {field:?} over {}", query.entity.table_name());
        }
        Ok(self
            .matching(query)?
            .iter()
            .filter_map(|row| match row.get(&field) {
                Some(FilterValue::Int(v)) => Some(*v),
                _ => None,
            })
            .sum())
    }

    async fn group_by_top_n(
        &self,
        query: &EntityQuery,
        group_field: Field,
        n: i64,
    ) -> Result<Vec<GroupCount>> {
        if !group_field.is_reference() || query.entity.column(group_field).is_none() {
            bail!("cannot group {} by {group_field:?}", query.entity.table_name());
        }

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for row in self.matching(query)? {
            if let Some(FilterValue::Uuid(key)) = row.get(&group_field) {
                *counts.entry(*key).or_default() += 1;
            }
        }

        let mut groups: Vec<GroupCount> = counts
            .into_iter()
            .map(|(key, count)| GroupCount { key, count })
            .collect();
        groups.sort_by_key(|group| (Reverse(group.count), group.key));
        groups.truncate(n.max(0) as usize);
        Ok(groups)
    }

    async fn latest_listings(&self, query: &EntityQuery) -> Result<Vec<ListingEntity>> {
        if query.entity != Entity::Listings {
            bail!("expected a query over listings");
        }
        let ids = self.ordered_ids(query)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.listings.iter().find(|l| l.id == *id).cloned())
            .collect())
    }

    async fn latest_users(&self, query: &EntityQuery) -> Result<Vec<UserEntity>> {
        if query.entity != Entity::Users {
            bail!("expected a query over users");
        }
        let ids = self.ordered_ids(query)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.users.iter().find(|u| u.id == *id).cloned())
            .collect())
    }
}
