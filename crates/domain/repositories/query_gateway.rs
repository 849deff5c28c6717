use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    entities::{listings::ListingEntity, users::UserEntity},
    value_objects::query::{EntityQuery, Field, GroupCount},
};

/// Read-only aggregation port over listings, users, subscriptions and invoices.
#[automock]
#[async_trait]
pub trait QueryGateway {
    async fn count(&self, query: &EntityQuery) -> Result<i64>;

    /// Sum of a numeric field, 0 when no row matches.
    async fn sum(&self, query: &EntityQuery, field: Field) -> Result<i64>;

    /// At most `n` groups, ordered by count descending then key ascending.
    async fn group_by_top_n(
        &self,
        query: &EntityQuery,
        group_field: Field,
        n: i64,
    ) -> Result<Vec<GroupCount>>;

    /// Newest listings first; `query.limit` bounds the result.
    async fn latest_listings(&self, query: &EntityQuery) -> Result<Vec<ListingEntity>>;

    /// Newest users first; `query.limit` bounds the result.
    async fn latest_users(&self, query: &EntityQuery) -> Result<Vec<UserEntity>>;
}
