use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::listings;

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Selectable, Queryable, QueryableByName)]
#[diesel(table_name = listings)]
pub struct ListingEntity {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub category_id: Uuid,
    pub seller_id: Uuid,
    pub price_minor: i32,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
}
