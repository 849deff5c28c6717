use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::subscription_statuses::SubscriptionStatus,
    infra::db::postgres::schema::subscriptions,
};

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub auto_renew: bool,
}

impl SubscriptionEntity {
    pub fn subscription_status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_str(&self.status)
    }
}
