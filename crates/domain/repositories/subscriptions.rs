use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::SubscriptionEntity;

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    /// Latest `active` subscription of the user that has not expired at `now`.
    async fn find_current_active_subscription(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionEntity>>;
}
