use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{plans::PlanEntity, subscriptions::SubscriptionEntity},
    repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Plan that governs a user's quota at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectivePlan {
    Freemium,
    Subscribed {
        subscription: SubscriptionEntity,
        plan: PlanEntity,
    },
}

/// Resolves the effective plan for a user: active subscription or freemium fallback.
pub struct PlanResolver<P, S>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
}

impl<P, S> PlanResolver<P, S>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, subscription_repo: Arc<S>) -> Self {
        Self {
            plan_repo,
            subscription_repo,
        }
    }

    pub async fn resolve_effective_plan_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<EffectivePlan> {
        let Some(subscription) = self
            .subscription_repo
            .find_current_active_subscription(user_id, now)
            .await?
        else {
            debug!(%user_id, "plan_resolver: falling back to freemium");
            return Ok(EffectivePlan::Freemium);
        };

        debug!(
            %user_id,
            plan_id = %subscription.plan_id,
            "plan_resolver: using active subscription plan"
        );
        let plan = self.plan_repo.find_by_id(subscription.plan_id).await?;

        Ok(EffectivePlan::Subscribed { subscription, plan })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crates::domain::{
        repositories::{plans::MockPlanRepository, subscriptions::MockSubscriptionRepository},
        value_objects::{enums::subscription_statuses::SubscriptionStatus, plans::PlanFeatures},
    };
    use mockall::predicate::eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap()
    }

    fn sample_plan(id: Uuid) -> PlanEntity {
        PlanEntity {
            id,
            name: "Pro".to_string(),
            price_minor: 4900,
            max_listings: 50,
            max_images_per_listing: 20,
            features: PlanFeatures::default(),
        }
    }

    fn sample_subscription(user_id: Uuid, plan_id: Uuid) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            status: SubscriptionStatus::Active.to_string(),
            started_at: now() - Duration::days(10),
            expires_at: Some(now() + Duration::days(20)),
            auto_renew: true,
        }
    }

    #[tokio::test]
    async fn returns_subscribed_plan_when_subscription_exists() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let subscription = sample_subscription(user_id, plan_id);
        let plan = sample_plan(plan_id);

        let mut subscription_repo = MockSubscriptionRepository::new();
        let found = subscription.clone();
        subscription_repo
            .expect_find_current_active_subscription()
            .with(eq(user_id), eq(now()))
            .returning(move |_, _| Ok(Some(found.clone())));

        let mut plan_repo = MockPlanRepository::new();
        let found = plan.clone();
        plan_repo
            .expect_find_by_id()
            .with(eq(plan_id))
            .returning(move |_| Ok(found.clone()));

        let resolver = PlanResolver::new(Arc::new(plan_repo), Arc::new(subscription_repo));
        let effective = resolver
            .resolve_effective_plan_for_user(user_id, now())
            .await
            .unwrap();

        assert_eq!(effective, EffectivePlan::Subscribed { subscription, plan });
    }

    #[tokio::test]
    async fn falls_back_to_freemium_without_touching_plans() {
        let user_id = Uuid::new_v4();

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_active_subscription()
            .returning(|_, _| Ok(None));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().never();

        let resolver = PlanResolver::new(Arc::new(plan_repo), Arc::new(subscription_repo));
        let effective = resolver
            .resolve_effective_plan_for_user(user_id, now())
            .await
            .unwrap();

        assert_eq!(effective, EffectivePlan::Freemium);
    }

    #[tokio::test]
    async fn missing_plan_row_is_an_error() {
        let user_id = Uuid::new_v4();
        let subscription = sample_subscription(user_id, Uuid::new_v4());

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_active_subscription()
            .returning(move |_, _| Ok(Some(subscription.clone())));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .returning(|_| Err(anyhow::anyhow!("plan not found")));

        let resolver = PlanResolver::new(Arc::new(plan_repo), Arc::new(subscription_repo));
        assert!(
            resolver
                .resolve_effective_plan_for_user(user_id, now())
                .await
                .is_err()
        );
    }
}
