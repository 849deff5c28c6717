use chrono::{DateTime, Duration, Utc};
use crates::domain::{
    clock::Clock,
    repositories::{
        plans::PlanRepository, query_gateway::QueryGateway,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        enums::listing_statuses::ListingStatus,
        plans::{
            FREEMIUM_MAX_IMAGES_PER_LISTING, FREEMIUM_MAX_LISTINGS, FREEMIUM_PLAN_NAME,
            UNLIMITED_LISTINGS,
        },
        query::{Entity, EntityQuery, Field, Filter},
        usage::{ListingsRemaining, UsageSummary},
    },
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    errors::{AnalyticsError, UseCaseResult},
    plan_resolver::{EffectivePlan, PlanResolver},
};

pub const FREEMIUM_STATUS: &str = "freemium";
/// A non-renewing subscription this close to expiry is flagged for renewal.
pub const RENEWAL_NOTICE_DAYS: i64 = 7;

/// Fails with `NotFound` unless a `users` row exists for `user_id`.
pub(crate) async fn ensure_user_exists<G>(gateway: &G, user_id: Uuid) -> UseCaseResult<()>
where
    G: QueryGateway + Send + Sync + ?Sized,
{
    let query = EntityQuery::new(Entity::Users).eq(Field::Id, user_id);
    let found = gateway.count(&query).await.map_err(|err| {
        error!(%user_id, db_error = ?err, "usage: failed to look up user");
        AnalyticsError::UpstreamQueryFailure(err)
    })?;

    if found == 0 {
        warn!(%user_id, "usage: unknown user");
        return Err(AnalyticsError::NotFound(format!("user {user_id}")));
    }
    Ok(())
}

pub struct UsageUseCase<G, P, S>
where
    G: QueryGateway + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    gateway: Arc<G>,
    plan_resolver: PlanResolver<P, S>,
    clock: Arc<dyn Clock>,
}

impl<G, P, S> UsageUseCase<G, P, S>
where
    G: QueryGateway + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(gateway: Arc<G>, plan_resolver: PlanResolver<P, S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            plan_resolver,
            clock,
        }
    }

    pub async fn get_usage_summary(&self, user_id: Uuid) -> UseCaseResult<UsageSummary> {
        let now = self.clock.now();
        ensure_user_exists(self.gateway.as_ref(), user_id).await?;

        let occupying_slots = EntityQuery::new(Entity::Listings)
            .eq(Field::SellerId, user_id)
            .filter(Filter::In(
                Field::Status,
                ListingStatus::QUOTA_COUNTED.into_iter().map(Into::into).collect(),
            ));

        let (plan, current_listings) = tokio::try_join!(
            self.plan_resolver.resolve_effective_plan_for_user(user_id, now),
            self.gateway.count(&occupying_slots),
        )
        .map_err(|err| {
            error!(%user_id, db_error = ?err, "usage: failed to load plan or listing count");
            AnalyticsError::UpstreamQueryFailure(err)
        })?;

        let summary = summarize(user_id, &plan, current_listings, now);
        info!(
            %user_id,
            plan = %summary.plan_name,
            current_listings,
            "usage: summary computed"
        );
        Ok(summary)
    }
}

/// Pure quota derivation for one user at `now`.
pub fn summarize(
    user_id: Uuid,
    plan: &EffectivePlan,
    current_listings: i64,
    now: DateTime<Utc>,
) -> UsageSummary {
    match plan {
        EffectivePlan::Freemium => {
            let listings_remaining = remaining(FREEMIUM_MAX_LISTINGS, current_listings);
            UsageSummary {
                user_id,
                plan_name: FREEMIUM_PLAN_NAME.to_string(),
                status: FREEMIUM_STATUS.to_string(),
                max_listings: FREEMIUM_MAX_LISTINGS,
                max_images_per_listing: FREEMIUM_MAX_IMAGES_PER_LISTING,
                current_listings,
                listings_remaining,
                can_create_listing: listings_remaining.allows_another(),
                features: Vec::new(),
                expires_at: None,
                days_remaining: None,
                auto_renew: false,
                renewal_due: false,
            }
        }
        EffectivePlan::Subscribed { subscription, plan } => {
            let listings_remaining = remaining(plan.max_listings, current_listings);
            let until_expiry = subscription.expires_at.map(|expires_at| expires_at - now);
            UsageSummary {
                user_id,
                plan_name: plan.name.clone(),
                status: subscription.subscription_status().to_string(),
                max_listings: plan.max_listings,
                max_images_per_listing: plan.max_images_per_listing,
                current_listings,
                listings_remaining,
                can_create_listing: listings_remaining.allows_another(),
                features: plan.features.enabled(),
                expires_at: subscription.expires_at,
                days_remaining: until_expiry.map(|left| left.num_days().max(0)),
                auto_renew: subscription.auto_renew,
                renewal_due: !subscription.auto_renew
                    && until_expiry.is_some_and(|left| left <= Duration::days(RENEWAL_NOTICE_DAYS)),
            }
        }
    }
}

fn remaining(max_listings: i32, current_listings: i64) -> ListingsRemaining {
    if max_listings == UNLIMITED_LISTINGS {
        return ListingsRemaining::Unlimited;
    }
    ListingsRemaining::Count((i64::from(max_listings) - current_listings).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crates::{
        domain::{
            clock::FixedClock,
            entities::{
                listings::ListingEntity, plans::PlanEntity, subscriptions::SubscriptionEntity,
                users::UserEntity,
            },
            repositories::{plans::MockPlanRepository, subscriptions::MockSubscriptionRepository},
            value_objects::{enums::subscription_statuses::SubscriptionStatus, plans::PlanFeatures},
        },
        infra::memory::InMemoryQueryGateway,
    };
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap()
    }

    fn plan(max_listings: i32) -> PlanEntity {
        PlanEntity {
            id: Uuid::from_u128(500),
            name: "Business".to_string(),
            price_minor: 9900,
            max_listings,
            max_images_per_listing: 25,
            features: PlanFeatures::from_iter(["featured_listings"]),
        }
    }

    fn subscription(expires_in: Option<Duration>, auto_renew: bool) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::from_u128(1),
            plan_id: Uuid::from_u128(500),
            status: SubscriptionStatus::Active.to_string(),
            started_at: now() - Duration::days(20),
            expires_at: expires_in.map(|left| now() + left),
            auto_renew,
        }
    }

    fn gateway_with_listings(user_id: Uuid, statuses: &[ListingStatus]) -> InMemoryQueryGateway {
        let mut gateway = InMemoryQueryGateway::new();
        gateway.users.push(UserEntity {
            id: user_id,
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            is_verified: false,
            last_login_at: None,
            profile_id: None,
            created_at: now() - Duration::days(90),
        });
        for status in statuses {
            gateway.listings.push(ListingEntity {
                id: Uuid::new_v4(),
                title: "Trailer".to_string(),
                status: status.to_string(),
                category_id: Uuid::new_v4(),
                seller_id: user_id,
                price_minor: 500_000,
                view_count: 0,
                created_at: now() - Duration::days(5),
            });
        }
        gateway
    }

    fn usecase(
        gateway: InMemoryQueryGateway,
        found: Option<(SubscriptionEntity, PlanEntity)>,
    ) -> UsageUseCase<InMemoryQueryGateway, MockPlanRepository, MockSubscriptionRepository> {
        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut plan_repo = MockPlanRepository::new();
        match found {
            Some((subscription, plan)) => {
                subscription_repo
                    .expect_find_current_active_subscription()
                    .returning(move |_, _| Ok(Some(subscription.clone())));
                plan_repo
                    .expect_find_by_id()
                    .returning(move |_| Ok(plan.clone()));
            }
            None => {
                subscription_repo
                    .expect_find_current_active_subscription()
                    .returning(|_, _| Ok(None));
            }
        }

        UsageUseCase::new(
            Arc::new(gateway),
            PlanResolver::new(Arc::new(plan_repo), Arc::new(subscription_repo)),
            Arc::new(FixedClock(now())),
        )
    }

    #[tokio::test]
    async fn freemium_user_with_three_listings_has_two_left() {
        let user_id = Uuid::from_u128(1);
        let gateway = gateway_with_listings(
            user_id,
            &[ListingStatus::Active, ListingStatus::Draft, ListingStatus::Pending, ListingStatus::Sold],
        );

        let summary = usecase(gateway, None).get_usage_summary(user_id).await.unwrap();

        assert_eq!(summary.plan_name, "Freemium");
        assert_eq!(summary.status, "freemium");
        assert_eq!(summary.max_listings, 5);
        assert_eq!(summary.max_images_per_listing, 5);
        assert_eq!(summary.current_listings, 3);
        assert_eq!(summary.listings_remaining, ListingsRemaining::Count(2));
        assert!(summary.can_create_listing);
        assert_eq!(summary.days_remaining, None);
        assert!(!summary.auto_renew);
    }

    #[tokio::test]
    async fn unlimited_plan_ignores_listing_count() {
        let user_id = Uuid::from_u128(1);
        let gateway = gateway_with_listings(user_id, &[ListingStatus::Active; 1000]);
        let found = (subscription(None, true), plan(UNLIMITED_LISTINGS));

        let summary = usecase(gateway, Some(found))
            .get_usage_summary(user_id)
            .await
            .unwrap();

        assert_eq!(summary.current_listings, 1000);
        assert_eq!(summary.listings_remaining, ListingsRemaining::Unlimited);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["listings_remaining"], json!("unlimited"));
        assert_eq!(json["days_remaining"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let err = usecase(InMemoryQueryGateway::new(), None)
            .get_usage_summary(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::NotFound(_)));
    }

    #[tokio::test]
    async fn gateway_failure_is_upstream_failure() {
        let user_id = Uuid::from_u128(1);
        let gateway = gateway_with_listings(user_id, &[]).fail_on(Entity::Listings);

        let err = usecase(gateway, None).get_usage_summary(user_id).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::UpstreamQueryFailure(_)));
    }

    #[test]
    fn over_quota_clamps_to_zero() {
        let summary = summarize(
            Uuid::nil(),
            &EffectivePlan::Subscribed {
                subscription: subscription(Some(Duration::days(30)), true),
                plan: plan(3),
            },
            8,
            now(),
        );
        assert_eq!(summary.listings_remaining, ListingsRemaining::Count(0));
        assert!(!summary.can_create_listing);
        assert_eq!(summary.features, vec!["featured_listings".to_string()]);
    }

    #[test]
    fn expiry_countdown_and_renewal_flag() {
        let soon = summarize(
            Uuid::nil(),
            &EffectivePlan::Subscribed {
                subscription: subscription(Some(Duration::days(3) + Duration::hours(5)), false),
                plan: plan(10),
            },
            0,
            now(),
        );
        assert_eq!(soon.days_remaining, Some(3));
        assert!(soon.renewal_due);

        let renewing = summarize(
            Uuid::nil(),
            &EffectivePlan::Subscribed {
                subscription: subscription(Some(Duration::days(3)), true),
                plan: plan(10),
            },
            0,
            now(),
        );
        assert!(!renewing.renewal_due);

        let far = summarize(
            Uuid::nil(),
            &EffectivePlan::Subscribed {
                subscription: subscription(Some(Duration::days(45)), false),
                plan: plan(10),
            },
            0,
            now(),
        );
        assert_eq!(far.days_remaining, Some(45));
        assert!(!far.renewal_due);
    }

    #[test]
    fn past_expiry_never_goes_negative() {
        let summary = summarize(
            Uuid::nil(),
            &EffectivePlan::Subscribed {
                subscription: subscription(Some(Duration::days(-2)), false),
                plan: plan(10),
            },
            0,
            now(),
        );
        assert_eq!(summary.days_remaining, Some(0));
    }
}
