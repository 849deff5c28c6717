//! Optional heavy block of the dashboard. Required parts fail the request,
//! the subscription block and category names degrade to absent values.

use anyhow::Result;
use chrono::Duration;
use crates::domain::{
    entities::categories::CategoryEntity,
    repositories::{
        cache::{Cache, get_or_compute},
        categories::CategoryRepository,
        query_gateway::QueryGateway,
    },
    value_objects::{
        analytics::{
            CategoryStat, ExtendedAnalytics, Overview, PerformanceIndicators, RecentActivity,
            SellerStat, SubscriptionStats,
        },
        enums::{
            invoice_statuses::InvoiceStatus, listing_statuses::ListingStatus,
            subscription_statuses::SubscriptionStatus,
        },
        query::{Entity, EntityQuery, Field, Filter},
        time_window::TimeWindow,
    },
};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

pub const TOP_N: i64 = 10;
pub const RECENT_SAMPLE_SIZE: i64 = 5;
pub const CATEGORY_CATALOG_KEY: &str = "analytics:categories";

pub struct ExtendedAnalyticsAssembler<'a, G, C>
where
    G: QueryGateway + Send + Sync + ?Sized,
    C: CategoryRepository + Send + Sync + ?Sized,
{
    gateway: &'a G,
    categories: &'a C,
    cache: &'a dyn Cache,
    catalog_ttl: Duration,
    window: &'a TimeWindow,
}

impl<'a, G, C> ExtendedAnalyticsAssembler<'a, G, C>
where
    G: QueryGateway + Send + Sync + ?Sized,
    C: CategoryRepository + Send + Sync + ?Sized,
{
    pub fn new(
        gateway: &'a G,
        categories: &'a C,
        cache: &'a dyn Cache,
        catalog_ttl: Duration,
        window: &'a TimeWindow,
    ) -> Self {
        Self {
            gateway,
            categories,
            cache,
            catalog_ttl,
            window,
        }
    }

    pub async fn assemble(&self, overview: &Overview) -> Result<ExtendedAnalytics> {
        let (required, subscription_stats, category_names) = tokio::join!(
            self.required_blocks(overview),
            self.subscription_stats(),
            self.category_names(),
        );
        let (mut category_stats, top_sellers, recent_activity, performance_indicators) =
            required?;

        let subscription_stats = match subscription_stats {
            Ok(stats) => Some(stats),
            Err(err) => {
                warn!(error = ?err, "extended_analytics: subscription stats unavailable, omitting");
                None
            }
        };

        match category_names {
            Ok(names) => {
                for stat in &mut category_stats {
                    stat.category_name = names.get(&stat.category_id).cloned();
                }
            }
            Err(err) => {
                warn!(error = ?err, "extended_analytics: category catalog unavailable, names omitted")
            }
        }

        Ok(ExtendedAnalytics {
            category_stats,
            top_sellers,
            recent_activity,
            performance_indicators,
            subscription_stats,
        })
    }

    fn in_window(&self, entity: Entity, field: Field) -> EntityQuery {
        EntityQuery::new(entity).filter(Filter::Window(field, self.window.start, self.window.end))
    }

    async fn required_blocks(
        &self,
        overview: &Overview,
    ) -> Result<(
        Vec<CategoryStat>,
        Vec<SellerStat>,
        RecentActivity,
        PerformanceIndicators,
    )> {
        let listings_in_window = self.in_window(Entity::Listings, Field::CreatedAt);
        let active_in_window = listings_in_window
            .clone()
            .eq(Field::Status, ListingStatus::Active);
        let logged_in = self.in_window(Entity::Users, Field::LastLoginAt);
        let latest_users = EntityQuery::new(Entity::Users).limit(RECENT_SAMPLE_SIZE);
        let latest_listings = EntityQuery::new(Entity::Listings).limit(RECENT_SAMPLE_SIZE);

        let (categories, sellers, users, listings, total_views, active_users) = tokio::try_join!(
            self.gateway
                .group_by_top_n(&listings_in_window, Field::CategoryId, TOP_N),
            self.gateway
                .group_by_top_n(&active_in_window, Field::SellerId, TOP_N),
            self.gateway.latest_users(&latest_users),
            self.gateway.latest_listings(&latest_listings),
            self.gateway.sum(&listings_in_window, Field::ViewCount),
            self.gateway.count(&logged_in),
        )?;

        let category_stats = categories
            .into_iter()
            .map(|group| CategoryStat {
                category_id: group.key,
                category_name: None,
                listing_count: group.count,
            })
            .collect();
        let top_sellers = sellers
            .into_iter()
            .map(|group| SellerStat {
                seller_id: group.key,
                active_listings: group.count,
            })
            .collect();
        let recent_activity = RecentActivity {
            users: users.into_iter().map(Into::into).collect(),
            listings: listings.into_iter().map(Into::into).collect(),
        };

        Ok((
            category_stats,
            top_sellers,
            recent_activity,
            PerformanceIndicators::new(overview, total_views, active_users),
        ))
    }

    /// Active subscriptions and this month's revenue from their paid invoices.
    async fn subscription_stats(&self) -> Result<SubscriptionStats> {
        let active = EntityQuery::new(Entity::Subscriptions)
            .eq(Field::Status, SubscriptionStatus::Active);
        let paid_this_month = EntityQuery::new(Entity::Invoices)
            .eq(Field::Status, InvoiceStatus::Paid)
            .filter(Filter::Range(
                Field::PaidAt,
                self.window.month_start,
                self.window.next_month_start,
            ))
            .filter(Filter::SubscriptionStatus(SubscriptionStatus::Active));

        let (active_subscriptions, monthly_revenue_minor) = tokio::try_join!(
            self.gateway.count(&active),
            self.gateway.sum(&paid_this_month, Field::TotalAmountMinor),
        )?;

        Ok(SubscriptionStats {
            active_subscriptions,
            monthly_revenue_minor,
        })
    }

    async fn category_names(&self) -> Result<HashMap<Uuid, String>> {
        let catalog: Vec<CategoryEntity> =
            get_or_compute(self.cache, CATEGORY_CATALOG_KEY, self.catalog_ttl, || {
                self.categories.list_categories()
            })
            .await?;

        Ok(catalog
            .into_iter()
            .map(|category| (category.id, category.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use crates::{
        domain::{
            clock::FixedClock,
            entities::{
                invoices::InvoiceEntity, listings::ListingEntity,
                subscriptions::SubscriptionEntity, users::UserEntity,
            },
            repositories::{cache::MockCache, categories::MockCategoryRepository},
            value_objects::time_window::RangeToken,
        },
        infra::{cache::memory_cache::MemoryCache, memory::InMemoryQueryGateway},
    };
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 15, 30, 0).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::resolve(RangeToken::default(), now()).unwrap()
    }

    fn listing(category: u128, seller: u128, status: ListingStatus, views: i32) -> ListingEntity {
        ListingEntity {
            id: Uuid::new_v4(),
            title: "Compact loader".to_string(),
            status: status.to_string(),
            category_id: Uuid::from_u128(category),
            seller_id: Uuid::from_u128(seller),
            price_minor: 1_000_000,
            view_count: views,
            created_at: now() - Duration::days(2),
        }
    }

    fn user(id: u128, created_days_ago: i64, last_login_days_ago: Option<i64>) -> UserEntity {
        UserEntity {
            id: Uuid::from_u128(id),
            name: format!("user-{id}"),
            email: format!("user-{id}@example.com"),
            is_verified: true,
            last_login_at: last_login_days_ago.map(|days| now() - Duration::days(days)),
            profile_id: None,
            created_at: now() - Duration::days(created_days_ago),
        }
    }

    fn categories_repo() -> MockCategoryRepository {
        let mut repo = MockCategoryRepository::new();
        repo.expect_list_categories().returning(|| {
            Ok(vec![CategoryEntity {
                id: Uuid::from_u128(1),
                name: "Excavators".to_string(),
                slug: "excavators".to_string(),
            }])
        });
        repo
    }

    fn overview() -> Overview {
        Overview {
            total_listings: 4,
            active_listings: 3,
            total_users: 2,
            verified_users: 2,
        }
    }

    #[tokio::test]
    async fn category_ties_break_by_id_and_names_come_from_catalog() {
        let mut gateway = InMemoryQueryGateway::new();
        gateway.listings.push(listing(2, 7, ListingStatus::Active, 5));
        gateway.listings.push(listing(1, 7, ListingStatus::Active, 5));
        gateway.listings.push(listing(2, 8, ListingStatus::Draft, 5));
        gateway.listings.push(listing(1, 8, ListingStatus::Active, 5));

        let cache = MemoryCache::new(Arc::new(FixedClock(now())));
        let categories = categories_repo();
        let window = window();
        let assembler = ExtendedAnalyticsAssembler::new(
            &gateway,
            &categories,
            &cache,
            Duration::minutes(60),
            &window,
        );

        let first = assembler.assemble(&overview()).await.unwrap();
        let second = assembler.assemble(&overview()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.category_stats,
            vec![
                CategoryStat {
                    category_id: Uuid::from_u128(1),
                    category_name: Some("Excavators".to_string()),
                    listing_count: 2,
                },
                CategoryStat {
                    category_id: Uuid::from_u128(2),
                    category_name: None,
                    listing_count: 2,
                },
            ]
        );
        assert_eq!(
            first.top_sellers,
            vec![
                SellerStat { seller_id: Uuid::from_u128(7), active_listings: 2 },
                SellerStat { seller_id: Uuid::from_u128(8), active_listings: 1 },
            ]
        );
        assert_eq!(first.performance_indicators.total_views, 20);
        assert_eq!(first.performance_indicators.conversion_rate, 100.0);
        assert_eq!(first.performance_indicators.avg_listings_per_user, 2.0);
        assert_eq!(first.subscription_stats, Some(SubscriptionStats {
            active_subscriptions: 0,
            monthly_revenue_minor: 0,
        }));
    }

    #[tokio::test]
    async fn recent_activity_is_newest_first_and_bounded() {
        let mut gateway = InMemoryQueryGateway::new();
        for id in 1..=7 {
            gateway.users.push(user(id, id as i64, Some(100)));
        }
        gateway.users.push(user(50, 60, Some(1)));

        let cache = MemoryCache::new(Arc::new(FixedClock(now())));
        let categories = categories_repo();
        let window = window();
        let assembler = ExtendedAnalyticsAssembler::new(
            &gateway,
            &categories,
            &cache,
            Duration::minutes(60),
            &window,
        );

        let extended = assembler.assemble(&Overview::default()).await.unwrap();

        let ids: Vec<_> = extended.recent_activity.users.iter().map(|u| u.id).collect();
        assert_eq!(ids, (1..=5).map(Uuid::from_u128).collect::<Vec<_>>());
        assert!(extended.recent_activity.listings.is_empty());
        // Only the user who logged in yesterday is inside the 30 day window.
        assert_eq!(extended.performance_indicators.active_users, 1);
        assert_eq!(extended.performance_indicators.conversion_rate, 0.0);
    }

    #[tokio::test]
    async fn revenue_counts_paid_invoices_of_active_subscriptions_this_month() {
        let active_subscription = SubscriptionEntity {
            id: Uuid::from_u128(10),
            user_id: Uuid::from_u128(1),
            plan_id: Uuid::from_u128(100),
            status: SubscriptionStatus::Active.to_string(),
            started_at: now() - Duration::days(40),
            expires_at: None,
            auto_renew: true,
        };
        let cancelled_subscription = SubscriptionEntity {
            id: Uuid::from_u128(11),
            status: SubscriptionStatus::Cancelled.to_string(),
            ..active_subscription.clone()
        };
        let invoice = |id: u128, subscription: u128, status: InvoiceStatus, paid_days_ago: i64| {
            InvoiceEntity {
                id: Uuid::from_u128(id),
                user_id: Uuid::from_u128(1),
                subscription_id: Some(Uuid::from_u128(subscription)),
                status: status.to_string(),
                total_amount_minor: 4900,
                due_date: now(),
                paid_at: Some(now() - Duration::days(paid_days_ago)),
                created_at: now() - Duration::days(paid_days_ago),
            }
        };

        let mut gateway = InMemoryQueryGateway::new();
        gateway.subscriptions.push(active_subscription);
        gateway.subscriptions.push(cancelled_subscription);
        gateway.invoices.push(invoice(1, 10, InvoiceStatus::Paid, 1));
        gateway.invoices.push(invoice(2, 10, InvoiceStatus::Paid, 3));
        gateway.invoices.push(invoice(3, 10, InvoiceStatus::Paid, 30));
        gateway.invoices.push(invoice(4, 11, InvoiceStatus::Paid, 1));
        gateway.invoices.push(invoice(5, 10, InvoiceStatus::Pending, 1));

        let cache = MemoryCache::new(Arc::new(FixedClock(now())));
        let categories = categories_repo();
        let window = window();
        let assembler = ExtendedAnalyticsAssembler::new(
            &gateway,
            &categories,
            &cache,
            Duration::minutes(60),
            &window,
        );

        let stats = assembler
            .assemble(&Overview::default())
            .await
            .unwrap()
            .subscription_stats
            .unwrap();

        assert_eq!(stats.active_subscriptions, 1);
        assert_eq!(stats.monthly_revenue_minor, 9800);
    }

    #[tokio::test]
    async fn subscription_failure_omits_only_that_block() {
        let mut gateway = InMemoryQueryGateway::new().fail_on(Entity::Subscriptions);
        gateway.listings.push(listing(1, 7, ListingStatus::Active, 3));

        let cache = MemoryCache::new(Arc::new(FixedClock(now())));
        let categories = categories_repo();
        let window = window();
        let assembler = ExtendedAnalyticsAssembler::new(
            &gateway,
            &categories,
            &cache,
            Duration::minutes(60),
            &window,
        );

        let extended = assembler.assemble(&overview()).await.unwrap();

        assert_eq!(extended.subscription_stats, None);
        assert_eq!(extended.category_stats.len(), 1);
        let json = serde_json::to_value(&extended).unwrap();
        assert!(json.get("subscription_stats").is_none());
    }

    #[tokio::test]
    async fn required_failure_fails_the_block() {
        let gateway = InMemoryQueryGateway::new().fail_on(Entity::Listings);
        let cache = MemoryCache::new(Arc::new(FixedClock(now())));
        let categories = categories_repo();
        let window = window();
        let assembler = ExtendedAnalyticsAssembler::new(
            &gateway,
            &categories,
            &cache,
            Duration::minutes(60),
            &window,
        );

        assert!(assembler.assemble(&overview()).await.is_err());
    }

    #[tokio::test]
    async fn catalog_is_served_from_cache_when_present() {
        let mut gateway = InMemoryQueryGateway::new();
        gateway.listings.push(listing(3, 7, ListingStatus::Active, 1));

        let mut cache = MockCache::new();
        cache.expect_get().returning(|_| {
            Some(serde_json::json!([{
                "id": Uuid::from_u128(3),
                "name": "Cranes",
                "slug": "cranes",
            }]))
        });
        cache.expect_put().never();
        let mut categories = MockCategoryRepository::new();
        categories.expect_list_categories().never();

        let window = window();
        let assembler = ExtendedAnalyticsAssembler::new(
            &gateway,
            &categories,
            &cache,
            Duration::minutes(60),
            &window,
        );

        let extended = assembler.assemble(&overview()).await.unwrap();
        assert_eq!(
            extended.category_stats[0].category_name.as_deref(),
            Some("Cranes")
        );
    }
}
