//! Fixed dashboard blocks computed from counts over listings and users.

use anyhow::Result;
use crates::domain::{
    repositories::query_gateway::QueryGateway,
    value_objects::{
        analytics::{Growth, GrowthPair, Overview, RecentCounts, StatusBreakdown},
        enums::listing_statuses::ListingStatus,
        query::{Entity, EntityQuery, Field, Filter},
        time_window::TimeWindow,
    },
};

/// Every block the aggregator produces, computed against one [`TimeWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricBlocks {
    pub overview: Overview,
    pub recent: RecentCounts,
    pub status_breakdown: StatusBreakdown,
    pub growth: Growth,
}

pub struct MetricAggregator<'a, G>
where
    G: QueryGateway + Send + Sync + ?Sized,
{
    gateway: &'a G,
    window: &'a TimeWindow,
}

impl<'a, G> MetricAggregator<'a, G>
where
    G: QueryGateway + Send + Sync + ?Sized,
{
    pub fn new(gateway: &'a G, window: &'a TimeWindow) -> Self {
        Self { gateway, window }
    }

    pub async fn collect(&self) -> Result<MetricBlocks> {
        let (overview, recent, status_breakdown, growth) = tokio::try_join!(
            self.overview(),
            self.recent(),
            self.status_breakdown(),
            self.growth(),
        )?;

        Ok(MetricBlocks {
            overview,
            recent,
            status_breakdown,
            growth,
        })
    }

    pub async fn overview(&self) -> Result<Overview> {
        let listings = EntityQuery::new(Entity::Listings);
        let active = EntityQuery::new(Entity::Listings).eq(Field::Status, ListingStatus::Active);
        let users = EntityQuery::new(Entity::Users);
        let verified = EntityQuery::new(Entity::Users).eq(Field::IsVerified, true);

        let (total_listings, active_listings, total_users, verified_users) = tokio::try_join!(
            self.gateway.count(&listings),
            self.gateway.count(&active),
            self.gateway.count(&users),
            self.gateway.count(&verified),
        )?;

        Ok(Overview {
            total_listings,
            active_listings,
            total_users,
            verified_users,
        })
    }

    pub async fn recent(&self) -> Result<RecentCounts> {
        let created_since = |entity, since| {
            EntityQuery::new(entity).filter(Filter::Since(Field::CreatedAt, since))
        };
        let listings_today = created_since(Entity::Listings, self.window.today_start);
        let listings_week = created_since(Entity::Listings, self.window.week_start);
        let users_today = created_since(Entity::Users, self.window.today_start);
        let users_week = created_since(Entity::Users, self.window.week_start);

        let (listings_today, listings_this_week, users_today, users_this_week) = tokio::try_join!(
            self.gateway.count(&listings_today),
            self.gateway.count(&listings_week),
            self.gateway.count(&users_today),
            self.gateway.count(&users_week),
        )?;

        Ok(RecentCounts {
            listings_today,
            listings_this_week,
            users_today,
            users_this_week,
        })
    }

    pub async fn status_breakdown(&self) -> Result<StatusBreakdown> {
        let [active, draft, pending, sold, archived] =
            ListingStatus::ALL.map(|status| EntityQuery::new(Entity::Listings).eq(Field::Status, status));

        let counts = tokio::try_join!(
            self.gateway.count(&active),
            self.gateway.count(&draft),
            self.gateway.count(&pending),
            self.gateway.count(&sold),
            self.gateway.count(&archived),
        )?;

        let mut breakdown = StatusBreakdown::default();
        let counts = [counts.0, counts.1, counts.2, counts.3, counts.4];
        for (status, count) in ListingStatus::ALL.into_iter().zip(counts) {
            breakdown.set(status, count);
        }
        Ok(breakdown)
    }

    /// Calendar month over calendar month, independent of the requested range.
    pub async fn growth(&self) -> Result<Growth> {
        let window = self.window;
        let current = |entity| {
            EntityQuery::new(entity).filter(Filter::Range(
                Field::CreatedAt,
                window.month_start,
                window.next_month_start,
            ))
        };
        let previous = |entity| {
            EntityQuery::new(entity).filter(Filter::Range(
                Field::CreatedAt,
                window.previous_start,
                window.previous_end,
            ))
        };
        let listings_current = current(Entity::Listings);
        let listings_previous = previous(Entity::Listings);
        let users_current = current(Entity::Users);
        let users_previous = previous(Entity::Users);

        let (listings_current, listings_previous, users_current, users_previous) = tokio::try_join!(
            self.gateway.count(&listings_current),
            self.gateway.count(&listings_previous),
            self.gateway.count(&users_current),
            self.gateway.count(&users_previous),
        )?;

        Ok(Growth {
            listings: GrowthPair {
                current_month: listings_current,
                last_month: listings_previous,
            },
            users: GrowthPair {
                current_month: users_current,
                last_month: users_previous,
            },
        })
    }
}
