use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::{listings::ListingEntity, users::UserEntity},
    value_objects::enums::listing_statuses::ListingStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub time_range: String,
    pub period: AnalyticsPeriod,
    pub overview: Overview,
    pub recent: RecentCounts,
    pub status_breakdown: StatusBreakdown,
    pub growth: Growth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended: Option<ExtendedAnalytics>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalyticsPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub total_listings: i64,
    pub active_listings: i64,
    pub total_users: i64,
    pub verified_users: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecentCounts {
    pub listings_today: i64,
    pub listings_this_week: i64,
    pub users_today: i64,
    pub users_this_week: i64,
}

/// Listing count per status. Every status is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub active: i64,
    pub draft: i64,
    pub pending: i64,
    pub sold: i64,
    pub archived: i64,
}

impl StatusBreakdown {
    pub fn set(&mut self, status: ListingStatus, count: i64) {
        let slot = match status {
            ListingStatus::Active => &mut self.active,
            ListingStatus::Draft => &mut self.draft,
            ListingStatus::Pending => &mut self.pending,
            ListingStatus::Sold => &mut self.sold,
            ListingStatus::Archived => &mut self.archived,
        };
        *slot = count;
    }

    pub fn total(&self) -> i64 {
        self.active + self.draft + self.pending + self.sold + self.archived
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GrowthPair {
    pub current_month: i64,
    pub last_month: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Growth {
    pub listings: GrowthPair,
    pub users: GrowthPair,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedAnalytics {
    pub category_stats: Vec<CategoryStat>,
    pub top_sellers: Vec<SellerStat>,
    pub recent_activity: RecentActivity,
    pub performance_indicators: PerformanceIndicators,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_stats: Option<SubscriptionStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub category_id: Uuid,
    pub category_name: Option<String>,
    pub listing_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SellerStat {
    pub seller_id: Uuid,
    pub active_listings: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecentActivity {
    pub users: Vec<RecentUser>,
    pub listings: Vec<RecentListing>,
}

/// Display-safe projection of a user: nothing more sensitive than the email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for RecentUser {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            is_verified: value.is_verified,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentListing {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub price_minor: i32,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<ListingEntity> for RecentListing {
    fn from(value: ListingEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            status: value.status,
            price_minor: value.price_minor,
            seller_id: value.seller_id,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceIndicators {
    /// Verified users as a percentage of all users, two decimals.
    pub conversion_rate: f64,
    pub total_views: i64,
    pub active_users: i64,
    pub avg_listings_per_user: f64,
}

impl PerformanceIndicators {
    pub fn new(overview: &Overview, total_views: i64, active_users: i64) -> Self {
        Self {
            conversion_rate: rounded_ratio(overview.verified_users, overview.total_users, 100.0),
            total_views,
            active_users,
            avg_listings_per_user: rounded_ratio(overview.total_listings, overview.total_users, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscriptionStats {
    pub active_subscriptions: i64,
    pub monthly_revenue_minor: i64,
}

/// `numerator / denominator * scale` rounded to two decimals, 0 when the denominator is 0.
pub fn rounded_ratio(numerator: i64, denominator: i64, scale: f64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let value = numerator as f64 / denominator as f64 * scale;
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_are_zero_without_users() {
        let indicators = PerformanceIndicators::new(&Overview::default(), 0, 0);
        assert_eq!(indicators.conversion_rate, 0.0);
        assert_eq!(indicators.avg_listings_per_user, 0.0);
    }

    #[test]
    fn ratios_round_to_two_decimals() {
        let overview = Overview {
            total_listings: 10,
            active_listings: 4,
            total_users: 3,
            verified_users: 2,
        };
        let indicators = PerformanceIndicators::new(&overview, 120, 1);

        assert_eq!(indicators.conversion_rate, 66.67);
        assert_eq!(indicators.avg_listings_per_user, 3.33);
        assert_eq!(indicators.total_views, 120);
    }

    #[test]
    fn status_breakdown_totals_every_status() {
        let mut breakdown = StatusBreakdown::default();
        for (i, status) in ListingStatus::ALL.into_iter().enumerate() {
            breakdown.set(status, i as i64 + 1);
        }
        assert_eq!(breakdown.total(), 15);
        assert_eq!(breakdown.archived, 5);
    }

    #[test]
    fn empty_breakdown_still_serializes_all_statuses() {
        let value = serde_json::to_value(StatusBreakdown::default()).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 5);
        for status in ListingStatus::ALL {
            assert_eq!(value[status.to_string()], 0);
        }
    }
}
