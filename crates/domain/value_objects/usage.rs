use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Serialized as the string `"unlimited"` or as a non-negative integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingsRemaining {
    Unlimited,
    Count(i64),
}

impl ListingsRemaining {
    pub fn allows_another(&self) -> bool {
        match self {
            ListingsRemaining::Unlimited => true,
            ListingsRemaining::Count(remaining) => *remaining > 0,
        }
    }
}

impl Serialize for ListingsRemaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ListingsRemaining::Unlimited => serializer.serialize_str("unlimited"),
            ListingsRemaining::Count(remaining) => serializer.serialize_i64(*remaining),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub user_id: Uuid,
    pub plan_name: String,
    /// `freemium` when no subscription applies, otherwise the subscription status.
    pub status: String,
    pub max_listings: i32,
    pub max_images_per_listing: i32,
    pub current_listings: i64,
    pub listings_remaining: ListingsRemaining,
    pub can_create_listing: bool,
    pub features: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub auto_renew: bool,
    pub renewal_due: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remaining_serializes_as_string_or_number() {
        assert_eq!(
            serde_json::to_value(ListingsRemaining::Unlimited).unwrap(),
            json!("unlimited")
        );
        assert_eq!(
            serde_json::to_value(ListingsRemaining::Count(2)).unwrap(),
            json!(2)
        );
    }

    #[test]
    fn zero_remaining_blocks_new_listings() {
        assert!(!ListingsRemaining::Count(0).allows_another());
        assert!(ListingsRemaining::Count(1).allows_another());
        assert!(ListingsRemaining::Unlimited.allows_another());
    }
}
