use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Active,
    Draft,
    Pending,
    Sold,
    Archived,
}

impl ListingStatus {
    pub const ALL: [ListingStatus; 5] = [
        ListingStatus::Active,
        ListingStatus::Draft,
        ListingStatus::Pending,
        ListingStatus::Sold,
        ListingStatus::Archived,
    ];

    /// Statuses that count against a seller's listing quota.
    pub const QUOTA_COUNTED: [ListingStatus; 3] = [
        ListingStatus::Active,
        ListingStatus::Draft,
        ListingStatus::Pending,
    ];
}

impl Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            ListingStatus::Active => "active",
            ListingStatus::Draft => "draft",
            ListingStatus::Pending => "pending",
            ListingStatus::Sold => "sold",
            ListingStatus::Archived => "archived",
        };
        write!(f, "{}", status)
    }
}
