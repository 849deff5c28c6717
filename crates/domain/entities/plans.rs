use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::{domain::value_objects::plans::PlanFeatures, infra::db::postgres::schema::plans};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i32,
    /// `-1` means unlimited, see [`crate::domain::value_objects::plans::UNLIMITED_LISTINGS`].
    pub max_listings: i32,
    pub max_images_per_listing: i32,
    pub features: PlanFeatures,
}

/// Raw row used for Diesel queries. Features stay as JSON and are parsed into PlanFeatures.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i32,
    pub max_listings: i32,
    pub max_images_per_listing: i32,
    pub features: serde_json::Value,
}

impl From<PlanRow> for PlanEntity {
    fn from(value: PlanRow) -> Self {
        let features = match serde_json::from_value::<PlanFeatures>(value.features) {
            Ok(features) => features,
            Err(err) => {
                warn!(
                    plan_id = %value.id,
                    error = %err,
                    "plans: undecodable features, treating as none"
                );
                PlanFeatures::default()
            }
        };

        Self {
            id: value.id,
            name: value.name,
            price_minor: value.price_minor,
            max_listings: value.max_listings,
            max_images_per_listing: value.max_images_per_listing,
            features,
        }
    }
}
