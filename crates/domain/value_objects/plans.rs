use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel stored in `plans.max_listings` for plans without a listing cap.
pub const UNLIMITED_LISTINGS: i32 = -1;

pub const FREEMIUM_PLAN_NAME: &str = "Freemium";
pub const FREEMIUM_MAX_LISTINGS: i32 = 5;
pub const FREEMIUM_MAX_IMAGES_PER_LISTING: i32 = 5;

/// Features attached to a plan, stored as a JSONB array of names.
///
/// Rows written before the array layout hold a `{"name": true}` object; both
/// decode to the names that are enabled.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(from = "StoredPlanFeatures", into = "Vec<String>")]
pub struct PlanFeatures {
    names: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredPlanFeatures {
    Names(Vec<String>),
    Flags(BTreeMap<String, bool>),
}

impl From<StoredPlanFeatures> for PlanFeatures {
    fn from(value: StoredPlanFeatures) -> Self {
        match value {
            StoredPlanFeatures::Names(names) => names.into_iter().collect(),
            StoredPlanFeatures::Flags(flags) => flags
                .into_iter()
                .filter(|(_, enabled)| *enabled)
                .map(|(name, _)| name)
                .collect(),
        }
    }
}

impl From<PlanFeatures> for Vec<String> {
    fn from(value: PlanFeatures) -> Self {
        value.names
    }
}

impl<S: Into<String>> FromIterator<S> for PlanFeatures {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names: Vec<String> = Vec::new();
        for name in iter {
            let name = name.into();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        Self { names }
    }
}

impl PlanFeatures {
    /// Enabled feature names in stored order, without duplicates.
    pub fn enabled(&self) -> Vec<String> {
        self.names.clone()
    }
}
