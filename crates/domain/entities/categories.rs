use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::db::postgres::schema::categories;

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Identifiable, Selectable, Queryable,
)]
#[diesel(table_name = categories)]
pub struct CategoryEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}
