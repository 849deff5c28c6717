use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::users;

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Selectable, Queryable, QueryableByName)]
#[diesel(table_name = users)]
pub struct UserEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub profile_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
