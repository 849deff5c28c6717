use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::categories},
};
use domain::{entities::categories::CategoryEntity, repositories::categories::CategoryRepository};

pub struct CategoryPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CategoryPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CategoryRepository for CategoryPostgres {
    async fn list_categories(&self) -> Result<Vec<CategoryEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = categories::table
            .order(categories::name.asc())
            .select(CategoryEntity::as_select())
            .load::<CategoryEntity>(&mut conn)?;

        Ok(results)
    }
}
