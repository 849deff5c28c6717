use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::{
    QueryableByName, RunQueryDsl,
    pg::Pg,
    query_builder::{BoxedSqlQuery, SqlQuery},
    sql_types::{BigInt, Bool, Text, Timestamptz},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        sql_builder::{self, SqlStatement},
    },
};
use domain::{
    entities::{listings::ListingEntity, users::UserEntity},
    repositories::query_gateway::QueryGateway,
    value_objects::query::{Entity, EntityQuery, Field, FilterValue, GroupCount},
};

#[derive(QueryableByName)]
struct TotalRow {
    #[diesel(sql_type = BigInt)]
    total: i64,
}

#[derive(QueryableByName)]
struct GroupRow {
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    group_key: Uuid,
    #[diesel(sql_type = BigInt)]
    total: i64,
}

pub struct QueryGatewayPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl QueryGatewayPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }

    fn prepare(statement: SqlStatement) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
        debug!(sql = %statement.sql, binds = statement.binds.len(), "query_gateway: executing");

        let mut query = diesel::sql_query(statement.sql).into_boxed::<Pg>();
        for value in statement.binds {
            query = match value {
                FilterValue::Text(value) => query.bind::<Text, _>(value),
                FilterValue::Uuid(value) => query.bind::<diesel::sql_types::Uuid, _>(value),
                FilterValue::Bool(value) => query.bind::<Bool, _>(value),
                FilterValue::Int(value) => query.bind::<BigInt, _>(value),
                FilterValue::Timestamp(value) => query.bind::<Timestamptz, _>(value),
            };
        }
        query
    }

    fn total(&self, statement: SqlStatement) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let row = Self::prepare(statement).get_result::<TotalRow>(&mut conn)?;
        Ok(row.total)
    }
}

#[async_trait]
impl QueryGateway for QueryGatewayPostgres {
    async fn count(&self, query: &EntityQuery) -> Result<i64> {
        let statement = sql_builder::count_statement(query)?;
        self.total(statement)
            .with_context(|| format!("count over {} failed", query.entity.table_name()))
    }

    async fn sum(&self, query: &EntityQuery, field: Field) -> Result<i64> {
        let statement = sql_builder::sum_statement(query, field)?;
        self.total(statement)
            .with_context(|| format!("sum over {} failed", query.entity.table_name()))
    }

    async fn group_by_top_n(
        &self,
        query: &EntityQuery,
        group_field: Field,
        n: i64,
    ) -> Result<Vec<GroupCount>> {
        let statement = sql_builder::group_by_statement(query, group_field, n)?;
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = Self::prepare(statement)
            .load::<GroupRow>(&mut conn)
            .with_context(|| format!("group by over {} failed", query.entity.table_name()))?;

        Ok(rows
            .into_iter()
            .map(|row| GroupCount {
                key: row.group_key,
                count: row.total,
            })
            .collect())
    }

    async fn latest_listings(&self, query: &EntityQuery) -> Result<Vec<ListingEntity>> {
        let statement = sql_builder::latest_statement(query, Entity::Listings)?;
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let listings = Self::prepare(statement)
            .load::<ListingEntity>(&mut conn)
            .context("latest listings query failed")?;

        Ok(listings)
    }

    async fn latest_users(&self, query: &EntityQuery) -> Result<Vec<UserEntity>> {
        let statement = sql_builder::latest_statement(query, Entity::Users)?;
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let users = Self::prepare(statement)
            .load::<UserEntity>(&mut conn)
            .context("latest users query failed")?;

        Ok(users)
    }
}
