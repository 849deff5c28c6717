//! Compiles an [`EntityQuery`] into parameterised Postgres SQL.
//!
//! Column names never come from user input: every field is resolved through
//! [`Entity::column`], and every value travels as a bind parameter.

use anyhow::{Result, anyhow, bail};

use crate::domain::value_objects::{
    enums::sort_order::SortOrder,
    query::{Entity, EntityQuery, Field, Filter, FilterValue},
};

pub const LISTING_COLUMNS: &str =
    "id, title, status, category_id, seller_id, price_minor, view_count, created_at";
pub const USER_COLUMNS: &str =
    "id, name, email, is_verified, last_login_at, profile_id, created_at";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub sql: String,
    pub binds: Vec<FilterValue>,
}

#[derive(Default)]
struct WhereClause {
    conditions: Vec<String>,
    binds: Vec<FilterValue>,
}

impl WhereClause {
    fn bind(&mut self, value: FilterValue) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }

    fn push(&mut self, entity: Entity, filter: &Filter) -> Result<()> {
        let condition = match filter {
            Filter::Eq(field, value) => {
                let column = column(entity, *field)?;
                format!("{column} = {}", self.bind(value.clone()))
            }
            Filter::In(field, values) => {
                let column = column(entity, *field)?;
                if values.is_empty() {
                    "FALSE".to_string()
                } else {
                    let placeholders = values
                        .iter()
                        .map(|value| self.bind(value.clone()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{column} IN ({placeholders})")
                }
            }
            Filter::Range(field, start, end) => {
                let column = column(entity, *field)?;
                let start = self.bind(FilterValue::Timestamp(*start));
                let end = self.bind(FilterValue::Timestamp(*end));
                format!("{column} >= {start} AND {column} < {end}")
            }
            Filter::Window(field, start, end) => {
                let column = column(entity, *field)?;
                let start = self.bind(FilterValue::Timestamp(*start));
                let end = self.bind(FilterValue::Timestamp(*end));
                format!("{column} BETWEEN {start} AND {end}")
            }
            Filter::Since(field, start) => {
                let column = column(entity, *field)?;
                format!("{column} >= {}", self.bind(FilterValue::Timestamp(*start)))
            }
            Filter::Before(field, end) => {
                let column = column(entity, *field)?;
                format!("{column} < {}", self.bind(FilterValue::Timestamp(*end)))
            }
            Filter::SubscriptionStatus(status) => {
                if entity != Entity::Invoices {
                    bail!("subscription status filter only applies to invoices");
                }
                let status = self.bind(FilterValue::Text(status.to_string()));
                format!("subscription_id IN (SELECT id FROM subscriptions WHERE status = {status})")
            }
        };
        self.conditions.push(condition);
        Ok(())
    }

    fn render(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

fn column(entity: Entity, field: Field) -> Result<&'static str> {
    entity
        .column(field)
        .ok_or_else(|| anyhow!("{field:?} is not a column of {}", entity.table_name()))
}

fn where_clause(query: &EntityQuery) -> Result<WhereClause> {
    let mut clause = WhereClause::default();
    for filter in &query.filters {
        clause.push(query.entity, filter)?;
    }
    Ok(clause)
}

fn limit_clause(limit: Option<i64>) -> Result<String> {
    match limit {
        None => Ok(String::new()),
        Some(n) if n >= 0 => Ok(format!(" LIMIT {n}")),
        Some(n) => bail!("limit must not be negative, got {n}"),
    }
}

pub fn count_statement(query: &EntityQuery) -> Result<SqlStatement> {
    let clause = where_clause(query)?;
    Ok(SqlStatement {
        sql: format!(
            "SELECT COUNT(*) AS total FROM {}{}",
            query.entity.table_name(),
            clause.render()
        ),
        binds: clause.binds,
    })
}

pub fn sum_statement(query: &EntityQuery, field: Field) -> Result<SqlStatement> {
    if !field.is_numeric() {
        bail!("{field:?} is not a numeric field");
    }
    let column = column(query.entity, field)?;
    let clause = where_clause(query)?;
    Ok(SqlStatement {
        sql: format!(
            "SELECT COALESCE(SUM({column}), 0)::BIGINT AS total FROM {}{}",
            query.entity.table_name(),
            clause.render()
        ),
        binds: clause.binds,
    })
}

pub fn group_by_statement(query: &EntityQuery, group_field: Field, n: i64) -> Result<SqlStatement> {
    if !group_field.is_reference() {
        bail!("{group_field:?} cannot be used as a group key");
    }
    let column = column(query.entity, group_field)?;
    let clause = where_clause(query)?;
    Ok(SqlStatement {
        sql: format!(
            "SELECT {column} AS group_key, COUNT(*) AS total FROM {}{} \
             GROUP BY {column} ORDER BY total DESC, group_key ASC{}",
            query.entity.table_name(),
            clause.render(),
            limit_clause(Some(n))?
        ),
        binds: clause.binds,
    })
}

/// Row listing for `expected`, newest first unless the query orders otherwise.
pub fn latest_statement(query: &EntityQuery, expected: Entity) -> Result<SqlStatement> {
    if query.entity != expected {
        bail!(
            "expected a query over {}, got {}",
            expected.table_name(),
            query.entity.table_name()
        );
    }
    let columns = match expected {
        Entity::Listings => LISTING_COLUMNS,
        Entity::Users => USER_COLUMNS,
        other => bail!("row listing is not supported for {}", other.table_name()),
    };
    let (order_field, order) = query.order_by.unwrap_or((Field::CreatedAt, SortOrder::Desc));
    let order_column = column(query.entity, order_field)?;
    let clause = where_clause(query)?;

    Ok(SqlStatement {
        sql: format!(
            "SELECT {columns} FROM {}{} ORDER BY {order_column} {}, id ASC{}",
            query.entity.table_name(),
            clause.render(),
            order.as_sql(),
            limit_clause(query.limit)?
        ),
        binds: clause.binds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::enums::{
        listing_statuses::ListingStatus, subscription_statuses::SubscriptionStatus,
    };
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[test]
    fn count_without_filters_has_no_where_clause() {
        let statement = count_statement(&EntityQuery::new(Entity::Users)).unwrap();
        assert_eq!(statement.sql, "SELECT COUNT(*) AS total FROM users");
        assert!(statement.binds.is_empty());
    }

    #[test]
    fn filters_are_numbered_in_order() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let query = EntityQuery::new(Entity::Listings)
            .eq(Field::Status, ListingStatus::Active)
            .filter(Filter::Range(Field::CreatedAt, start, end));

        let statement = count_statement(&query).unwrap();

        assert_eq!(
            statement.sql,
            "SELECT COUNT(*) AS total FROM listings WHERE status = $1 \
             AND created_at >= $2 AND created_at < $3"
        );
        assert_eq!(
            statement.binds,
            vec![
                FilterValue::Text("active".to_string()),
                FilterValue::Timestamp(start),
                FilterValue::Timestamp(end),
            ]
        );
    }

    #[test]
    fn in_filter_expands_placeholders_and_empty_set_matches_nothing() {
        let seller = Uuid::new_v4();
        let query = EntityQuery::new(Entity::Listings)
            .eq(Field::SellerId, seller)
            .filter(Filter::In(
                Field::Status,
                ListingStatus::QUOTA_COUNTED.into_iter().map(Into::into).collect(),
            ));
        let statement = count_statement(&query).unwrap();
        assert!(statement.sql.ends_with("WHERE seller_id = $1 AND status IN ($2, $3, $4)"));
        assert_eq!(statement.binds.len(), 4);

        let empty = EntityQuery::new(Entity::Listings).filter(Filter::In(Field::Status, vec![]));
        assert!(count_statement(&empty).unwrap().sql.ends_with("WHERE FALSE"));
    }

    #[test]
    fn group_by_orders_by_count_then_key_and_limits_in_sql() {
        let statement = group_by_statement(
            &EntityQuery::new(Entity::Listings),
            Field::CategoryId,
            10,
        )
        .unwrap();

        assert_eq!(
            statement.sql,
            "SELECT category_id AS group_key, COUNT(*) AS total FROM listings \
             GROUP BY category_id ORDER BY total DESC, group_key ASC LIMIT 10"
        );
    }

    #[test]
    fn sum_requires_numeric_field_of_the_entity() {
        let listings = EntityQuery::new(Entity::Listings);
        assert!(sum_statement(&listings, Field::Status).is_err());
        assert!(sum_statement(&listings, Field::TotalAmountMinor).is_err());

        let statement = sum_statement(&listings, Field::ViewCount).unwrap();
        assert_eq!(
            statement.sql,
            "SELECT COALESCE(SUM(view_count), 0)::BIGINT AS total FROM listings"
        );
    }

    #[test]
    fn foreign_fields_are_rejected() {
        let query = EntityQuery::new(Entity::Users).eq(Field::SellerId, Uuid::nil());
        let err = count_statement(&query).unwrap_err();
        assert!(err.to_string().contains("not a column of users"));
    }

    #[test]
    fn subscription_status_filter_is_invoice_only() {
        let invoices = EntityQuery::new(Entity::Invoices)
            .filter(Filter::SubscriptionStatus(SubscriptionStatus::Active));
        let statement = sum_statement(&invoices, Field::TotalAmountMinor).unwrap();
        assert!(statement.sql.contains(
            "subscription_id IN (SELECT id FROM subscriptions WHERE status = $1)"
        ));

        let listings = EntityQuery::new(Entity::Listings)
            .filter(Filter::SubscriptionStatus(SubscriptionStatus::Active));
        assert!(count_statement(&listings).is_err());
    }

    #[test]
    fn latest_defaults_to_newest_first_with_id_tiebreak() {
        let query = EntityQuery::new(Entity::Users).limit(5);
        let statement = latest_statement(&query, Entity::Users).unwrap();
        assert_eq!(
            statement.sql,
            format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id ASC LIMIT 5")
        );

        assert!(latest_statement(&query, Entity::Listings).is_err());
        assert!(latest_statement(&query.clone().limit(-1), Entity::Users).is_err());
    }
}
