use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use crates::{
    domain::{
        clock::Clock,
        repositories::{
            cache::Cache, categories::CategoryRepository, query_gateway::QueryGateway,
        },
        value_objects::analytics::AnalyticsSnapshot,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{categories::CategoryPostgres, query_gateway::QueryGatewayPostgres},
    },
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::{ApiResponse, AppError},
    config::config_model::Analytics as AnalyticsConfig,
    usecases::analytics::{AnalyticsSettings, DashboardAnalyticsUseCase},
};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub time_range: Option<String>,
    pub extended: Option<String>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: &AnalyticsConfig,
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
) -> Router {
    let usecase = DashboardAnalyticsUseCase::new(
        Arc::new(QueryGatewayPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CategoryPostgres::new(Arc::clone(&db_pool))),
        cache,
        clock,
        AnalyticsSettings::from(config),
    );

    router(usecase)
}

pub fn router<G, C>(usecase: DashboardAnalyticsUseCase<G, C>) -> Router
where
    G: QueryGateway + Send + Sync + 'static,
    C: CategoryRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/dashboard", get(dashboard::<G, C>))
        .with_state(Arc::new(usecase))
}

pub async fn dashboard<G, C>(
    State(usecase): State<Arc<DashboardAnalyticsUseCase<G, C>>>,
    auth: AuthUser,
    Query(query): Query<DashboardQuery>,
) -> Result<ApiResponse<AnalyticsSnapshot>, AppError>
where
    G: QueryGateway + Send + Sync + 'static,
    C: CategoryRepository + Send + Sync + 'static,
{
    auth.require_admin()?;

    let extended = parse_flag(query.extended.as_deref())?;
    let snapshot = usecase
        .get_dashboard_analytics(query.time_range.as_deref(), extended)
        .await?;

    Ok(ApiResponse::ok(snapshot))
}

/// `true`/`1`/`yes`/`on` enable, `false`/`0`/`no`/`off` or absence disable.
fn parse_flag(raw: Option<&str>) -> Result<bool, AppError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(AppError::BadRequest(format!(
            "extended must be a boolean, got `{other}`"
        ))),
    }
}
