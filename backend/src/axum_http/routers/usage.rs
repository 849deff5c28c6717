use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use crates::{
    domain::{
        clock::Clock,
        repositories::{
            plans::PlanRepository, query_gateway::QueryGateway,
            subscriptions::SubscriptionRepository,
        },
        value_objects::usage::UsageSummary,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            plans::PlanPostgres, query_gateway::QueryGatewayPostgres,
            subscriptions::SubscriptionPostgres,
        },
    },
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::{ApiResponse, AppError},
    usecases::{plan_resolver::PlanResolver, usage::UsageUseCase},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, clock: Arc<dyn Clock>) -> Router {
    let plan_resolver = PlanResolver::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
    );
    let usecase = UsageUseCase::new(
        Arc::new(QueryGatewayPostgres::new(Arc::clone(&db_pool))),
        plan_resolver,
        clock,
    );

    router(usecase)
}

pub fn router<G, P, S>(usecase: UsageUseCase<G, P, S>) -> Router
where
    G: QueryGateway + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(current_user_usage::<G, P, S>))
        .route("/:user_id", get(user_usage::<G, P, S>))
        .with_state(Arc::new(usecase))
}

pub async fn current_user_usage<G, P, S>(
    State(usecase): State<Arc<UsageUseCase<G, P, S>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Result<ApiResponse<UsageSummary>, AppError>
where
    G: QueryGateway + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    let summary = usecase.get_usage_summary(user_id).await?;
    Ok(ApiResponse::ok(summary))
}

pub async fn user_usage<G, P, S>(
    State(usecase): State<Arc<UsageUseCase<G, P, S>>>,
    auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<UsageSummary>, AppError>
where
    G: QueryGateway + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    auth.require_admin()?;

    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| AppError::BadRequest("Invalid user_id format".to_string()))?;

    let summary = usecase.get_usage_summary(user_id).await?;
    Ok(ApiResponse::ok(summary))
}
