use axum::{Router, extract::State, routing::get};
use crates::{
    domain::{
        clock::Clock, repositories::query_gateway::QueryGateway,
        value_objects::invoices::InvoiceSummary,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::query_gateway::QueryGatewayPostgres,
    },
};
use std::sync::Arc;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::{ApiResponse, AppError},
    usecases::invoices::InvoiceSummaryUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>, clock: Arc<dyn Clock>) -> Router {
    let usecase =
        InvoiceSummaryUseCase::new(Arc::new(QueryGatewayPostgres::new(db_pool)), clock);

    router(usecase)
}

pub fn router<G>(usecase: InvoiceSummaryUseCase<G>) -> Router
where
    G: QueryGateway + Send + Sync + 'static,
{
    Router::new()
        .route("/summary", get(invoice_summary::<G>))
        .with_state(Arc::new(usecase))
}

pub async fn invoice_summary<G>(
    State(usecase): State<Arc<InvoiceSummaryUseCase<G>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Result<ApiResponse<InvoiceSummary>, AppError>
where
    G: QueryGateway + Send + Sync + 'static,
{
    let summary = usecase.get_invoice_summary(user_id).await?;
    Ok(ApiResponse::ok(summary))
}
