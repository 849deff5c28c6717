use crates::domain::{
    clock::Clock,
    repositories::query_gateway::QueryGateway,
    value_objects::{
        enums::invoice_statuses::InvoiceStatus,
        invoices::InvoiceSummary,
        query::{Entity, EntityQuery, Field, Filter},
    },
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::usecases::{
    errors::{AnalyticsError, UseCaseResult},
    usage::ensure_user_exists,
};

pub struct InvoiceSummaryUseCase<G>
where
    G: QueryGateway + Send + Sync + 'static,
{
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
}

impl<G> InvoiceSummaryUseCase<G>
where
    G: QueryGateway + Send + Sync + 'static,
{
    pub fn new(gateway: Arc<G>, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }

    pub async fn get_invoice_summary(&self, user_id: Uuid) -> UseCaseResult<InvoiceSummary> {
        let now = self.clock.now();
        ensure_user_exists(self.gateway.as_ref(), user_id).await?;

        let all = EntityQuery::new(Entity::Invoices).eq(Field::UserId, user_id);
        let paid = all.clone().eq(Field::Status, InvoiceStatus::Paid);
        let pending = all.clone().eq(Field::Status, InvoiceStatus::Pending);
        let overdue = pending.clone().filter(Filter::Before(Field::DueDate, now));

        let (
            total_invoices,
            paid_count,
            pending_count,
            overdue_count,
            total_paid_minor,
            outstanding_minor,
        ) = tokio::try_join!(
            self.gateway.count(&all),
            self.gateway.count(&paid),
            self.gateway.count(&pending),
            self.gateway.count(&overdue),
            self.gateway.sum(&paid, Field::TotalAmountMinor),
            self.gateway.sum(&pending, Field::TotalAmountMinor),
        )
        .map_err(|err| {
            error!(%user_id, db_error = ?err, "invoices: failed to summarise invoices");
            AnalyticsError::UpstreamQueryFailure(err)
        })?;

        info!(%user_id, total_invoices, overdue_count, "invoices: summary computed");

        Ok(InvoiceSummary {
            user_id,
            total_invoices,
            paid_count,
            pending_count,
            overdue_count,
            total_paid_minor,
            outstanding_minor,
        })
    }
}
