use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    pub user_id: Uuid,
    pub total_invoices: i64,
    pub paid_count: i64,
    pub pending_count: i64,
    /// Pending invoices whose due date has passed.
    pub overdue_count: i64,
    pub total_paid_minor: i64,
    pub outstanding_minor: i64,
}
