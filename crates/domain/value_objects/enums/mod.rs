pub mod invoice_statuses;
pub mod listing_statuses;
pub mod sort_order;
pub mod subscription_statuses;
