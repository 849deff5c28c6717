pub mod analytics;
pub mod errors;
pub mod extended_analytics;
pub mod invoices;
pub mod metrics;
pub mod plan_resolver;
pub mod usage;
