pub mod analytics;
pub mod enums;
pub mod invoices;
pub mod plans;
pub mod query;
pub mod time_window;
pub mod usage;
