pub mod categories;
pub mod plans;
pub mod query_gateway;
pub mod subscriptions;
