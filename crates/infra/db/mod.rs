pub mod postgres;
pub mod repositories;
pub mod sql_builder;
