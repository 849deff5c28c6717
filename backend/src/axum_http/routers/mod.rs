pub mod analytics;
pub mod invoices;
pub mod usage;

#[cfg(test)]
pub(crate) mod test_support;
